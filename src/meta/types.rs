use std::fmt;

use strum::Display;

use crate::{
    codemodel::ReferenceType,
    typesystem::{TypeEntryKind, TypeEntryRc},
    Error::InvalidInstantiation,
    Result,
};

/// How a resolved type is used, decided once all template arguments are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum UsagePattern {
    /// Not yet decided
    #[default]
    Invalid,
    /// Primitive by value or const reference
    Primitive,
    /// Flags by value
    Flags,
    /// Enum by value
    Enum,
    /// Value class by value or reference
    Value,
    /// Object class
    Object,
    /// `QObject` subclass
    QObject,
    /// Value class by pointer
    ValuePointer,
    /// Pointer to anything the target language has no wrapper for
    NativePointer,
    /// Pointer argument modified to be an array
    NativePointerAsArray,
    /// Container template
    Container,
    /// Smart pointer template
    SmartPointer,
    /// `...`
    Varargs,
    /// C array
    Array,
}

/// A fully resolved type: a [`TypeEntry`](crate::typesystem::TypeEntry) plus the qualifiers and
/// template arguments of one use site.
///
/// Two `MetaType` values compare equal when they name the same entry (kind and qualified name)
/// with the same qualifiers and equal instantiations.
#[derive(Debug, Clone)]
pub struct MetaType {
    type_entry: TypeEntryRc,
    /// `const`
    pub is_const: bool,
    /// `volatile`
    pub is_volatile: bool,
    /// Number of `*`
    pub indirections: usize,
    /// Reference qualifier
    pub reference: ReferenceType,
    instantiations: Vec<MetaType>,
    array_element: Option<Box<MetaType>>,
    array_count: Option<i64>,
    usage_pattern: UsagePattern,
    original_description: String,
    original_template_type: Option<Box<MetaType>>,
}

impl MetaType {
    /// A plain use of `type_entry`.
    #[must_use]
    pub fn new(type_entry: TypeEntryRc) -> Self {
        MetaType {
            type_entry,
            is_const: false,
            is_volatile: false,
            indirections: 0,
            reference: ReferenceType::NoReference,
            instantiations: Vec::new(),
            array_element: None,
            array_count: None,
            usage_pattern: UsagePattern::Invalid,
            original_description: String::new(),
            original_template_type: None,
        }
    }

    /// An array of `element` with an optional element count.
    #[must_use]
    pub fn array_of(array_entry: TypeEntryRc, element: MetaType, count: Option<i64>) -> Self {
        let mut result = MetaType::new(array_entry);
        result.array_element = Some(Box::new(element));
        result.array_count = count;
        result
    }

    /// The resolved entry.
    #[must_use]
    pub fn type_entry(&self) -> &TypeEntryRc {
        &self.type_entry
    }

    /// Swap the entry, keeping the qualifiers. Used for template parameter substitution.
    pub fn set_type_entry(&mut self, entry: TypeEntryRc) {
        self.type_entry = entry;
    }

    /// Qualified name of the entry.
    #[must_use]
    pub fn name(&self) -> &str {
        self.type_entry.name()
    }

    /// Template arguments.
    #[must_use]
    pub fn instantiations(&self) -> &[MetaType] {
        &self.instantiations
    }

    /// Mutable template arguments.
    pub fn instantiations_mut(&mut self) -> &mut Vec<MetaType> {
        &mut self.instantiations
    }

    /// Append a template argument.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidInstantiation`] when the entry kind cannot be
    /// instantiated.
    pub fn add_instantiation(&mut self, instantiation: MetaType) -> Result<()> {
        if !self.type_entry.kind().accepts_instantiations() {
            return Err(InvalidInstantiation(self.type_entry.name().to_string()));
        }
        self.instantiations.push(instantiation);
        Ok(())
    }

    /// Drop all template arguments.
    pub fn clear_instantiations(&mut self) {
        self.instantiations.clear();
    }

    /// Array element type, for arrays.
    #[must_use]
    pub fn array_element(&self) -> Option<&MetaType> {
        self.array_element.as_deref()
    }

    /// Number of array elements when known.
    #[must_use]
    pub fn array_count(&self) -> Option<i64> {
        self.array_count
    }

    /// Returns true for C arrays.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.array_element.is_some()
    }

    /// How the type is used.
    #[must_use]
    pub fn usage_pattern(&self) -> UsagePattern {
        self.usage_pattern
    }

    /// The type as written in the source.
    #[must_use]
    pub fn original_description(&self) -> &str {
        &self.original_description
    }

    /// Record the type as written in the source.
    pub fn set_original_description(&mut self, description: &str) {
        self.original_description = description.to_string();
    }

    /// The template parameter type this type was substituted from.
    #[must_use]
    pub fn original_template_type(&self) -> Option<&MetaType> {
        self.original_template_type.as_deref()
    }

    /// Record the template parameter type this type was substituted from.
    pub fn set_original_template_type(&mut self, original: MetaType) {
        self.original_template_type = Some(Box::new(original));
    }

    /// Returns true for a non-pointer, non-reference `void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.type_entry.is_void() && self.indirections == 0
    }

    /// Returns true for value classes used by value.
    #[must_use]
    pub fn is_value(&self) -> bool {
        self.usage_pattern == UsagePattern::Value
    }

    /// Returns true for containers.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.usage_pattern == UsagePattern::Container
    }

    /// Returns true for `const T&`.
    #[must_use]
    pub fn is_const_reference(&self) -> bool {
        self.is_const && self.reference == ReferenceType::LValueReference
    }

    /// Classify the use. Must run after the instantiations are resolved.
    pub fn decide_usage_pattern(&mut self) {
        let entry = &self.type_entry;
        let by_value = self.indirections == 0;
        self.usage_pattern = if self.array_element.is_some() {
            UsagePattern::Array
        } else {
            match entry.kind() {
                TypeEntryKind::Varargs => UsagePattern::Varargs,
                TypeEntryKind::Primitive if by_value => UsagePattern::Primitive,
                TypeEntryKind::Void if !by_value => UsagePattern::NativePointer,
                TypeEntryKind::Void => UsagePattern::Primitive,
                TypeEntryKind::Flags if by_value => UsagePattern::Flags,
                TypeEntryKind::Enum | TypeEntryKind::EnumValue if by_value => UsagePattern::Enum,
                TypeEntryKind::Container if by_value => UsagePattern::Container,
                TypeEntryKind::SmartPointer if by_value => UsagePattern::SmartPointer,
                TypeEntryKind::Object | TypeEntryKind::Interface if self.indirections <= 1 => {
                    if entry.complex().is_some_and(|data| data.is_qobject()) {
                        UsagePattern::QObject
                    } else {
                        UsagePattern::Object
                    }
                }
                TypeEntryKind::Value if self.indirections == 1 => UsagePattern::ValuePointer,
                TypeEntryKind::Value
                | TypeEntryKind::TemplateArgument
                | TypeEntryKind::Custom
                | TypeEntryKind::Typedef
                    if by_value =>
                {
                    UsagePattern::Value
                }
                _ => UsagePattern::NativePointer,
            }
        };
    }

    /// Turn a `T*` into an array of `T` with unknown size.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if the type is not a pointer.
    pub fn apply_array_modification(&mut self) -> Result<()> {
        if self.indirections == 0 {
            return Err(crate::Error::TypeError(format!(
                "Cannot apply array modification to non-pointer type '{}'",
                self.minimal_signature()
            )));
        }
        let mut element = self.clone();
        element.indirections -= 1;
        element.reference = ReferenceType::NoReference;
        element.decide_usage_pattern();
        self.array_element = Some(Box::new(element));
        self.array_count = None;
        self.usage_pattern = UsagePattern::NativePointerAsArray;
        Ok(())
    }

    /// The signature spelling used for matching modifications, e.g. `const QList<int>&`.
    #[must_use]
    pub fn minimal_signature(&self) -> String {
        let mut result = String::new();
        if self.is_const {
            result.push_str("const ");
        }
        if self.is_volatile {
            result.push_str("volatile ");
        }

        if let (Some(element), false) = (&self.array_element, self.usage_pattern == UsagePattern::NativePointerAsArray) {
            result.push_str(&element.minimal_signature());
            match self.array_count {
                Some(count) => result.push_str(&format!("[{count}]")),
                None => result.push_str("[]"),
            }
            return result;
        }

        result.push_str(self.type_entry.name());
        if !self.instantiations.is_empty() {
            result.push('<');
            let arguments: Vec<String> = self
                .instantiations
                .iter()
                .map(MetaType::minimal_signature)
                .collect();
            result.push_str(&arguments.join(","));
            result.push('>');
        }
        for _ in 0..self.indirections {
            result.push('*');
        }
        match self.reference {
            ReferenceType::NoReference => {}
            ReferenceType::LValueReference => result.push('&'),
            ReferenceType::RValueReference => result.push_str("&&"),
        }
        result
    }
}

impl PartialEq for MetaType {
    fn eq(&self, other: &Self) -> bool {
        self.type_entry.kind() == other.type_entry.kind()
            && self.type_entry.name() == other.type_entry.name()
            && self.is_const == other.is_const
            && self.is_volatile == other.is_volatile
            && self.indirections == other.indirections
            && self.reference == other.reference
            && self.instantiations == other.instantiations
            && self.array_element == other.array_element
            && self.array_count == other.array_count
    }
}

impl fmt::Display for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.minimal_signature())
    }
}
