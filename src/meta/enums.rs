use std::sync::Arc;

use crate::{
    codemodel::EnumKind,
    meta::{MetaClassRc, MetaClassRef, Visibility},
    typesystem::TypeEntryRc,
};

/// A reference-counted pointer to a [`MetaEnum`]
pub type MetaEnumRc = Arc<MetaEnum>;

/// One enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEnumValue {
    /// Enumerator name
    pub name: String,
    /// Evaluated value
    pub value: i64,
    /// Initializer expression as written, empty when implicit
    pub string_value: String,
}

/// An enum with its enumerators in declaration order.
#[derive(Debug, Clone)]
pub struct MetaEnum {
    type_entry: TypeEntryRc,
    /// Enumerators
    pub values: Vec<MetaEnumValue>,
    /// Visibility
    pub visibility: Visibility,
    /// C enum, anonymous enum or `enum class`
    pub kind: EnumKind,
    /// Underlying type is signed
    pub signed: bool,
    /// Class or namespace declaring the enum
    pub enclosing_class: Option<MetaClassRef>,
}

impl MetaEnum {
    /// Create an enum for `type_entry`.
    #[must_use]
    pub fn new(type_entry: TypeEntryRc, kind: EnumKind) -> Self {
        MetaEnum {
            type_entry,
            values: Vec::new(),
            visibility: Visibility::Public,
            kind,
            signed: true,
            enclosing_class: None,
        }
    }

    /// The enum entry.
    #[must_use]
    pub fn type_entry(&self) -> &TypeEntryRc {
        &self.type_entry
    }

    /// Unqualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.type_entry.local_name()
    }

    /// Qualified name.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        self.type_entry.name()
    }

    /// Returns true for enums without a name.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.kind == EnumKind::AnonymousEnum
    }

    /// The declaring class.
    #[must_use]
    pub fn enclosing_class(&self) -> Option<MetaClassRc> {
        self.enclosing_class.as_ref().and_then(MetaClassRef::upgrade)
    }

    /// Enumerator named `name`.
    #[must_use]
    pub fn find_value(&self, name: &str) -> Option<&MetaEnumValue> {
        self.values.iter().find(|value| value.name == name)
    }

    /// First zero-valued enumerator.
    #[must_use]
    pub fn null_value(&self) -> Option<&MetaEnumValue> {
        self.values.iter().find(|value| value.value == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesystem::TypeEntry;

    #[test]
    fn test_lookup() {
        let mut item = MetaEnum::new(
            Arc::new(TypeEntry::enumeration("Qt::AlignmentFlag")),
            EnumKind::CEnum,
        );
        for (name, value) in [("AlignLeft", 1), ("AlignNone", 0), ("AlignRight", 2)] {
            item.values.push(MetaEnumValue {
                name: name.to_string(),
                value,
                string_value: String::new(),
            });
        }
        assert_eq!(item.name(), "AlignmentFlag");
        assert_eq!(item.null_value().map(|v| v.name.as_str()), Some("AlignNone"));
        assert_eq!(item.find_value("AlignRight").map(|v| v.value), Some(2));
        assert!(!item.is_anonymous());
    }
}
