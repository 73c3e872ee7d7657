//! Type entries of the rule database.
//!
//! A [`TypeEntry`] is created once with an immutable kind and is then shared as an `Arc` by the
//! database, by every [`crate::meta::MetaType`] that resolved to it, and by the meta classes built
//! from it. The few attributes the builder fills in later are interior-mutable:
//!
//! - the code generation policy (an atomic, enums found to be missing are switched off),
//! - the include (`OnceLock`, the first header wins),
//! - the referenced primitive of a typedef'd primitive, the null value of an enum and the base
//!   container type of a class (`OnceLock`),
//! - function modifications of complex entries (`boxcar::Vec`, template inheritance appends
//!   the modifications of the template class under the subclass signatures).

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, OnceLock,
    },
};

use crate::typesystem::{
    AddedFunction, AddedFunctionRc, AllowThread, CodeGeneration, DocModification,
    ExceptionHandling, FieldModification, FunctionModification, PropertyDeclaration,
    TypeEntryKind,
};
use crate::codemodel::normalize_signature;

/// A reference-counted pointer to a [`TypeEntry`]
pub type TypeEntryRc = Arc<TypeEntry>;

/// Data carried by class-like entries.
#[derive(Debug, Default)]
pub struct ComplexData {
    function_modifications: boxcar::Vec<FunctionModification>,
    field_modifications: Vec<FieldModification>,
    added_functions: Vec<AddedFunctionRc>,
    property_declarations: Vec<PropertyDeclaration>,
    doc_modifications: Vec<DocModification>,
    is_qobject: bool,
    stream: bool,
    polymorphic_id_value: Option<String>,
    default_superclass: Option<String>,
    exception_handling: ExceptionHandling,
    allow_thread: AllowThread,
    base_container_type: OnceLock<TypeEntryRc>,
}

impl ComplexData {
    /// Function modifications in declaration order, including inherited template ones.
    pub fn function_modifications(&self) -> impl Iterator<Item = &FunctionModification> {
        self.function_modifications.iter().map(|(_, m)| m)
    }

    /// Modifications whose signature matches `signature`.
    #[must_use]
    pub fn modifications_for(&self, signature: &str) -> Vec<FunctionModification> {
        self.function_modifications()
            .filter(|m| m.matches(signature))
            .cloned()
            .collect()
    }

    /// Append a modification after registration.
    pub fn add_function_modification(&self, modification: FunctionModification) {
        self.function_modifications.push(modification);
    }

    /// Field modifications.
    #[must_use]
    pub fn field_modifications(&self) -> &[FieldModification] {
        &self.field_modifications
    }

    /// Functions added to this class by the rule database.
    #[must_use]
    pub fn added_functions(&self) -> &[AddedFunctionRc] {
        &self.added_functions
    }

    /// Property declarations.
    #[must_use]
    pub fn property_declarations(&self) -> &[PropertyDeclaration] {
        &self.property_declarations
    }

    /// Documentation edits.
    #[must_use]
    pub fn doc_modifications(&self) -> &[DocModification] {
        &self.doc_modifications
    }

    /// Class is a `QObject`.
    #[must_use]
    pub fn is_qobject(&self) -> bool {
        self.is_qobject
    }

    /// Class has stream operators exposed.
    #[must_use]
    pub fn stream(&self) -> bool {
        self.stream
    }

    /// Expression identifying the dynamic type in polymorphic hierarchies.
    #[must_use]
    pub fn polymorphic_id_value(&self) -> Option<&str> {
        self.polymorphic_id_value.as_deref()
    }

    /// Superclass to use when the class has no base.
    #[must_use]
    pub fn default_superclass(&self) -> Option<&str> {
        self.default_superclass.as_deref()
    }

    /// Class level exception handling default.
    #[must_use]
    pub fn exception_handling(&self) -> ExceptionHandling {
        self.exception_handling
    }

    /// Class level interpreter lock default.
    #[must_use]
    pub fn allow_thread(&self) -> AllowThread {
        self.allow_thread
    }

    /// Container entry the class derives from, when the base is a container template.
    #[must_use]
    pub fn base_container_type(&self) -> Option<TypeEntryRc> {
        self.base_container_type.get().cloned()
    }

    /// Record the base container type. The first call wins.
    pub fn set_base_container_type(&self, entry: TypeEntryRc) {
        let _ = self.base_container_type.set(entry);
    }
}

#[derive(Debug)]
enum EntryDetail {
    Simple,
    Primitive {
        referenced: OnceLock<TypeEntryRc>,
    },
    Enum {
        qualifier: String,
        null_value: OnceLock<String>,
    },
    EnumValue {
        value: String,
        enum_entry: Option<TypeEntryRc>,
    },
    Flags {
        original_name: String,
        enum_entry: Option<TypeEntryRc>,
    },
    TemplateArgument {
        ordinal: usize,
    },
    Array {
        element: TypeEntryRc,
    },
    Function {
        signatures: Vec<String>,
    },
    Complex(Box<ComplexData>),
    Typedef {
        source_type: String,
        target: TypeEntryRc,
    },
}

/// One named type of the rule database.
///
/// # Examples
///
/// ```rust
/// use cppmeta::typesystem::{CodeGeneration, FunctionModification, TypeEntry, TypeEntryKind};
///
/// let entry = TypeEntry::value("Gui::Point")
///     .with_function_modification(FunctionModification::new("x()const").rename("getX"));
/// assert_eq!(entry.kind(), TypeEntryKind::Value);
/// assert_eq!(entry.name(), "Gui::Point");
/// assert_eq!(entry.local_name(), "Point");
/// assert!(entry.generate_code());
///
/// entry.set_code_generation(CodeGeneration::NOTHING);
/// assert!(!entry.generate_code());
/// ```
#[derive(Debug)]
pub struct TypeEntry {
    name: String,
    kind: TypeEntryKind,
    code_generation: AtomicU32,
    include: OnceLock<String>,
    detail: EntryDetail,
}

impl TypeEntry {
    fn with_detail(name: &str, kind: TypeEntryKind, detail: EntryDetail) -> Self {
        TypeEntry {
            name: name.to_string(),
            kind,
            code_generation: AtomicU32::new(CodeGeneration::ALL.bits()),
            include: OnceLock::new(),
            detail,
        }
    }

    fn complex_entry(name: &str, kind: TypeEntryKind) -> Self {
        TypeEntry::with_detail(name, kind, EntryDetail::Complex(Box::default()))
    }

    /// A primitive entry.
    #[must_use]
    pub fn primitive(name: &str) -> Self {
        TypeEntry::with_detail(
            name,
            TypeEntryKind::Primitive,
            EntryDetail::Primitive {
                referenced: OnceLock::new(),
            },
        )
    }

    /// The `void` entry.
    #[must_use]
    pub fn void() -> Self {
        TypeEntry::with_detail("void", TypeEntryKind::Void, EntryDetail::Simple)
    }

    /// The `...` entry.
    #[must_use]
    pub fn varargs() -> Self {
        TypeEntry::with_detail("...", TypeEntryKind::Varargs, EntryDetail::Simple)
    }

    /// A custom entry handled entirely by the generator.
    #[must_use]
    pub fn custom(name: &str) -> Self {
        TypeEntry::with_detail(name, TypeEntryKind::Custom, EntryDetail::Simple)
    }

    /// An enum entry. `name` is qualified; the qualifier is everything before the last `::`.
    #[must_use]
    pub fn enumeration(name: &str) -> Self {
        let qualifier = name.rsplit_once("::").map_or("", |(scope, _)| scope);
        TypeEntry::with_detail(
            name,
            TypeEntryKind::Enum,
            EntryDetail::Enum {
                qualifier: qualifier.to_string(),
                null_value: OnceLock::new(),
            },
        )
    }

    /// An enumerator entry.
    #[must_use]
    pub fn enum_value(name: &str, value: &str, enum_entry: Option<TypeEntryRc>) -> Self {
        TypeEntry::with_detail(
            name,
            TypeEntryKind::EnumValue,
            EntryDetail::EnumValue {
                value: value.to_string(),
                enum_entry,
            },
        )
    }

    /// A flags entry, `QFlags<Gui::Alignment>` with its alias `Gui::Alignments`.
    #[must_use]
    pub fn flags(name: &str, original_name: &str, enum_entry: Option<TypeEntryRc>) -> Self {
        TypeEntry::with_detail(
            name,
            TypeEntryKind::Flags,
            EntryDetail::Flags {
                original_name: original_name.to_string(),
                enum_entry,
            },
        )
    }

    /// A placeholder for template parameter number `ordinal`.
    #[must_use]
    pub fn template_argument(name: &str, ordinal: usize) -> Self {
        TypeEntry::with_detail(
            name,
            TypeEntryKind::TemplateArgument,
            EntryDetail::TemplateArgument { ordinal },
        )
    }

    /// An array of `element`.
    #[must_use]
    pub fn array(element: TypeEntryRc) -> Self {
        let name = format!("{}[]", element.name());
        TypeEntry::with_detail(&name, TypeEntryKind::Array, EntryDetail::Array { element })
    }

    /// A global function entry accepting the given signatures.
    #[must_use]
    pub fn function(name: &str, signatures: &[&str]) -> Self {
        TypeEntry::with_detail(
            name,
            TypeEntryKind::Function,
            EntryDetail::Function {
                signatures: signatures.iter().map(|s| normalize_signature(s)).collect(),
            },
        )
    }

    /// A value class entry.
    #[must_use]
    pub fn value(name: &str) -> Self {
        TypeEntry::complex_entry(name, TypeEntryKind::Value)
    }

    /// An object class entry.
    #[must_use]
    pub fn object(name: &str) -> Self {
        TypeEntry::complex_entry(name, TypeEntryKind::Object)
    }

    /// An interface class entry.
    #[must_use]
    pub fn interface(name: &str) -> Self {
        TypeEntry::complex_entry(name, TypeEntryKind::Interface)
    }

    /// A namespace entry.
    #[must_use]
    pub fn namespace(name: &str) -> Self {
        TypeEntry::complex_entry(name, TypeEntryKind::Namespace)
    }

    /// A container template entry.
    #[must_use]
    pub fn container(name: &str) -> Self {
        TypeEntry::complex_entry(name, TypeEntryKind::Container)
    }

    /// A smart pointer template entry.
    #[must_use]
    pub fn smart_pointer(name: &str) -> Self {
        TypeEntry::complex_entry(name, TypeEntryKind::SmartPointer)
    }

    /// A typedef entry aliasing `source_type`; `target` is the class entry created for it.
    #[must_use]
    pub fn typedef(name: &str, source_type: &str, target: TypeEntryRc) -> Self {
        TypeEntry::with_detail(
            name,
            TypeEntryKind::Typedef,
            EntryDetail::Typedef {
                source_type: source_type.to_string(),
                target,
            },
        )
    }

    fn complex_mut(&mut self) -> Option<&mut ComplexData> {
        match &mut self.detail {
            EntryDetail::Complex(data) => Some(data),
            _ => None,
        }
    }

    /// Append a function modification. Ignored for non-class entries.
    #[must_use]
    pub fn with_function_modification(mut self, modification: FunctionModification) -> Self {
        if let Some(data) = self.complex_mut() {
            data.function_modifications.push(modification);
        }
        self
    }

    /// Append a field modification. Ignored for non-class entries.
    #[must_use]
    pub fn with_field_modification(mut self, modification: FieldModification) -> Self {
        if let Some(data) = self.complex_mut() {
            data.field_modifications.push(modification);
        }
        self
    }

    /// Append an added function. Ignored for non-class entries.
    #[must_use]
    pub fn with_added_function(mut self, function: AddedFunction) -> Self {
        if let Some(data) = self.complex_mut() {
            data.added_functions.push(Arc::new(function));
        }
        self
    }

    /// Append a property declaration. Ignored for non-class entries.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDeclaration) -> Self {
        if let Some(data) = self.complex_mut() {
            data.property_declarations.push(property);
        }
        self
    }

    /// Append a documentation edit. Ignored for non-class entries.
    #[must_use]
    pub fn with_doc_modification(mut self, modification: DocModification) -> Self {
        if let Some(data) = self.complex_mut() {
            data.doc_modifications.push(modification);
        }
        self
    }

    /// Mark the class as a `QObject`.
    #[must_use]
    pub fn qobject(mut self) -> Self {
        if let Some(data) = self.complex_mut() {
            data.is_qobject = true;
        }
        self
    }

    /// Expose stream operators of the class.
    #[must_use]
    pub fn with_stream(mut self) -> Self {
        if let Some(data) = self.complex_mut() {
            data.stream = true;
        }
        self
    }

    /// Set the polymorphic id expression.
    #[must_use]
    pub fn with_polymorphic_id(mut self, expression: &str) -> Self {
        if let Some(data) = self.complex_mut() {
            data.polymorphic_id_value = Some(expression.to_string());
        }
        self
    }

    /// Set the default superclass.
    #[must_use]
    pub fn with_default_superclass(mut self, name: &str) -> Self {
        if let Some(data) = self.complex_mut() {
            data.default_superclass = Some(name.to_string());
        }
        self
    }

    /// Set class level exception handling and interpreter lock defaults.
    #[must_use]
    pub fn with_thread_policies(
        mut self,
        exception_handling: ExceptionHandling,
        allow_thread: AllowThread,
    ) -> Self {
        if let Some(data) = self.complex_mut() {
            data.exception_handling = exception_handling;
            data.allow_thread = allow_thread;
        }
        self
    }

    /// Set the code generation policy at construction.
    #[must_use]
    pub fn with_code_generation(self, policy: CodeGeneration) -> Self {
        self.set_code_generation(policy);
        self
    }

    /// The fully qualified C++ name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The last segment of the qualified name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// The kind; never changes.
    #[must_use]
    pub fn kind(&self) -> TypeEntryKind {
        self.kind
    }

    /// The code generation policy.
    #[must_use]
    pub fn code_generation(&self) -> CodeGeneration {
        CodeGeneration::from_bits_retain(self.code_generation.load(Ordering::Acquire))
    }

    /// Change the code generation policy.
    pub fn set_code_generation(&self, policy: CodeGeneration) {
        self.code_generation.store(policy.bits(), Ordering::Release);
    }

    /// Returns true unless generation is disabled or only for subclasses.
    #[must_use]
    pub fn generate_code(&self) -> bool {
        self.code_generation().generate_code()
    }

    /// Returns true if target language wrappers are generated.
    #[must_use]
    pub fn generates_target_lang(&self) -> bool {
        self.code_generation().contains(CodeGeneration::TARGET_LANG)
    }

    /// The header to include for this type.
    #[must_use]
    pub fn include(&self) -> Option<&str> {
        self.include.get().map(String::as_str)
    }

    /// Set the header to include. The first call wins.
    pub fn set_include(&self, include: &str) {
        let _ = self.include.set(include.to_string());
    }

    /// Returns true for class-like entries.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        matches!(self.detail, EntryDetail::Complex(_))
    }

    /// Class data, for class-like entries.
    #[must_use]
    pub fn complex(&self) -> Option<&ComplexData> {
        match &self.detail {
            EntryDetail::Complex(data) => Some(data),
            _ => None,
        }
    }

    /// Returns true for `void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.kind == TypeEntryKind::Void
    }

    /// Returns true for primitives.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.kind == TypeEntryKind::Primitive
    }

    /// Returns true for enums.
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.kind == TypeEntryKind::Enum
    }

    /// Returns true for flags.
    #[must_use]
    pub fn is_flags(&self) -> bool {
        self.kind == TypeEntryKind::Flags
    }

    /// Returns true for containers.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.kind == TypeEntryKind::Container
    }

    /// Returns true for smart pointers.
    #[must_use]
    pub fn is_smart_pointer(&self) -> bool {
        self.kind == TypeEntryKind::SmartPointer
    }

    /// Returns true for namespaces.
    #[must_use]
    pub fn is_namespace(&self) -> bool {
        self.kind == TypeEntryKind::Namespace
    }

    /// Returns true for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeEntryKind::Interface
    }

    /// Returns true for value classes.
    #[must_use]
    pub fn is_value(&self) -> bool {
        self.kind == TypeEntryKind::Value
    }

    /// Returns true for object classes.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.kind == TypeEntryKind::Object
    }

    /// Returns true for template parameter placeholders.
    #[must_use]
    pub fn is_template_argument(&self) -> bool {
        self.kind == TypeEntryKind::TemplateArgument
    }

    /// Returns true for the `...` entry.
    #[must_use]
    pub fn is_varargs(&self) -> bool {
        self.kind == TypeEntryKind::Varargs
    }

    /// Primitive this typedef'd primitive refers to.
    #[must_use]
    pub fn referenced_primitive(&self) -> Option<TypeEntryRc> {
        match &self.detail {
            EntryDetail::Primitive { referenced } => referenced.get().cloned(),
            _ => None,
        }
    }

    /// Link a typedef'd primitive to the primitive it aliases. The first call wins.
    pub fn set_referenced_primitive(&self, entry: TypeEntryRc) {
        if let EntryDetail::Primitive { referenced } = &self.detail {
            let _ = referenced.set(entry);
        }
    }

    /// Scope of an enum entry.
    #[must_use]
    pub fn enum_qualifier(&self) -> Option<&str> {
        match &self.detail {
            EntryDetail::Enum { qualifier, .. } => Some(qualifier),
            _ => None,
        }
    }

    /// Name of the zero valued enumerator.
    #[must_use]
    pub fn null_value(&self) -> Option<&str> {
        match &self.detail {
            EntryDetail::Enum { null_value, .. } => null_value.get().map(String::as_str),
            _ => None,
        }
    }

    /// Record the zero valued enumerator. The first call wins.
    pub fn set_null_value(&self, name: &str) {
        if let EntryDetail::Enum { null_value, .. } = &self.detail {
            let _ = null_value.set(name.to_string());
        }
    }

    /// Literal value of an enumerator entry.
    #[must_use]
    pub fn enum_value_text(&self) -> Option<&str> {
        match &self.detail {
            EntryDetail::EnumValue { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Enum an enumerator or flags entry belongs to.
    #[must_use]
    pub fn enum_entry(&self) -> Option<TypeEntryRc> {
        match &self.detail {
            EntryDetail::EnumValue { enum_entry, .. } | EntryDetail::Flags { enum_entry, .. } => {
                enum_entry.clone()
            }
            _ => None,
        }
    }

    /// Alias name of a flags entry.
    #[must_use]
    pub fn flags_original_name(&self) -> Option<&str> {
        match &self.detail {
            EntryDetail::Flags { original_name, .. } => Some(original_name),
            _ => None,
        }
    }

    /// Position of a template parameter placeholder.
    #[must_use]
    pub fn ordinal(&self) -> Option<usize> {
        match &self.detail {
            EntryDetail::TemplateArgument { ordinal } => Some(*ordinal),
            _ => None,
        }
    }

    /// Element of an array entry.
    #[must_use]
    pub fn array_element(&self) -> Option<TypeEntryRc> {
        match &self.detail {
            EntryDetail::Array { element } => Some(element.clone()),
            _ => None,
        }
    }

    /// Accepted signatures of a function entry.
    #[must_use]
    pub fn signatures(&self) -> &[String] {
        match &self.detail {
            EntryDetail::Function { signatures } => signatures,
            _ => &[],
        }
    }

    /// Returns true if a function entry accepts `signature`.
    #[must_use]
    pub fn has_signature(&self, signature: &str) -> bool {
        let signature = normalize_signature(signature);
        self.signatures().iter().any(|s| *s == signature)
    }

    /// Aliased type of a typedef entry.
    #[must_use]
    pub fn typedef_source(&self) -> Option<&str> {
        match &self.detail {
            EntryDetail::Typedef { source_type, .. } => Some(source_type),
            _ => None,
        }
    }

    /// Class entry created for a typedef entry.
    #[must_use]
    pub fn typedef_target(&self) -> Option<TypeEntryRc> {
        match &self.detail {
            EntryDetail::Typedef { target, .. } => Some(target.clone()),
            _ => None,
        }
    }

    /// Function modifications matching `signature`; empty for non-class entries.
    #[must_use]
    pub fn function_modifications_for(&self, signature: &str) -> Vec<FunctionModification> {
        self.complex()
            .map(|data| data.modifications_for(signature))
            .unwrap_or_default()
    }

    /// Field modification for `name`.
    #[must_use]
    pub fn field_modification(&self, name: &str) -> Option<&FieldModification> {
        self.complex()?
            .field_modifications()
            .iter()
            .find(|m| m.name == name)
    }
}

impl fmt::Display for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesystem::FieldModification;

    #[test]
    fn test_kind_is_fixed_per_constructor() {
        assert_eq!(TypeEntry::primitive("int").kind(), TypeEntryKind::Primitive);
        assert_eq!(TypeEntry::object("QObject").kind(), TypeEntryKind::Object);
        assert!(TypeEntry::namespace("Gui").is_complex());
        assert!(!TypeEntry::enumeration("Gui::Color").is_complex());
    }

    #[test]
    fn test_enum_qualifier_and_null_value() {
        let entry = TypeEntry::enumeration("Gui::Widget::State");
        assert_eq!(entry.enum_qualifier(), Some("Gui::Widget"));
        assert_eq!(entry.local_name(), "State");

        entry.set_null_value("Idle");
        entry.set_null_value("Busy");
        assert_eq!(entry.null_value(), Some("Idle"));
    }

    #[test]
    fn test_referenced_primitive() {
        let int_entry = Arc::new(TypeEntry::primitive("int"));
        let alias = TypeEntry::primitive("qint32");
        alias.set_referenced_primitive(int_entry.clone());
        assert!(Arc::ptr_eq(&alias.referenced_primitive().unwrap(), &int_entry));
    }

    #[test]
    fn test_complex_builders_ignored_on_simple_entries() {
        let entry = TypeEntry::primitive("int")
            .with_function_modification(FunctionModification::new("foo()"));
        assert!(entry.complex().is_none());
        assert!(entry.function_modifications_for("foo()").is_empty());
    }

    #[test]
    fn test_modifications_lookup() {
        let entry = TypeEntry::object("Widget")
            .with_function_modification(FunctionModification::new("show()").rename("display"))
            .with_field_modification(FieldModification::new("id").remove());

        assert_eq!(entry.function_modifications_for("show()").len(), 1);
        assert!(entry.field_modification("id").unwrap().is_removed());

        entry
            .complex()
            .unwrap()
            .add_function_modification(FunctionModification::new("hide()"));
        assert_eq!(entry.function_modifications_for("hide()").len(), 1);
    }

    #[test]
    fn test_function_signatures() {
        let entry = TypeEntry::function("qMax", &["qMax(int, int)"]);
        assert!(entry.has_signature("qMax(int,int)"));
        assert!(!entry.has_signature("qMax(double,double)"));
    }
}
