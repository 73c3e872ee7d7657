use std::{
    fmt,
    sync::{Arc, LazyLock, OnceLock},
};

use bitflags::bitflags;
use regex::Regex;
use strum::{Display, EnumIter};

use crate::{
    codemodel::{normalize_signature, ExceptionSpecification},
    meta::{MetaClassRc, MetaClassRef, MetaType, PropertySpec},
    typesystem::{
        AllowThread, DocModification, ExceptionHandling, FunctionModification, Ownership,
        TypeDatabase, TypeEntryRc,
    },
};

/// A reference-counted pointer to a [`MetaFunction`]
pub type MetaFunctionRc = Arc<MetaFunction>;

static CONVERSION_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^operator(?:\s+(?:const|volatile))?\s+([\w:]+(?:<.*>)?)\s*[&*]?$")
        .expect("conversion operator pattern is valid")
});

/// Classification of a [`MetaFunction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FunctionKind {
    /// Constructor
    Constructor,
    /// Copy constructor
    CopyConstructor,
    /// Move constructor
    MoveConstructor,
    /// Destructor
    Destructor,
    /// Member or free function
    Normal,
    /// Free function attached to a class, such as a stream operator
    GlobalScope,
    /// `Q_SIGNAL`
    Signal,
    /// `Q_SLOT`
    Slot,
    /// Copy assignment `operator=`
    AssignmentOperator,
    /// Move assignment `operator=`
    MoveAssignmentOperator,
}

/// Visibility of a member in the produced model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum Visibility {
    /// Public
    #[default]
    Public,
    /// Protected
    Protected,
    /// Private
    Private,
    /// Package-level, the result of an access modification
    Friendly,
}

bitflags! {
    /// Attribute set of a [`MetaFunction`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionAttributes: u32 {
        /// Static member or free function
        const STATIC = 0x0000_0001;
        /// Virtual
        const VIRTUAL = 0x0000_0002;
        /// Pure virtual
        const ABSTRACT = 0x0000_0004;
        /// Declared `final` or non-virtual
        const FINAL_CPP = 0x0000_0008;
        /// Cannot be overridden from the target language
        const FINAL_IN_TARGET_LANG = 0x0000_0010;
        /// Declared `override`
        const OVERRIDE = 0x0000_0020;
        /// Declared `explicit`
        const EXPLICIT = 0x0000_0040;
        /// Deprecated in C++ or by rule
        const DEPRECATED = 0x0000_0080;
        /// `const` member function
        const CONST = 0x0000_0100;
        /// `Q_INVOKABLE`
        const INVOKABLE = 0x0000_0200;
        /// Operator whose self operand was the second argument
        const REVERSE_OPERATOR = 0x0000_0400;
        /// Operator whose removed self operand was a pointer
        const POINTER_OPERATOR = 0x0000_0800;
        /// Property getter
        const PROPERTY_READER = 0x0000_1000;
        /// Property setter
        const PROPERTY_WRITER = 0x0000_2000;
        /// Property resetter
        const PROPERTY_RESETTER = 0x0000_4000;
        /// Declared only in the rule database
        const ADDED = 0x0000_8000;
        /// Synthesized by the builder (implicit constructors)
        const IMPLICIT = 0x0001_0000;
        /// Copied from a template base
        const INSTANTIATED = 0x0002_0000;
    }
}

/// One argument of a [`MetaFunction`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetaArgument {
    /// Effective name
    pub name: String,
    /// Name in the declaration, empty when unnamed
    pub original_name: String,
    /// Resolved type
    pub argument_type: MetaType,
    /// Position, starting at 0
    pub index: usize,
    /// Effective default expression
    pub default_value: Option<String>,
    /// Default expression as declared
    pub original_default_value: Option<String>,
    /// Removed from the target-language signature
    pub removed: bool,
    /// Ownership transfer rule
    pub ownership: Option<Ownership>,
}

impl MetaArgument {
    /// Create an argument without default expression.
    #[must_use]
    pub fn new(name: &str, argument_type: MetaType, index: usize) -> Self {
        MetaArgument {
            name: name.to_string(),
            original_name: name.to_string(),
            argument_type,
            index,
            default_value: None,
            original_default_value: None,
            removed: false,
            ownership: None,
        }
    }

    /// Returns true if an effective default expression exists.
    #[must_use]
    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    /// Returns true if the declaration had a default expression.
    #[must_use]
    pub fn has_original_default_value(&self) -> bool {
        self.original_default_value.is_some()
    }
}

impl fmt::Display for MetaArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.argument_type, self.name)?;
        if let Some(value) = &self.default_value {
            write!(f, " = {value}")?;
        }
        Ok(())
    }
}

/// A member function, free function or synthesized function.
///
/// Functions are assembled by the builder and shared as [`MetaFunctionRc`] once added to a
/// class. The effective exception and thread policies are computed after inheritance is known
/// and are therefore stored in set-once cells.
#[derive(Debug, Clone)]
pub struct MetaFunction {
    /// Effective name
    pub name: String,
    /// Name as declared
    pub original_name: String,
    /// Classification
    pub kind: FunctionKind,
    /// Arguments in order
    pub arguments: Vec<MetaArgument>,
    /// Return type, `None` for `void` and constructors
    pub return_type: Option<MetaType>,
    /// Visibility
    pub visibility: Visibility,
    /// Attribute set
    pub attributes: FunctionAttributes,
    /// Class the function was declared in
    pub declaring_class: Option<MetaClassRef>,
    /// Class the function belongs to
    pub implementing_class: Option<MetaClassRef>,
    /// Property this function reads, writes or resets
    pub property_spec: Option<Arc<PropertySpec>>,
    /// `noexcept` or `throw()` information
    pub exception_specification: ExceptionSpecification,
    /// Exception handling policy from a function modification
    pub exception_handling: ExceptionHandling,
    /// Thread policy from a function modification
    pub allow_thread: AllowThread,
    /// Function type entry of a global function
    pub type_entry: Option<TypeEntryRc>,
    effective_exception_handling: OnceLock<ExceptionHandling>,
    effective_allow_thread: OnceLock<AllowThread>,
}

impl MetaFunction {
    /// Create a public function without arguments or return type.
    #[must_use]
    pub fn new(name: &str, kind: FunctionKind) -> Self {
        MetaFunction {
            name: name.to_string(),
            original_name: name.to_string(),
            kind,
            arguments: Vec::new(),
            return_type: None,
            visibility: Visibility::Public,
            attributes: FunctionAttributes::empty(),
            declaring_class: None,
            implementing_class: None,
            property_spec: None,
            exception_specification: ExceptionSpecification::Unknown,
            exception_handling: ExceptionHandling::Unspecified,
            allow_thread: AllowThread::Unspecified,
            type_entry: None,
            effective_exception_handling: OnceLock::new(),
            effective_allow_thread: OnceLock::new(),
        }
    }

    /// Returns true if all of `attributes` are set.
    #[must_use]
    pub fn has(&self, attributes: FunctionAttributes) -> bool {
        self.attributes.contains(attributes)
    }

    /// Set both the declaring and implementing class.
    pub fn set_owner(&mut self, class: &MetaClassRc) {
        self.declaring_class = Some(MetaClassRef::new(class));
        self.implementing_class = Some(MetaClassRef::new(class));
    }

    /// The implementing class.
    #[must_use]
    pub fn implementing_class(&self) -> Option<MetaClassRc> {
        self.implementing_class.as_ref().and_then(MetaClassRef::upgrade)
    }

    /// The declaring class.
    #[must_use]
    pub fn declaring_class(&self) -> Option<MetaClassRc> {
        self.declaring_class.as_ref().and_then(MetaClassRef::upgrade)
    }

    /// Constructor of any flavour.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        matches!(
            self.kind,
            FunctionKind::Constructor | FunctionKind::CopyConstructor | FunctionKind::MoveConstructor
        )
    }

    /// Destructor.
    #[must_use]
    pub fn is_destructor(&self) -> bool {
        self.kind == FunctionKind::Destructor
    }

    /// Static member or free function.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.has(FunctionAttributes::STATIC)
    }

    /// `const` member function.
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.has(FunctionAttributes::CONST)
    }

    /// Pure virtual.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.has(FunctionAttributes::ABSTRACT)
    }

    /// Operator with flipped argument order.
    #[must_use]
    pub fn is_reverse_operator(&self) -> bool {
        self.has(FunctionAttributes::REVERSE_OPERATOR)
    }

    /// Declared only in the rule database.
    #[must_use]
    pub fn is_user_added(&self) -> bool {
        self.has(FunctionAttributes::ADDED)
    }

    /// Returns true for `operatorX` where X is a symbol or a conversion type.
    #[must_use]
    pub fn is_operator_overload(&self) -> bool {
        is_operator_name(&self.original_name)
    }

    /// Returns true for `operator T()`.
    #[must_use]
    pub fn is_conversion_operator(&self) -> bool {
        CONVERSION_OPERATOR.is_match(&self.original_name)
    }

    /// The type spelled by a conversion operator name.
    #[must_use]
    pub fn conversion_type_name(&self) -> Option<&str> {
        CONVERSION_OPERATOR
            .captures(&self.original_name)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
    }

    /// Returns true for `operator==`.
    #[must_use]
    pub fn is_equals_operator(&self) -> bool {
        self.original_name == "operator=="
    }

    /// Returns true for copy or move assignment.
    #[must_use]
    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self.kind,
            FunctionKind::AssignmentOperator | FunctionKind::MoveAssignmentOperator
        )
    }

    /// Returns true if the argument at `index` has an effective default.
    #[must_use]
    pub fn has_default_value(&self, index: usize) -> bool {
        self.arguments
            .get(index)
            .is_some_and(MetaArgument::has_default_value)
    }

    /// Number of arguments without a default expression.
    #[must_use]
    pub fn required_argument_count(&self) -> usize {
        self.arguments
            .iter()
            .filter(|argument| !argument.has_default_value())
            .count()
    }

    /// Signature used to match rule database modifications, e.g. `setText(const QString&)const`.
    #[must_use]
    pub fn minimal_signature(&self) -> String {
        let arguments: Vec<String> = self
            .arguments
            .iter()
            .map(|argument| argument.argument_type.minimal_signature())
            .collect();
        let mut signature = format!("{}({})", self.original_name, arguments.join(","));
        if self.is_const() {
            signature.push_str("const");
        }
        normalize_signature(&signature)
    }

    /// Modifications matching this function.
    ///
    /// Member functions look at their implementing class entry, free functions at the global
    /// modifications of `database`.
    #[must_use]
    pub fn modifications(&self, database: &TypeDatabase) -> Vec<FunctionModification> {
        let signature = self.minimal_signature();
        match self.implementing_class() {
            Some(class) => class.type_entry().function_modifications_for(&signature),
            None => database.global_function_modifications(&signature),
        }
    }

    /// Returns true if a modification removes the function from the target language.
    #[must_use]
    pub fn is_modified_removed(&self, database: &TypeDatabase) -> bool {
        self.modifications(database)
            .iter()
            .any(FunctionModification::is_removed)
    }

    /// Documentation edits declared for this function.
    #[must_use]
    pub fn doc_modifications(&self) -> Vec<DocModification> {
        let signature = self.minimal_signature();
        let Some(class) = self.implementing_class() else {
            return Vec::new();
        };
        let Some(data) = class.type_entry().complex() else {
            return Vec::new();
        };
        data.doc_modifications()
            .iter()
            .filter(|modification| normalize_signature(&modification.signature) == signature)
            .cloned()
            .collect()
    }

    /// Exception handling policy after inheritance; falls back to the function modification.
    #[must_use]
    pub fn effective_exception_handling(&self) -> ExceptionHandling {
        self.effective_exception_handling
            .get()
            .copied()
            .unwrap_or(self.exception_handling)
    }

    /// Thread policy after inheritance; falls back to the function modification.
    #[must_use]
    pub fn effective_allow_thread(&self) -> AllowThread {
        self.effective_allow_thread
            .get()
            .copied()
            .unwrap_or(self.allow_thread)
    }

    /// Record the effective policies. Later calls are ignored.
    pub fn set_effective_policies(&self, exception_handling: ExceptionHandling, allow_thread: AllowThread) {
        let _ = self.effective_exception_handling.set(exception_handling);
        let _ = self.effective_allow_thread.set(allow_thread);
    }
}

impl fmt::Display for MetaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(class) = self.implementing_class() {
            write!(f, "{}::", class.qualified_name())?;
        }
        let arguments: Vec<String> = self.arguments.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.name, arguments.join(", "))?;
        if self.is_const() {
            write!(f, " const")?;
        }
        Ok(())
    }
}

/// Returns true if `name` spells an operator function.
#[must_use]
pub(crate) fn is_operator_name(name: &str) -> bool {
    name.strip_prefix("operator").is_some_and(|rest| {
        rest.chars()
            .next()
            .is_some_and(|c| !(c.is_alphanumeric() || c == '_') || c.is_whitespace())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesystem::TypeEntry;

    fn argument(type_name: &str, index: usize) -> MetaArgument {
        MetaArgument::new("", MetaType::new(Arc::new(TypeEntry::primitive(type_name))), index)
    }

    #[test]
    fn test_operator_names() {
        assert!(is_operator_name("operator+"));
        assert!(is_operator_name("operator<<"));
        assert!(is_operator_name("operator int"));
        assert!(!is_operator_name("operatorName"));
        assert!(!is_operator_name("operator"));
        assert!(!is_operator_name("value"));
    }

    #[test]
    fn test_conversion_operator() {
        let function = MetaFunction::new("operator QVariant", FunctionKind::Normal);
        assert!(function.is_conversion_operator());
        assert_eq!(function.conversion_type_name(), Some("QVariant"));

        let function = MetaFunction::new("operator const char *", FunctionKind::Normal);
        assert_eq!(function.conversion_type_name(), Some("char"));

        let function = MetaFunction::new("operator+=", FunctionKind::Normal);
        assert!(!function.is_conversion_operator());
        assert!(function.is_operator_overload());
    }

    #[test]
    fn test_minimal_signature() {
        let mut function = MetaFunction::new("resize", FunctionKind::Normal);
        function.arguments.push(argument("int", 0));
        function.arguments.push(argument("int", 1));
        function.attributes |= FunctionAttributes::CONST;
        assert_eq!(function.minimal_signature(), "resize(int,int)const");

        function.name = "setSize".to_string();
        assert_eq!(function.minimal_signature(), "resize(int,int)const");
    }

    #[test]
    fn test_required_arguments() {
        let mut function = MetaFunction::new("move", FunctionKind::Normal);
        function.arguments.push(argument("int", 0));
        let mut defaulted = argument("int", 1);
        defaulted.default_value = Some("0".to_string());
        function.arguments.push(defaulted);
        assert_eq!(function.required_argument_count(), 1);
        assert!(function.has_default_value(1));
        assert!(!function.has_default_value(5));
    }

    #[test]
    fn test_effective_policies() {
        let mut function = MetaFunction::new("run", FunctionKind::Normal);
        function.allow_thread = AllowThread::Allow;
        assert_eq!(function.effective_allow_thread(), AllowThread::Allow);
        function.set_effective_policies(ExceptionHandling::On, AllowThread::Disallow);
        function.set_effective_policies(ExceptionHandling::Off, AllowThread::Allow);
        assert_eq!(function.effective_exception_handling(), ExceptionHandling::On);
        assert_eq!(function.effective_allow_thread(), AllowThread::Disallow);
    }
}
