use bitflags::bitflags;

use crate::{
    codemodel::{Access, EnumKind, ExceptionSpecification, FunctionType, TypeInfo},
    Error::RecursionLimit,
    Result,
};

bitflags! {
    /// Declaration specifiers and properties of a function.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionModifiers: u32 {
        /// `void f() const`
        const CONST = 0x0001;
        /// `virtual`
        const VIRTUAL = 0x0002;
        /// `override`
        const OVERRIDE = 0x0004;
        /// `final`
        const FINAL = 0x0008;
        /// `= 0`
        const ABSTRACT = 0x0010;
        /// `static`
        const STATIC = 0x0020;
        /// `explicit`
        const EXPLICIT = 0x0040;
        /// `= delete`
        const DELETED = 0x0080;
        /// `friend`
        const FRIEND = 0x0100;
        /// `[[deprecated]]` or `Q_DECL_DEPRECATED`
        const DEPRECATED = 0x0200;
        /// `Q_INVOKABLE`
        const INVOKABLE = 0x0400;
        /// Trailing `...`
        const VARIADIC = 0x0800;
        /// `inline`
        const INLINE = 0x1000;
    }
}

/// Strip a template argument suffix: `Foo<T>` becomes `Foo`.
pub(crate) fn strip_template_arguments(name: &str) -> &str {
    name.find('<').map_or(name, |index| name[..index].trim_end())
}

/// Declarations shared by every scope: the global namespace, namespaces and classes.
#[derive(Debug, Clone, Default)]
pub struct ScopeModel {
    /// Unqualified name; empty for the global scope
    pub name: String,
    /// Header the scope was declared in
    pub file_name: Option<String>,
    /// Nested classes, in declaration order
    pub classes: Vec<ClassModel>,
    /// Enums, in declaration order
    pub enums: Vec<EnumModel>,
    /// Typedefs, in declaration order
    pub typedefs: Vec<TypeDefModel>,
    /// Functions, in declaration order
    pub functions: Vec<FunctionModel>,
    /// Variables and data members, in declaration order
    pub variables: Vec<VariableModel>,
}

impl ScopeModel {
    /// Create an empty scope.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ScopeModel {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// All functions named `name` declared directly in this scope.
    #[must_use]
    pub fn find_functions(&self, name: &str) -> Vec<&FunctionModel> {
        self.functions.iter().filter(|f| f.name == name).collect()
    }

    /// The class named `name`, ignoring template argument suffixes.
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<&ClassModel> {
        self.classes
            .iter()
            .find(|c| strip_template_arguments(&c.scope.name) == name)
    }

    /// The typedef named `name`.
    #[must_use]
    pub fn find_typedef(&self, name: &str) -> Option<&TypeDefModel> {
        self.typedefs.iter().find(|t| t.name == name)
    }

    /// The enum named `name`.
    #[must_use]
    pub fn find_enum(&self, name: &str) -> Option<&EnumModel> {
        self.enums.iter().find(|e| e.name == name)
    }
}

macro_rules! scope_builders {
    ($target:ty) => {
        impl $target {
            /// Set the header the scope was declared in.
            #[must_use]
            pub fn with_file(mut self, file_name: &str) -> Self {
                self.scope.file_name = Some(file_name.to_string());
                self
            }

            /// Append a nested class.
            #[must_use]
            pub fn with_class(mut self, class: ClassModel) -> Self {
                self.scope.classes.push(class);
                self
            }

            /// Append an enum.
            #[must_use]
            pub fn with_enum(mut self, item: EnumModel) -> Self {
                self.scope.enums.push(item);
                self
            }

            /// Append a typedef.
            #[must_use]
            pub fn with_typedef(mut self, item: TypeDefModel) -> Self {
                self.scope.typedefs.push(item);
                self
            }

            /// Append a function.
            #[must_use]
            pub fn with_function(mut self, item: FunctionModel) -> Self {
                self.scope.functions.push(item);
                self
            }

            /// Append a variable.
            #[must_use]
            pub fn with_variable(mut self, item: VariableModel) -> Self {
                self.scope.variables.push(item);
                self
            }

            /// Append a nested class in place.
            pub fn add_class(&mut self, class: ClassModel) {
                self.scope.classes.push(class);
            }

            /// Append a function in place.
            pub fn add_function(&mut self, item: FunctionModel) {
                self.scope.functions.push(item);
            }

            /// Append an enum in place.
            pub fn add_enum(&mut self, item: EnumModel) {
                self.scope.enums.push(item);
            }

            /// Append a typedef in place.
            pub fn add_typedef(&mut self, item: TypeDefModel) {
                self.scope.typedefs.push(item);
            }
        }
    };
}

/// A namespace and everything declared in it.
#[derive(Debug, Clone, Default)]
pub struct NamespaceModel {
    /// Declarations of the namespace
    pub scope: ScopeModel,
    /// Nested namespaces
    pub namespaces: Vec<NamespaceModel>,
}

impl NamespaceModel {
    /// Create an empty namespace.
    #[must_use]
    pub fn new(name: &str) -> Self {
        NamespaceModel {
            scope: ScopeModel::new(name),
            namespaces: Vec::new(),
        }
    }

    /// The unqualified namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.scope.name
    }

    /// Append a nested namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: NamespaceModel) -> Self {
        self.namespaces.push(namespace);
        self
    }

    /// Append a nested namespace in place.
    pub fn add_namespace(&mut self, namespace: NamespaceModel) {
        self.namespaces.push(namespace);
    }
}

scope_builders!(NamespaceModel);

/// A base class as written in a class head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSpecifier {
    /// Base name as written, possibly with template arguments
    pub name: String,
    /// Inheritance access
    pub access: Access,
}

/// A class, struct or union definition.
#[derive(Debug, Clone, Default)]
pub struct ClassModel {
    /// Declarations of the class body
    pub scope: ScopeModel,
    /// Base classes in declaration order
    pub base_classes: Vec<BaseSpecifier>,
    /// Template parameter names, empty for non-templates
    pub template_parameters: Vec<String>,
    /// Declared `final`
    pub is_final: bool,
    /// `Q_PROPERTY` declarations, the text between the parentheses
    pub property_declarations: Vec<String>,
}

impl ClassModel {
    /// Create an empty class.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ClassModel {
            scope: ScopeModel::new(name),
            ..Default::default()
        }
    }

    /// The class name as written.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.scope.name
    }

    /// Append a base class.
    #[must_use]
    pub fn with_base(mut self, name: &str, access: Access) -> Self {
        self.base_classes.push(BaseSpecifier {
            name: name.to_string(),
            access,
        });
        self
    }

    /// Append a template parameter.
    #[must_use]
    pub fn with_template_parameter(mut self, name: &str) -> Self {
        self.template_parameters.push(name.to_string());
        self
    }

    /// Mark the class `final`.
    #[must_use]
    pub fn final_class(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Append a `Q_PROPERTY(...)` declaration, e.g. `int value READ value WRITE setValue`.
    #[must_use]
    pub fn with_property(mut self, declaration: &str) -> Self {
        self.property_declarations.push(declaration.to_string());
        self
    }
}

scope_builders!(ClassModel);

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentModel {
    /// Parameter name, empty when unnamed
    pub name: String,
    /// Parameter type
    pub type_info: TypeInfo,
    /// Default expression as written
    pub default_value: Option<String>,
}

impl ArgumentModel {
    /// Create a parameter.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `type_name` does not parse.
    pub fn new(name: &str, type_name: &str) -> Result<Self> {
        Ok(ArgumentModel {
            name: name.to_string(),
            type_info: TypeInfo::parse(type_name)?,
            default_value: None,
        })
    }

    /// Attach a default expression.
    #[must_use]
    pub fn with_default(mut self, expression: &str) -> Self {
        self.default_value = Some(expression.to_string());
        self
    }
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FunctionModel {
    /// Name as written, `operator+` for operators
    pub name: String,
    /// Front end classification
    pub function_type: FunctionType,
    /// Access policy
    pub access: Access,
    /// Return type; `void` for constructors and destructors
    pub return_type: TypeInfo,
    /// Parameters in order
    pub arguments: Vec<ArgumentModel>,
    /// Declaration specifiers
    pub modifiers: FunctionModifiers,
    /// Template parameter names of a function template
    pub template_parameters: Vec<String>,
    /// Exception specification
    pub exception_specification: ExceptionSpecification,
    /// Header the declaration is in
    pub file_name: Option<String>,
}

impl FunctionModel {
    /// Create a public, normal function.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `return_type` does not parse.
    pub fn new(name: &str, return_type: &str) -> Result<Self> {
        Ok(FunctionModel {
            name: name.to_string(),
            function_type: FunctionType::Normal,
            access: Access::Public,
            return_type: TypeInfo::parse(return_type)?,
            arguments: Vec::new(),
            modifiers: FunctionModifiers::empty(),
            template_parameters: Vec::new(),
            exception_specification: ExceptionSpecification::Unknown,
            file_name: None,
        })
    }

    /// Create a public constructor for class `name`.
    #[must_use]
    pub fn constructor(name: &str) -> Self {
        FunctionModel {
            name: name.to_string(),
            function_type: FunctionType::Constructor,
            access: Access::Public,
            return_type: TypeInfo::from_name("void"),
            arguments: Vec::new(),
            modifiers: FunctionModifiers::empty(),
            template_parameters: Vec::new(),
            exception_specification: ExceptionSpecification::Unknown,
            file_name: None,
        }
    }

    /// Create a public destructor for class `name`.
    #[must_use]
    pub fn destructor(name: &str) -> Self {
        let mut function = FunctionModel::constructor(&format!("~{name}"));
        function.function_type = FunctionType::Destructor;
        function
    }

    /// Append a parameter.
    #[must_use]
    pub fn with_argument(mut self, argument: ArgumentModel) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Set the access policy.
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Add declaration specifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: FunctionModifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Override the front end classification.
    #[must_use]
    pub fn with_type(mut self, function_type: FunctionType) -> Self {
        self.function_type = function_type;
        self
    }

    /// Set the exception specification.
    #[must_use]
    pub fn with_exception_specification(mut self, specification: ExceptionSpecification) -> Self {
        self.exception_specification = specification;
        self
    }

    /// Make this a function template.
    #[must_use]
    pub fn with_template_parameter(mut self, name: &str) -> Self {
        self.template_parameters.push(name.to_string());
        self
    }

    /// Returns true if the function has the given specifier.
    #[must_use]
    pub fn has(&self, modifier: FunctionModifiers) -> bool {
        self.modifiers.contains(modifier)
    }
}

/// One enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratorModel {
    /// Enumerator name
    pub name: String,
    /// Initializer as written, empty if implicit
    pub expression: String,
    /// Evaluated value
    pub value: i64,
}

impl EnumeratorModel {
    /// Create an enumerator with an evaluated value.
    #[must_use]
    pub fn new(name: &str, value: i64) -> Self {
        EnumeratorModel {
            name: name.to_string(),
            expression: String::new(),
            value,
        }
    }

    /// Record the initializer text.
    #[must_use]
    pub fn with_expression(mut self, expression: &str) -> Self {
        self.expression = expression.to_string();
        self
    }
}

/// An enum declaration.
#[derive(Debug, Clone)]
pub struct EnumModel {
    /// Enum name, empty for anonymous enums
    pub name: String,
    /// Flavor
    pub kind: EnumKind,
    /// Access policy inside a class
    pub access: Access,
    /// Enumerators in order
    pub enumerators: Vec<EnumeratorModel>,
    /// Underlying type is signed
    pub signed: bool,
    /// Header the declaration is in
    pub file_name: Option<String>,
}

impl EnumModel {
    /// Create a named enum.
    #[must_use]
    pub fn new(name: &str, kind: EnumKind) -> Self {
        EnumModel {
            name: name.to_string(),
            kind,
            access: Access::Public,
            enumerators: Vec::new(),
            signed: true,
            file_name: None,
        }
    }

    /// Create an anonymous enum.
    #[must_use]
    pub fn anonymous() -> Self {
        EnumModel::new("", EnumKind::AnonymousEnum)
    }

    /// Append an enumerator.
    #[must_use]
    pub fn with_enumerator(mut self, enumerator: EnumeratorModel) -> Self {
        self.enumerators.push(enumerator);
        self
    }

    /// Set the access policy.
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }
}

/// A typedef or alias declaration.
#[derive(Debug, Clone)]
pub struct TypeDefModel {
    /// Alias name
    pub name: String,
    /// Aliased type
    pub type_info: TypeInfo,
    /// Header the declaration is in
    pub file_name: Option<String>,
}

impl TypeDefModel {
    /// Create a typedef.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `type_name` does not parse.
    pub fn new(name: &str, type_name: &str) -> Result<Self> {
        Ok(TypeDefModel {
            name: name.to_string(),
            type_info: TypeInfo::parse(type_name)?,
            file_name: None,
        })
    }
}

/// A variable or data member.
#[derive(Debug, Clone)]
pub struct VariableModel {
    /// Member name
    pub name: String,
    /// Declared type
    pub type_info: TypeInfo,
    /// Access policy
    pub access: Access,
    /// `static`
    pub is_static: bool,
    /// Friend declaration
    pub is_friend: bool,
}

impl VariableModel {
    /// Create a public, non-static member.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `type_name` does not parse.
    pub fn new(name: &str, type_name: &str) -> Result<Self> {
        Ok(VariableModel {
            name: name.to_string(),
            type_info: TypeInfo::parse(type_name)?,
            access: Access::Public,
            is_static: false,
            is_friend: false,
        })
    }

    /// Set the access policy.
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Mark the member `static`.
    #[must_use]
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark the declaration as a friend.
    #[must_use]
    pub fn friend(mut self) -> Self {
        self.is_friend = true;
        self
    }
}

#[derive(Clone, Copy)]
enum ScopeNode<'a> {
    Namespace(&'a NamespaceModel),
    Class(&'a ClassModel),
}

impl<'a> ScopeNode<'a> {
    fn scope(self) -> &'a ScopeModel {
        match self {
            ScopeNode::Namespace(namespace) => &namespace.scope,
            ScopeNode::Class(class) => &class.scope,
        }
    }

    fn child(self, name: &str) -> Option<ScopeNode<'a>> {
        if let ScopeNode::Namespace(namespace) = self {
            if let Some(nested) = namespace.namespaces.iter().find(|n| n.name() == name) {
                return Some(ScopeNode::Namespace(nested));
            }
        }
        self.scope().find_class(name).map(ScopeNode::Class)
    }
}

/// One parsed translation unit.
#[derive(Debug, Clone, Default)]
pub struct CodeModel {
    file_name: String,
    global: NamespaceModel,
}

impl CodeModel {
    /// Create an empty model for the given main header.
    #[must_use]
    pub fn new(file_name: &str) -> Self {
        CodeModel {
            file_name: file_name.to_string(),
            global: NamespaceModel::default(),
        }
    }

    /// The main header the model was parsed from.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The global namespace.
    #[must_use]
    pub fn global(&self) -> &NamespaceModel {
        &self.global
    }

    /// The global namespace, mutably.
    pub fn global_mut(&mut self) -> &mut NamespaceModel {
        &mut self.global
    }

    fn find_node(&self, path: &[String]) -> Option<ScopeNode<'_>> {
        let mut node = ScopeNode::Namespace(&self.global);
        for segment in path {
            node = node.child(segment)?;
        }
        Some(node)
    }

    /// The scope at `path`; an empty path is the global scope.
    #[must_use]
    pub fn find_scope(&self, path: &[String]) -> Option<&ScopeModel> {
        self.find_node(path).map(ScopeNode::scope)
    }

    /// The class at `path`.
    #[must_use]
    pub fn find_class<S: AsRef<str>>(&self, path: &[S]) -> Option<&ClassModel> {
        let path: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
        match self.find_node(&path)? {
            ScopeNode::Class(class) => Some(class),
            ScopeNode::Namespace(_) => None,
        }
    }

    /// Find the typedef a (possibly qualified) name refers to when used inside `scope_path`.
    ///
    /// Scopes are searched innermost first.
    #[must_use]
    pub fn find_typedef(&self, name: &[String], scope_path: &[String]) -> Option<&TypeDefModel> {
        let (last, qualifier) = name.split_last()?;
        (0..=scope_path.len()).rev().find_map(|depth| {
            let mut path = scope_path[..depth].to_vec();
            path.extend(qualifier.iter().cloned());
            self.find_scope(&path)?.find_typedef(last)
        })
    }

    /// Expand typedefs in `info` as seen from `scope_path`.
    ///
    /// Each step replaces the name with the aliased type and reapplies the qualifiers of the
    /// use site, until no typedef matches.
    ///
    /// ## Arguments
    /// * 'info' - The type to expand
    /// * 'scope_path' - Names of the enclosing scopes, outermost first
    /// * 'max_depth' - Maximum number of expansions
    ///
    /// # Errors
    /// Returns [`crate::Error::RecursionLimit`] when more than `max_depth` expansions are
    /// needed, which only happens for alias chains that loop.
    pub fn resolve_type(
        &self,
        info: &TypeInfo,
        scope_path: &[String],
        max_depth: usize,
    ) -> Result<TypeInfo> {
        let mut current = info.clone();
        for _ in 0..max_depth {
            let Some(typedef) = self.find_typedef(&current.qualified_name, scope_path) else {
                return Ok(current);
            };

            // typedef struct Foo Foo;
            if typedef.type_info.qualified_name == current.qualified_name {
                return Ok(current);
            }
            let mut expanded = typedef.type_info.combine(&current);
            if !current.instantiations.is_empty() {
                expanded.instantiations = current.instantiations.clone();
            }
            current = expanded;
        }
        Err(RecursionLimit(max_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn sample_model() -> CodeModel {
        let mut model = CodeModel::new("sample.h");
        model.global_mut().add_typedef(TypeDefModel::new("Real", "double").unwrap());
        model.global_mut().add_namespace(
            NamespaceModel::new("Gui")
                .with_typedef(TypeDefModel::new("WidgetPtr", "Widget*").unwrap())
                .with_class(
                    ClassModel::new("Widget")
                        .with_typedef(TypeDefModel::new("Id", "Real").unwrap())
                        .with_function(FunctionModel::new("show", "void").unwrap())
                        .with_function(FunctionModel::new("show", "void").unwrap()),
                ),
        );
        model
    }

    #[test]
    fn test_find_class_and_scope() {
        let model = sample_model();
        assert!(model.find_class(&["Gui", "Widget"]).is_some());
        assert!(model.find_class(&["Gui"]).is_none());
        assert!(model.find_scope(&[]).is_some());
        assert_eq!(
            model
                .find_class(&["Gui", "Widget"])
                .unwrap()
                .scope
                .find_functions("show")
                .len(),
            2
        );
    }

    #[test]
    fn test_resolve_typedef_chain() {
        let model = sample_model();
        let scope = vec!["Gui".to_string(), "Widget".to_string()];
        let resolved = model
            .resolve_type(&TypeInfo::parse("const Id&").unwrap(), &scope, 64)
            .unwrap();
        assert_eq!(resolved.to_string(), "const double&");
    }

    #[test]
    fn test_resolve_typedef_qualified() {
        let model = sample_model();
        let resolved = model
            .resolve_type(&TypeInfo::parse("Gui::WidgetPtr").unwrap(), &[], 64)
            .unwrap();
        assert_eq!(resolved.to_string(), "Widget*");
    }

    #[test]
    fn test_resolve_typedef_loop_is_bounded() {
        let mut model = CodeModel::new("loop.h");
        model.global_mut().add_typedef(TypeDefModel::new("A", "B").unwrap());
        model.global_mut().add_typedef(TypeDefModel::new("B", "A").unwrap());
        let result = model.resolve_type(&TypeInfo::from_name("A"), &[], 8);
        assert!(matches!(result, Err(Error::RecursionLimit(8))));
    }

    #[test]
    fn test_strip_template_arguments() {
        assert_eq!(strip_template_arguments("QList<T>"), "QList");
        assert_eq!(strip_template_arguments("Plain"), "Plain");
    }
}
