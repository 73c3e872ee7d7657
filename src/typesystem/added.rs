use std::sync::Arc;

use strum::Display;

use crate::{
    codemodel::{parse_signature, TypeInfo},
    Result,
};

/// A reference-counted pointer to an [`AddedFunction`]
pub type AddedFunctionRc = Arc<AddedFunction>;

/// Access of an added function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum AddedAccess {
    /// Protected member
    Protected,
    /// Public member
    #[default]
    Public,
}

/// One parameter of an added function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedArgument {
    /// Parameter name, empty when not given
    pub name: String,
    /// Parameter type as written
    pub type_info: TypeInfo,
    /// Default expression
    pub default_value: Option<String>,
}

/// A function that exists only in the rule database.
///
/// The signature is written like a C++ declaration without return type, the return type is
/// given separately:
///
/// ```rust
/// use cppmeta::typesystem::AddedFunction;
///
/// let function = AddedFunction::new("scaled(double factor, bool smooth = true) const", "Image")?;
/// assert_eq!(function.name(), "scaled");
/// assert_eq!(function.arguments().len(), 2);
/// assert_eq!(function.arguments()[1].default_value.as_deref(), Some("true"));
/// assert!(function.is_const());
/// # Ok::<(), cppmeta::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedFunction {
    name: String,
    arguments: Vec<AddedArgument>,
    return_type: TypeInfo,
    access: AddedAccess,
    is_const: bool,
    is_static: bool,
}

impl AddedFunction {
    /// Parse an added function.
    ///
    /// ## Arguments
    /// * 'signature' - `name(T1 a, T2 b = value) const`
    /// * 'return_type' - The return type, `void` for none
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] when the signature or return type does not parse.
    pub fn new(signature: &str, return_type: &str) -> Result<Self> {
        let parsed = parse_signature(signature)?;
        let arguments = parsed
            .arguments
            .into_iter()
            .map(|argument| AddedArgument {
                name: argument.name.unwrap_or_default(),
                type_info: argument.type_info,
                default_value: argument.default_value,
            })
            .collect();

        Ok(AddedFunction {
            name: parsed.name,
            arguments,
            return_type: TypeInfo::parse(return_type)?,
            access: AddedAccess::Public,
            is_const: parsed.is_const,
            is_static: false,
        })
    }

    /// Set the access.
    #[must_use]
    pub fn with_access(mut self, access: AddedAccess) -> Self {
        self.access = access;
        self
    }

    /// Make the function static.
    #[must_use]
    pub fn static_function(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters.
    #[must_use]
    pub fn arguments(&self) -> &[AddedArgument] {
        &self.arguments
    }

    /// Return type as written.
    #[must_use]
    pub fn return_type(&self) -> &TypeInfo {
        &self.return_type
    }

    /// Access.
    #[must_use]
    pub fn access(&self) -> AddedAccess {
        self.access
    }

    /// `const` member function.
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// Static function.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_function_defaults() {
        let function = AddedFunction::new("clear()", "void").unwrap();
        assert_eq!(function.access(), AddedAccess::Public);
        assert!(!function.is_static());
        assert!(function.return_type().is_void());
        assert!(function.arguments().is_empty());
    }

    #[test]
    fn test_added_operator() {
        let function = AddedFunction::new("operator+(Scalar, const Matrix&)", "Matrix")
            .unwrap()
            .with_access(AddedAccess::Protected)
            .static_function();
        assert_eq!(function.name(), "operator+");
        assert_eq!(function.arguments()[1].type_info.to_string(), "const Matrix&");
        assert!(function.arguments()[0].name.is_empty());
        assert_eq!(function.access(), AddedAccess::Protected);
        assert!(function.is_static());
    }

    #[test]
    fn test_added_function_errors() {
        assert!(AddedFunction::new("broken(", "void").is_err());
        assert!(AddedFunction::new("fine()", "QList<").is_err());
    }
}
