use std::fmt;

use crate::{codemodel::ReferenceType, Result};

/// A structured C++ type expression.
///
/// `TypeInfo` keeps the pieces of a declaration's type separate so that the resolver can look
/// up the bare name, then reapply qualifiers, indirections and template arguments on the
/// resolved entry. The name is stored as its `::` separated segments; template arguments are
/// nested `TypeInfo` values. Non-type template arguments (`Array<int, 4>`) are stored as a
/// single-segment name holding the literal.
///
/// # Examples
///
/// ```rust
/// use cppmeta::codemodel::{ReferenceType, TypeInfo};
///
/// let info = TypeInfo::parse("const QList<QString>&")?;
/// assert!(info.is_const);
/// assert_eq!(info.reference, ReferenceType::LValueReference);
/// assert_eq!(info.qualified_name, vec!["QList"]);
/// assert_eq!(info.instantiations[0].to_string(), "QString");
/// assert_eq!(info.to_string(), "const QList<QString>&");
/// # Ok::<(), cppmeta::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeInfo {
    /// Name segments, `["std", "vector"]` for `std::vector<int>`
    pub qualified_name: Vec<String>,
    /// `const` qualified
    pub is_const: bool,
    /// `volatile` qualified
    pub is_volatile: bool,
    /// Number of `*`
    pub indirections: usize,
    /// Reference qualifier
    pub reference: ReferenceType,
    /// Array dimensions as written, outermost first; an unbound dimension is empty
    pub array_elements: Vec<String>,
    /// Template arguments
    pub instantiations: Vec<TypeInfo>,
    /// Set for `R (*)(A...)`; the name then describes the return type
    pub function_pointer: bool,
    /// Parameter types of a function pointer
    pub arguments: Vec<TypeInfo>,
}

impl TypeInfo {
    /// Create a plain, unqualified type from a `::` separated name.
    ///
    /// ## Arguments
    /// * 'name' - The name, e.g. `Gui::Color`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        TypeInfo {
            qualified_name: name.split("::").map(str::to_string).collect(),
            ..Default::default()
        }
    }

    /// Parse a C++ type expression.
    ///
    /// ## Arguments
    /// * 'text' - The type as written, e.g. `const std::map<int, QString>&`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unbalanced brackets, stray tokens or an
    /// empty name.
    pub fn parse(text: &str) -> Result<Self> {
        super::parser::parse_type(text)
    }

    /// The qualified name joined with `::`, without template arguments.
    #[must_use]
    pub fn qualified_name_string(&self) -> String {
        self.qualified_name.join("::")
    }

    /// The last name segment.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.qualified_name.last().map_or("", String::as_str)
    }

    /// Returns true for a plain `void` (not `void*`).
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.qualified_name.len() == 1
            && self.qualified_name[0] == "void"
            && self.indirections == 0
            && self.reference == ReferenceType::NoReference
            && !self.function_pointer
            && self.array_elements.is_empty()
    }

    /// Returns true if the type carries any array dimension.
    #[must_use]
    pub fn is_array(&self) -> bool {
        !self.array_elements.is_empty()
    }

    /// Renders the name with its template arguments, without cv, pointer or reference
    /// qualifiers. This is the key used for flags and container lookups.
    #[must_use]
    pub fn instantiation_name(&self) -> String {
        let mut result = self.qualified_name_string();
        if !self.instantiations.is_empty() {
            result.push('<');
            for (index, argument) in self.instantiations.iter().enumerate() {
                if index > 0 {
                    result.push_str(", ");
                }
                result.push_str(&argument.to_string());
            }
            result.push('>');
        }
        result
    }

    /// Apply the qualifiers of `other` on top of `self`.
    ///
    /// Used when a typedef is expanded: `typedef Foo* FooPtr; const FooPtr&` becomes
    /// `const Foo*&`.
    #[must_use]
    pub fn combine(&self, other: &TypeInfo) -> TypeInfo {
        let mut result = self.clone();
        result.is_const |= other.is_const;
        result.is_volatile |= other.is_volatile;
        result.indirections += other.indirections;
        if other.reference != ReferenceType::NoReference {
            result.reference = other.reference;
        }
        result.array_elements.extend(other.array_elements.iter().cloned());
        result
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        if self.is_volatile {
            write!(f, "volatile ")?;
        }
        write!(f, "{}", self.instantiation_name())?;

        if self.function_pointer {
            write!(f, " (*)(")?;
            for (index, argument) in self.arguments.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{argument}")?;
            }
            write!(f, ")")?;
        }

        for _ in 0..self.indirections {
            write!(f, "*")?;
        }
        match self.reference {
            ReferenceType::NoReference => {}
            ReferenceType::LValueReference => write!(f, "&")?,
            ReferenceType::RValueReference => write!(f, "&&")?,
        }
        for element in &self.array_elements {
            write!(f, "[{element}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_void() {
        assert!(TypeInfo::parse("void").unwrap().is_void());
        assert!(!TypeInfo::parse("void*").unwrap().is_void());
        assert!(!TypeInfo::parse("QVoid").unwrap().is_void());
    }

    #[test]
    fn test_combine_typedef() {
        let target = TypeInfo::parse("Foo*").unwrap();
        let usage = TypeInfo::parse("const FooPtr&").unwrap();
        let combined = target.combine(&usage);
        assert_eq!(combined.to_string(), "const Foo*&");
    }

    #[test]
    fn test_instantiation_name() {
        let info = TypeInfo::parse("const QMap<QString, QList<int>>*").unwrap();
        assert_eq!(info.instantiation_name(), "QMap<QString, QList<int>>");
        assert_eq!(info.local_name(), "QMap");
    }

    #[test]
    fn test_from_name() {
        let info = TypeInfo::from_name("Gui::Color");
        assert_eq!(info.qualified_name, vec!["Gui", "Color"]);
        assert_eq!(info.to_string(), "Gui::Color");
    }
}
