use std::fmt;

use crate::{
    codemodel::{parse_declaration, TypeInfo},
    meta::{MetaFunction, MetaType},
    typesystem::PropertyDeclaration,
    Result,
};

/// Property text as written, before the type is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyText {
    /// Property name
    pub name: String,
    /// Declared type
    pub type_info: TypeInfo,
    /// Getter name
    pub read: String,
    /// Setter name
    pub write: Option<String>,
    /// Resetter name
    pub reset: Option<String>,
    /// `DESIGNABLE` expression
    pub designable: Option<String>,
}

impl PropertyText {
    /// Parse the body of a `Q_PROPERTY` declaration: `Type name READ getter [WRITE setter]
    /// [RESET resetter] [DESIGNABLE expr] ...`. Unknown keywords are skipped with their value.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the type or the `READ` clause is missing.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let Some(keyword_start) = tokens.iter().position(|token| is_keyword(token)) else {
            return Err(malformed_error!("Property '{}' has no READ clause", text));
        };
        if keyword_start < 2 {
            return Err(malformed_error!("Property '{}' lacks a type or name", text));
        }

        let (type_info, name) = parse_declaration(&tokens[..keyword_start].join(" "))?;
        let Some(name) = name else {
            return Err(malformed_error!("Property '{}' lacks a name", text));
        };

        let mut read = None;
        let mut write = None;
        let mut reset = None;
        let mut designable = None;
        let mut position = keyword_start;
        while position < tokens.len() {
            let value = tokens.get(position + 1).map(|v| (*v).to_string());
            match tokens[position] {
                "READ" => read = value,
                "WRITE" => write = value,
                "RESET" => reset = value,
                "DESIGNABLE" => designable = value,
                _ => {}
            }
            position += 2;
        }

        let Some(read) = read else {
            return Err(malformed_error!("Property '{}' has no READ clause", text));
        };

        Ok(PropertyText {
            name,
            type_info,
            read,
            write,
            reset,
            designable,
        })
    }

    /// Convert a rule database declaration.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the declared type does not parse.
    pub fn from_declaration(declaration: &PropertyDeclaration) -> Result<Self> {
        Ok(PropertyText {
            name: declaration.name.clone(),
            type_info: TypeInfo::parse(&declaration.type_name)?,
            read: declaration.read.clone(),
            write: declaration.write.clone(),
            reset: declaration.reset.clone(),
            designable: declaration.designable.clone(),
        })
    }
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "READ"
            | "WRITE"
            | "RESET"
            | "NOTIFY"
            | "DESIGNABLE"
            | "SCRIPTABLE"
            | "STORED"
            | "USER"
            | "CONSTANT"
            | "FINAL"
            | "MEMBER"
            | "REVISION"
    )
}

/// The role a function plays for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyRole {
    /// Getter
    Reader,
    /// Setter
    Writer,
    /// Resetter
    Resetter,
}

/// A resolved property. Accessor functions link to the same `Arc<PropertySpec>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    /// Property name
    pub name: String,
    /// Resolved type
    pub property_type: MetaType,
    /// Getter name
    pub read: String,
    /// Setter name
    pub write: Option<String>,
    /// Resetter name
    pub reset: Option<String>,
    /// `DESIGNABLE` expression
    pub designable: Option<String>,
    /// Position in the class
    pub index: usize,
}

impl PropertySpec {
    /// Create a resolved property from parsed text.
    #[must_use]
    pub fn new(text: PropertyText, property_type: MetaType, index: usize) -> Self {
        PropertySpec {
            name: text.name,
            property_type,
            read: text.read,
            write: text.write,
            reset: text.reset,
            designable: text.designable,
            index,
        }
    }

    fn same_type(&self, other: &MetaType) -> bool {
        let ours = self.property_type.type_entry();
        let theirs = other.type_entry();
        ours.name() == theirs.name()
            && ours.kind() == theirs.kind()
            && self.property_type.indirections == other.indirections
    }

    /// The role `function` can take for this property, if any.
    ///
    /// A reader returns exactly the property type and takes no arguments; a writer returns
    /// nothing and takes one argument of the property type; a resetter returns nothing and takes
    /// no arguments.
    #[must_use]
    pub fn role_for(&self, function: &MetaFunction) -> Option<PropertyRole> {
        if function.name == self.read
            && function.arguments.is_empty()
            && function
                .return_type
                .as_ref()
                .is_some_and(|ty| self.same_type(ty))
        {
            return Some(PropertyRole::Reader);
        }
        if function.return_type.is_some() {
            return None;
        }
        if self.write.as_deref() == Some(function.name.as_str())
            && function.arguments.len() == 1
            && self.same_type(&function.arguments[0].argument_type)
        {
            return Some(PropertyRole::Writer);
        }
        if self.reset.as_deref() == Some(function.name.as_str()) && function.arguments.is_empty() {
            return Some(PropertyRole::Resetter);
        }
        None
    }
}

impl fmt::Display for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} READ {}", self.property_type, self.name, self.read)?;
        if let Some(write) = &self.write {
            write!(f, " WRITE {write}")?;
        }
        if let Some(reset) = &self.reset {
            write!(f, " RESET {reset}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        meta::{FunctionKind, MetaArgument},
        typesystem::TypeEntry,
    };
    use std::sync::Arc;

    fn int_type() -> MetaType {
        MetaType::new(Arc::new(TypeEntry::primitive("int")))
    }

    fn spec() -> PropertySpec {
        let text = PropertyText::parse("int value READ value WRITE setValue RESET resetValue NOTIFY valueChanged").unwrap();
        PropertySpec::new(text, int_type(), 0)
    }

    #[test]
    fn test_parse() {
        let text = PropertyText::parse("QList<int> items READ items DESIGNABLE false").unwrap();
        assert_eq!(text.name, "items");
        assert_eq!(text.type_info.to_string(), "QList<int>");
        assert_eq!(text.designable.as_deref(), Some("false"));
        assert!(text.write.is_none());

        assert!(PropertyText::parse("int value").is_err());
        assert!(PropertyText::parse("value READ value").is_err());
    }

    #[test]
    fn test_roles() {
        let spec = spec();

        let mut getter = MetaFunction::new("value", FunctionKind::Normal);
        getter.return_type = Some(int_type());
        assert_eq!(spec.role_for(&getter), Some(PropertyRole::Reader));

        let mut setter = MetaFunction::new("setValue", FunctionKind::Normal);
        setter.arguments.push(MetaArgument::new("v", int_type(), 0));
        assert_eq!(spec.role_for(&setter), Some(PropertyRole::Writer));

        let resetter = MetaFunction::new("resetValue", FunctionKind::Normal);
        assert_eq!(spec.role_for(&resetter), Some(PropertyRole::Resetter));

        let mut wrong = MetaFunction::new("value", FunctionKind::Normal);
        wrong.arguments.push(MetaArgument::new("v", int_type(), 0));
        wrong.return_type = Some(int_type());
        assert_eq!(spec.role_for(&wrong), None);
    }
}
