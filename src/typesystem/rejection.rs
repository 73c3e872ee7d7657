use std::fmt;

use regex::Regex;
use strum::Display;

use crate::Result;

/// What a [`TypeRejection`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RejectionMatch {
    /// Whole classes by name
    ExcludeClass,
    /// Functions by name
    Function,
    /// Fields by name
    Field,
    /// Enums by name
    Enum,
    /// Functions taking an argument of a type
    ArgumentType,
    /// Functions returning a type
    ReturnType,
}

/// An exclusion rule. `class_name` and `pattern` are anchored regular expressions.
///
/// Patterns already written as `^...$` are used verbatim, `*` matches anything and any other
/// text is matched literally.
///
/// ```rust
/// use cppmeta::typesystem::{RejectionMatch, TypeRejection};
///
/// let rule = TypeRejection::new(RejectionMatch::Function, "*", "metaObject")?;
/// assert!(rule.matches(RejectionMatch::Function, "QWidget", "metaObject"));
/// assert!(!rule.matches(RejectionMatch::Function, "QWidget", "metaObjectx"));
/// # Ok::<(), cppmeta::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TypeRejection {
    /// Class name expression
    pub class_name: Regex,
    /// Entity name expression; unused for [`RejectionMatch::ExcludeClass`]
    pub pattern: Option<Regex>,
    /// What the rule applies to
    pub match_type: RejectionMatch,
}

fn anchored(text: &str) -> Result<Regex> {
    let pattern = if text.starts_with('^') && text.ends_with('$') {
        text.to_string()
    } else if text == "*" {
        "^.*$".to_string()
    } else {
        format!("^{}$", regex::escape(text))
    };
    Regex::new(&pattern)
        .map_err(|error| malformed_error!("Invalid rejection pattern '{}': {}", text, error))
}

impl TypeRejection {
    /// Create a rule.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if an expression does not compile.
    pub fn new(match_type: RejectionMatch, class_name: &str, pattern: &str) -> Result<Self> {
        let pattern = if match_type == RejectionMatch::ExcludeClass {
            None
        } else {
            Some(anchored(pattern)?)
        };
        Ok(TypeRejection {
            class_name: anchored(class_name)?,
            pattern,
            match_type,
        })
    }

    /// Create a rule excluding whole classes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the expression does not compile.
    pub fn exclude_class(class_name: &str) -> Result<Self> {
        TypeRejection::new(RejectionMatch::ExcludeClass, class_name, "")
    }

    /// Returns true if the rule rejects `name` of kind `match_type` inside `class_name`.
    #[must_use]
    pub fn matches(&self, match_type: RejectionMatch, class_name: &str, name: &str) -> bool {
        if self.match_type != match_type || !self.class_name.is_match(class_name) {
            return false;
        }
        self.pattern.as_ref().map_or(true, |pattern| pattern.is_match(name))
    }
}

impl fmt::Display for TypeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} class=\"{}\"", self.match_type, self.class_name.as_str())?;
        if let Some(pattern) = &self.pattern {
            write!(f, " pattern=\"{}\"", pattern.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_patterns_are_escaped() {
        let rule = TypeRejection::new(RejectionMatch::ArgumentType, "*", "QList<int>*").unwrap();
        assert!(rule.matches(RejectionMatch::ArgumentType, "Any", "QList<int>*"));
        assert!(!rule.matches(RejectionMatch::ArgumentType, "Any", "QList<int>"));
        assert!(!rule.matches(RejectionMatch::ReturnType, "Any", "QList<int>*"));
    }

    #[test]
    fn test_regular_expression_patterns() {
        let rule = TypeRejection::new(RejectionMatch::Field, "^Q.*$", "^d_.*$").unwrap();
        assert!(rule.matches(RejectionMatch::Field, "QWidget", "d_ptr"));
        assert!(!rule.matches(RejectionMatch::Field, "Widget", "d_ptr"));
    }

    #[test]
    fn test_exclude_class() {
        let rule = TypeRejection::exclude_class("QPrivate").unwrap();
        assert!(rule.matches(RejectionMatch::ExcludeClass, "QPrivate", ""));
        assert!(!rule.matches(RejectionMatch::ExcludeClass, "QPublic", ""));
        assert!(rule.to_string().starts_with("ExcludeClass"));
    }
}
