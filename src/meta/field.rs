use std::{fmt, sync::Arc};

use crate::meta::{MetaClassRc, MetaClassRef, MetaType, Visibility};

/// A reference-counted pointer to a [`MetaField`]
pub type MetaFieldRc = Arc<MetaField>;

/// A data member of a class.
#[derive(Debug, Clone)]
pub struct MetaField {
    /// Effective name
    pub name: String,
    /// Name as declared
    pub original_name: String,
    /// Resolved type
    pub field_type: MetaType,
    /// Visibility
    pub visibility: Visibility,
    /// Static member
    pub is_static: bool,
    /// Readable from the target language
    pub readable: bool,
    /// Writable from the target language
    pub writable: bool,
    /// Declaring class
    pub enclosing_class: Option<MetaClassRef>,
}

impl MetaField {
    /// Create a public, readable and writable field.
    #[must_use]
    pub fn new(name: &str, field_type: MetaType) -> Self {
        MetaField {
            name: name.to_string(),
            original_name: name.to_string(),
            field_type,
            visibility: Visibility::Public,
            is_static: false,
            readable: true,
            writable: true,
            enclosing_class: None,
        }
    }

    /// The declaring class.
    #[must_use]
    pub fn enclosing_class(&self) -> Option<MetaClassRc> {
        self.enclosing_class.as_ref().and_then(MetaClassRef::upgrade)
    }
}

impl fmt::Display for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(class) = self.enclosing_class() {
            write!(f, "{}::", class.qualified_name())?;
        }
        write!(f, "{} ({})", self.name, self.field_type)
    }
}
