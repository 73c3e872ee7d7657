use std::fmt;

use bitflags::bitflags;
use regex::Regex;
use strum::{Display, EnumString};

use crate::{codemodel::normalize_signature, Result};

/// Access level forced by a modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AccessModification {
    /// Make the function private
    Private = 1,
    /// Make the function protected
    Protected = 2,
    /// Make the function public
    Public = 3,
    /// Package visibility in the target language
    Friendly = 4,
}

bitflags! {
    /// Boolean edits carried by a modification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModificationFlags: u32 {
        /// Force `final` in the target language
        const FINAL = 0x0010;
        /// Force non-final in the target language
        const NON_FINAL = 0x0020;
        /// Field may be read
        const READABLE = 0x0100;
        /// Field may be written
        const WRITABLE = 0x0200;
        /// Rename the entity
        const RENAME = 0x2000;
        /// Mark the entity deprecated
        const DEPRECATED = 0x4000;
        /// Remove the entity from the model
        const REMOVE = 0x8000;
    }
}

/// Exception handling policy for a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum ExceptionHandling {
    /// Not specified at this level
    #[default]
    Unspecified,
    /// Never catch
    Off,
    /// Catch only for functions declared to throw
    AutoDefaultToOff,
    /// Catch unless declared `noexcept`
    AutoDefaultToOn,
    /// Always catch
    On,
}

/// Whether a wrapper releases the interpreter lock around the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum AllowThread {
    /// Not specified at this level
    #[default]
    Unspecified,
    /// Release the lock
    Allow,
    /// Keep the lock
    Disallow,
    /// Decide from the function
    Auto,
}

/// Ownership transfer of an argument or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Ownership {
    /// The target language owns the object
    TargetLangOwnership,
    /// C++ owns the object
    CppOwnership,
    /// Default ownership rules
    DefaultOwnership,
}

/// Edits for one argument of a function. Index 0 is the return value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentModification {
    /// 0 for the return value, 1-based for arguments
    pub index: usize,
    /// Replace the default expression
    pub replaced_default_expression: Option<String>,
    /// Drop the default expression
    pub remove_default_expression: bool,
    /// Remove the argument from the target signature
    pub removed: bool,
    /// Treat a `T*` argument as an array
    pub array: bool,
    /// New argument name
    pub renamed_to: Option<String>,
    /// Replacement type as written
    pub modified_type: Option<String>,
    /// Ownership transfer
    pub ownership: Option<Ownership>,
}

impl ArgumentModification {
    /// Create an empty modification for argument `index`.
    #[must_use]
    pub fn new(index: usize) -> Self {
        ArgumentModification {
            index,
            ..Default::default()
        }
    }

    /// Replace the default expression.
    #[must_use]
    pub fn replace_default(mut self, expression: &str) -> Self {
        self.replaced_default_expression = Some(expression.to_string());
        self
    }

    /// Drop the default expression.
    #[must_use]
    pub fn remove_default(mut self) -> Self {
        self.remove_default_expression = true;
        self
    }

    /// Rename the argument.
    #[must_use]
    pub fn rename(mut self, name: &str) -> Self {
        self.renamed_to = Some(name.to_string());
        self
    }

    /// Treat the argument as an array.
    #[must_use]
    pub fn as_array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Remove the argument.
    #[must_use]
    pub fn remove(mut self) -> Self {
        self.removed = true;
        self
    }

    /// Set the ownership transfer.
    #[must_use]
    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = Some(ownership);
        self
    }
}

/// Edits applied to every function whose minimal signature matches.
///
/// The signature is matched exactly after whitespace normalization, or through a regular
/// expression when one was given.
///
/// # Examples
///
/// ```rust
/// use cppmeta::typesystem::{AccessModification, FunctionModification};
///
/// let modification = FunctionModification::new("setValue(int)")
///     .rename("setIntValue")
///     .with_access(AccessModification::Protected);
/// assert!(modification.matches("setValue( int )"));
/// assert!(modification.is_renamed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FunctionModification {
    signature: String,
    pattern: Option<Regex>,
    /// Target name when renamed
    pub renamed_to: Option<String>,
    /// Forced access level
    pub access: Option<AccessModification>,
    /// Boolean edits
    pub flags: ModificationFlags,
    /// Exception handling policy
    pub exception_handling: ExceptionHandling,
    /// Interpreter lock policy
    pub allow_thread: AllowThread,
    /// Argument level edits
    pub argument_modifications: Vec<ArgumentModification>,
}

impl FunctionModification {
    /// Create a modification for an exact signature such as `foo(int,const QString&)`.
    #[must_use]
    pub fn new(signature: &str) -> Self {
        FunctionModification {
            signature: normalize_signature(signature),
            ..Default::default()
        }
    }

    /// Create a modification matching signatures by regular expression.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the expression does not compile.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|error| malformed_error!("Invalid signature pattern '{}': {}", pattern, error))?;
        Ok(FunctionModification {
            signature: pattern.to_string(),
            pattern: Some(regex),
            ..Default::default()
        })
    }

    /// The same edits bound to another signature.
    #[must_use]
    pub fn for_signature(&self, signature: &str) -> Self {
        FunctionModification {
            signature: normalize_signature(signature),
            pattern: None,
            ..self.clone()
        }
    }

    /// Rename the function.
    #[must_use]
    pub fn rename(mut self, name: &str) -> Self {
        self.renamed_to = Some(name.to_string());
        self.flags |= ModificationFlags::RENAME;
        self
    }

    /// Force an access level.
    #[must_use]
    pub fn with_access(mut self, access: AccessModification) -> Self {
        self.access = Some(access);
        self
    }

    /// Add boolean edits.
    #[must_use]
    pub fn with_flags(mut self, flags: ModificationFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Remove the function from the model.
    #[must_use]
    pub fn remove(self) -> Self {
        self.with_flags(ModificationFlags::REMOVE)
    }

    /// Set the exception handling policy.
    #[must_use]
    pub fn with_exception_handling(mut self, policy: ExceptionHandling) -> Self {
        self.exception_handling = policy;
        self
    }

    /// Set the interpreter lock policy.
    #[must_use]
    pub fn with_allow_thread(mut self, policy: AllowThread) -> Self {
        self.allow_thread = policy;
        self
    }

    /// Append an argument modification.
    #[must_use]
    pub fn with_argument(mut self, modification: ArgumentModification) -> Self {
        self.argument_modifications.push(modification);
        self
    }

    /// The normalized signature or the pattern text.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns true if the modification matches by regular expression.
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Returns true if `signature` is matched by this modification.
    #[must_use]
    pub fn matches(&self, signature: &str) -> bool {
        match &self.pattern {
            Some(regex) => regex.is_match(signature),
            None => self.signature == normalize_signature(signature),
        }
    }

    /// Returns true if the function is renamed.
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        self.flags.contains(ModificationFlags::RENAME) && self.renamed_to.is_some()
    }

    /// Returns true if the function is removed.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.flags.contains(ModificationFlags::REMOVE)
    }

    /// Returns true if the function is forced final.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.flags.contains(ModificationFlags::FINAL)
    }

    /// Returns true if the function is forced non-final.
    #[must_use]
    pub fn is_non_final(&self) -> bool {
        self.flags.contains(ModificationFlags::NON_FINAL)
    }

    /// Returns true if the function is marked deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.flags.contains(ModificationFlags::DEPRECATED)
    }
}

impl fmt::Display for FunctionModification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pattern() {
            write!(f, "FunctionModification(pattern=\"{}\"", self.signature)?;
        } else {
            write!(f, "FunctionModification(signature=\"{}\"", self.signature)?;
        }
        if let Some(name) = &self.renamed_to {
            write!(f, ", renamed_to=\"{name}\"")?;
        }
        if let Some(access) = self.access {
            write!(f, ", access={access}")?;
        }
        if !self.flags.is_empty() {
            write!(f, ", flags={:?}", self.flags)?;
        }
        write!(f, ")")
    }
}

/// Edits applied to a field by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldModification {
    /// Field name
    pub name: String,
    /// Target name when renamed
    pub renamed_to: Option<String>,
    /// Boolean edits
    pub flags: ModificationFlags,
}

impl FieldModification {
    /// Create a modification for a readable and writable field.
    #[must_use]
    pub fn new(name: &str) -> Self {
        FieldModification {
            name: name.to_string(),
            renamed_to: None,
            flags: ModificationFlags::READABLE | ModificationFlags::WRITABLE,
        }
    }

    /// Remove the field from the model.
    #[must_use]
    pub fn remove(mut self) -> Self {
        self.flags |= ModificationFlags::REMOVE;
        self
    }

    /// Rename the field.
    #[must_use]
    pub fn rename(mut self, name: &str) -> Self {
        self.renamed_to = Some(name.to_string());
        self.flags |= ModificationFlags::RENAME;
        self
    }

    /// Returns true if the field is removed.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.flags.contains(ModificationFlags::REMOVE)
    }
}

/// How a documentation modification combines with the extracted documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum DocModificationMode {
    /// Add after
    Append,
    /// Add before
    Prepend,
    /// Replace
    Replace,
}

/// A documentation edit keyed by function signature; an empty signature targets the class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocModification {
    /// Normalized signature
    pub signature: String,
    /// Combination mode
    pub mode: DocModificationMode,
    /// Documentation text
    pub code: String,
}

impl DocModification {
    /// Create a documentation edit.
    #[must_use]
    pub fn new(signature: &str, mode: DocModificationMode, code: &str) -> Self {
        DocModification {
            signature: normalize_signature(signature),
            mode,
            code: code.to_string(),
        }
    }
}

/// A property declared in the rule database rather than through `Q_PROPERTY`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyDeclaration {
    /// Property name
    pub name: String,
    /// Declared type as written
    pub type_name: String,
    /// Getter name
    pub read: String,
    /// Setter name
    pub write: Option<String>,
    /// Resetter name
    pub reset: Option<String>,
    /// `DESIGNABLE` expression
    pub designable: Option<String>,
}

impl PropertyDeclaration {
    /// Create a read-only property.
    #[must_use]
    pub fn new(name: &str, type_name: &str, read: &str) -> Self {
        PropertyDeclaration {
            name: name.to_string(),
            type_name: type_name.to_string(),
            read: read.to_string(),
            ..Default::default()
        }
    }

    /// Set the setter.
    #[must_use]
    pub fn with_write(mut self, write: &str) -> Self {
        self.write = Some(write.to_string());
        self
    }

    /// Set the resetter.
    #[must_use]
    pub fn with_reset(mut self, reset: &str) -> Self {
        self.reset = Some(reset.to_string());
        self
    }
}
