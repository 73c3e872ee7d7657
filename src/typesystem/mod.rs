//! Declarative rule database consumed by the builder.
//!
//! The rule database (the "type system") tells the builder which C++ entities exist for binding
//! purposes and how they should be exposed. It is normally produced by a separate parser from a
//! textual description; this module only models the result and the queries the builder needs.
//!
//! # Key Components
//!
//! - [`TypeEntry`] - One named type with an immutable [`TypeEntryKind`] and a mutable
//!   [`CodeGeneration`] policy
//! - [`TypeDatabase`] - Insertion-ordered registry of entries with name indices, rejection rules,
//!   global added functions and global defaults
//! - [`FunctionModification`], [`ArgumentModification`], [`FieldModification`] - Per-signature
//!   edits applied to traversed entities
//! - [`AddedFunction`] - Functions that exist only in the rule database
//! - [`TypeRejection`] - Regular-expression based exclusion rules
//!
//! # Thread Safety
//!
//! Entries are shared as [`TypeEntryRc`] (`Arc`). Everything the builder changes after
//! registration (generation policy, include, null value of an enum, base container type,
//! inherited modifications) is stored in atomics, `OnceLock`s or append-only vectors, so a
//! database can be shared between several builds.

mod added;
mod database;
mod entry;
mod modification;
mod rejection;

pub use added::{AddedAccess, AddedArgument, AddedFunction, AddedFunctionRc};
pub use database::TypeDatabase;
pub use entry::{ComplexData, TypeEntry, TypeEntryRc};
pub use modification::{
    AccessModification, AllowThread, ArgumentModification, DocModification, DocModificationMode,
    ExceptionHandling, FieldModification, FunctionModification, ModificationFlags, Ownership,
    PropertyDeclaration,
};
pub use rejection::{RejectionMatch, TypeRejection};

use bitflags::bitflags;
use strum::{Display, EnumIter};

/// Classification of a [`TypeEntry`]. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TypeEntryKind {
    /// Builtin or primitive-mapped type (`int`, `double`, `QString` mapped to a native string)
    Primitive,
    /// `void`
    Void,
    /// `...`
    Varargs,
    /// `QFlags<Enum>` wrapper
    Flags,
    /// An enum
    Enum,
    /// One enumerator, or a synthetic entry for a non-type template argument
    EnumValue,
    /// Placeholder for a template parameter of a container or template class
    TemplateArgument,
    /// Container template (`QList`, `std::vector`)
    Container,
    /// Smart pointer template
    SmartPointer,
    /// A namespace
    Namespace,
    /// Class used by value
    Value,
    /// Class used by pointer, identity matters
    Object,
    /// Class designated as an interface; never a primary base
    Interface,
    /// A global function declared in the rule database
    Function,
    /// An alias declared in the rule database
    Typedef,
    /// Fixed or unbound array of an element entry
    Array,
    /// Anything the binding generator handles with custom code
    Custom,
}

impl TypeEntryKind {
    /// Returns true for class-like kinds that carry modifications and added functions.
    #[must_use]
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            TypeEntryKind::Container
                | TypeEntryKind::SmartPointer
                | TypeEntryKind::Namespace
                | TypeEntryKind::Value
                | TypeEntryKind::Object
                | TypeEntryKind::Interface
                | TypeEntryKind::Typedef
        )
    }

    /// Returns true for kinds that may carry template instantiations.
    #[must_use]
    pub fn accepts_instantiations(self) -> bool {
        matches!(
            self,
            TypeEntryKind::Container
                | TypeEntryKind::SmartPointer
                | TypeEntryKind::Value
                | TypeEntryKind::Object
                | TypeEntryKind::Flags
        )
    }
}

bitflags! {
    /// Code generation policy of an entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CodeGeneration: u32 {
        /// Generate target language wrappers
        const TARGET_LANG = 0x0001;
        /// Generate C++ shell code
        const CPP = 0x0002;
        /// Generate only what subclasses need
        const FOR_SUBCLASS = 0x0004;

        /// Generate nothing
        const NOTHING = 0x0000;
        /// Generate wrappers and shell code
        const CODE = Self::TARGET_LANG.bits() | Self::CPP.bits();
        /// Generate everything
        const ALL = 0xffff;
    }
}

impl Default for CodeGeneration {
    fn default() -> Self {
        CodeGeneration::ALL
    }
}

impl CodeGeneration {
    /// Returns true unless the policy is exactly "for subclass" or "nothing".
    #[must_use]
    pub fn generate_code(self) -> bool {
        self != CodeGeneration::FOR_SUBCLASS && self != CodeGeneration::NOTHING
    }
}
