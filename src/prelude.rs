//! # cppmeta Prelude
//!
//! Re-exports of the types needed to describe an input, run the builder and walk the result.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cppmeta operations
pub use crate::Error;

/// The result type used throughout cppmeta
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

pub use crate::builder::{BuilderConfig, MetaBuilder, RejectReason, RejectionCategory, RejectionLog};

// ================================================================================================
// Input: Code Model
// ================================================================================================

pub use crate::codemodel::{
    Access, ArgumentModel, ClassModel, CodeModel, EnumKind, EnumModel, EnumeratorModel,
    FunctionModel, FunctionModifiers, FunctionType, NamespaceModel, ReferenceType, TypeDefModel,
    TypeInfo, VariableModel,
};

// ================================================================================================
// Input: Rule Database
// ================================================================================================

pub use crate::typesystem::{
    AddedAccess, AddedFunction, AllowThread, ArgumentModification, CodeGeneration,
    ExceptionHandling, FieldModification, FunctionModification, PropertyDeclaration,
    RejectionMatch, TypeDatabase, TypeEntry, TypeEntryKind, TypeEntryRc, TypeRejection,
};

// ================================================================================================
// Output: Meta Model
// ================================================================================================

pub use crate::meta::{
    ClassAttributes, FunctionAttributes, FunctionKind, MetaArgument, MetaClassRc, MetaEnumRc,
    MetaFieldRc, MetaFunctionRc, MetaModel, MetaType, UsagePattern, Visibility,
};
