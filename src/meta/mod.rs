//! The binding-ready meta model produced by the builder.
//!
//! Every exposed C++ entity is represented by a `Meta*` value: [`MetaClass`] for classes,
//! structs and namespaces, [`MetaFunction`] for callables, [`MetaField`] and [`MetaEnum`] for
//! data members and enumerations, and [`MetaType`] for resolved type uses. Entities are created
//! once during traversal, completed in place by the later passes and are read-only once
//! [`crate::MetaBuilder::build`] returns.
//!
//! # Ownership
//!
//! The [`MetaModel`] owns all classes through strong `Arc` references. A class owns its
//! functions, fields, enums and inner classes. Base classes, interfaces, the enclosing class and
//! the declaring class of a function are [`MetaClassRef`] weak references, so the class graph
//! never forms reference cycles.
//!
//! # Key Components
//!
//! - [`MetaType`] - A resolved type use with its [`UsagePattern`]
//! - [`MetaClass`] / [`MetaClassRef`] - Classes and weak links between them
//! - [`MetaFunction`] / [`MetaArgument`] - Callables after normalization
//! - [`MetaField`], [`MetaEnum`], [`MetaEnumValue`] - Data members and enums
//! - [`PropertySpec`] - Properties with their accessor names
//! - [`MetaClassRegistry`] - Insertion-ordered class registry used while building
//! - [`MetaModel`] - The finished, sorted result

mod class;
mod enums;
mod field;
mod function;
mod model;
mod property;
mod registry;
mod types;

pub use class::{ClassAttributes, MetaClass, MetaClassRc, MetaClassRef};
pub use enums::{MetaEnum, MetaEnumRc, MetaEnumValue};
pub use field::{MetaField, MetaFieldRc};
pub use function::{
    FunctionAttributes, FunctionKind, MetaArgument, MetaFunction, MetaFunctionRc, Visibility,
};
pub use model::MetaModel;
pub use property::{PropertyRole, PropertySpec, PropertyText};
pub use registry::MetaClassRegistry;
pub use types::{MetaType, UsagePattern};

pub(crate) use function::is_operator_name;
