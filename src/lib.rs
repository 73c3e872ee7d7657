// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # cppmeta
//!
//! Builds a resolved, binding-ready meta model from a parsed C++ code model and a declarative
//! type-system rule database.
//!
//! A binding generator needs more than a syntax tree. It needs every type resolved against
//! the set of types it knows how to wrap, every class linked to its bases, template
//! instantiations expanded, rejected declarations dropped with a reason, and classes in an
//! order where dependencies come first. `cppmeta` performs that step.
//!
//! ## Features
//!
//! - **Type resolution** - Context-sensitive lookup through enclosing scopes, typedefs and
//!   template instantiations, with containers, smart pointers, flags and arrays
//! - **Rule driven filtering** - Rejections, renames, removals, access changes and argument
//!   rewrites taken from the [`TypeDatabase`]
//! - **Inheritance** - Primary bases, interfaces and member substitution for classes derived
//!   from template instantiations
//! - **Synthesis** - Implicit constructors, added functions, hash and string capabilities,
//!   clonability and external conversion operators
//! - **Ordering** - Topological class order with cycle detection
//! - **Diagnostics** - A categorized [`RejectionLog`](builder::RejectionLog) and structured
//!   `tracing` events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cppmeta::prelude::*;
//! use std::sync::Arc;
//!
//! let database = TypeDatabase::new();
//! database.add_type(TypeEntry::primitive("int"));
//! database.add_type(TypeEntry::value("Point"));
//!
//! let mut code_model = CodeModel::new("point.h");
//! code_model.global_mut().add_class(
//!     ClassModel::new("Point").with_function(FunctionModel::new("x", "int")?),
//! );
//!
//! let model = MetaBuilder::new(Arc::new(database)).build(&code_model)?;
//! let point = model.find_class("Point").expect("Point is declared");
//! println!("{} has {} functions", point.name(), point.functions().len());
//! # Ok::<(), cppmeta::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Problems with individual declarations are not errors: the declaration is dropped and
//! recorded in [`MetaModel::rejections`]. [`MetaBuilder::build`] only fails when the rule
//! database itself is inconsistent, see [`Error`].

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use cppmeta::prelude::*;
/// use std::sync::Arc;
///
/// let builder = MetaBuilder::with_config(Arc::new(TypeDatabase::new()), BuilderConfig::strict());
/// let model = builder.build(&CodeModel::new("empty.h"))?;
/// assert!(model.classes().is_empty());
/// # Ok::<(), cppmeta::Error>(())
/// ```
pub mod prelude;

/// The parsed C++ input: scopes, classes, functions, enums and type expressions.
///
/// The code model is produced by a C++ front end and handed to the builder read-only. Type
/// expressions are kept as [`codemodel::TypeInfo`] values, parsed from their C++ spelling.
pub mod codemodel;

/// The rule database describing which types are wrapped and how.
///
/// # Key Types
///
/// - [`typesystem::TypeDatabase`] - Registry of entries, rejections and global rules
/// - [`typesystem::TypeEntry`] - One known type with its kind and class level rules
/// - [`typesystem::FunctionModification`] - Per signature rewrite of a function
/// - [`typesystem::AddedFunction`] - A function declared only in the rules
pub mod typesystem;

/// The output: resolved classes, functions, enums and types.
pub mod meta;

/// The builder turning a code model and a rule database into a [`MetaModel`].
///
/// The build runs in passes: declarations, members, inheritance, synthesized members,
/// ordering and policies. See [`MetaBuilder::build`].
pub mod builder;

pub use builder::{BuilderConfig, MetaBuilder};
pub use codemodel::CodeModel;
pub use error::Error;
pub use meta::MetaModel;
pub use typesystem::TypeDatabase;

/// The generic Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
