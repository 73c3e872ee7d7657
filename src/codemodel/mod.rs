//! Parsed C++ translation unit consumed by the builder.
//!
//! The code model is the output of an external C++ front end. It is a plain tree of scopes
//! (the global namespace, nested namespaces and classes) where each scope holds its classes,
//! enums, typedefs, functions and variables in declaration order. Types are carried as
//! [`TypeInfo`] values, a structured form of a C++ type expression.
//!
//! Nothing in this module knows about the rule database; it only describes what was written
//! in the headers. The items provide fluent constructors so models can be assembled by hand,
//! which is how the unit tests and benchmarks drive the builder.
//!
//! # Key Components
//!
//! - [`CodeModel`] - Root of one translation unit
//! - [`NamespaceModel`] / [`ClassModel`] - Nested scopes sharing a [`ScopeModel`] body
//! - [`FunctionModel`], [`ArgumentModel`] - Callables and their parameters
//! - [`EnumModel`], [`EnumeratorModel`] - Enumerations
//! - [`TypeDefModel`], [`VariableModel`] - Aliases and data members
//! - [`TypeInfo`] - Structured C++ type expression with a small parser
//!
//! # Examples
//!
//! ```rust
//! use cppmeta::codemodel::{Access, ClassModel, CodeModel, FunctionModel, NamespaceModel};
//!
//! let mut model = CodeModel::new("widgets.h");
//! model.global_mut().add_namespace(
//!     NamespaceModel::new("Gui").with_class(
//!         ClassModel::new("Button")
//!             .with_base("Widget", Access::Public)
//!             .with_function(FunctionModel::new("click", "void")?),
//!     ),
//! );
//!
//! assert!(model.find_class(&["Gui", "Button"]).is_some());
//! # Ok::<(), cppmeta::Error>(())
//! ```

mod items;
mod parser;
mod typeinfo;

pub use items::{
    ArgumentModel, BaseSpecifier, ClassModel, CodeModel, EnumModel, EnumeratorModel,
    FunctionModel, FunctionModifiers, NamespaceModel, ScopeModel, TypeDefModel, VariableModel,
};
pub use parser::normalize_signature;
pub use typeinfo::TypeInfo;

pub(crate) use items::strip_template_arguments;
pub(crate) use parser::{parse_declaration, parse_signature, ParsedArgument, ParsedSignature};

use strum::{Display, EnumString};

/// Access policy of a declaration as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum Access {
    /// `public:`
    #[default]
    Public,
    /// `protected:`
    Protected,
    /// `private:`
    Private,
}

/// Reference qualifier of a type expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferenceType {
    /// Plain value or pointer
    #[default]
    NoReference,
    /// `T&`
    LValueReference,
    /// `T&&`
    RValueReference,
}

/// Flavor of an enum declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumKind {
    /// `enum Foo { ... }`
    #[default]
    CEnum,
    /// `enum { ... }`
    AnonymousEnum,
    /// `enum class Foo { ... }`
    EnumClass,
}

/// Exception specification of a function declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExceptionSpecification {
    /// Nothing written
    #[default]
    Unknown,
    /// `noexcept` or `throw()`
    NoExcept,
    /// `noexcept(false)` or a non-empty `throw(...)`
    Throws,
}

/// Kind of a function as classified by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum FunctionType {
    /// Any ordinary function or method
    #[default]
    Normal,
    /// A constructor
    Constructor,
    /// A constructor taking `const T&`
    CopyConstructor,
    /// A constructor taking `T&&`
    MoveConstructor,
    /// A destructor
    Destructor,
    /// A Qt signal
    Signal,
    /// A Qt slot
    Slot,
}
