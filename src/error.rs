use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into two groups. Recoverable errors ([`Error::UnresolvedType`],
/// [`Error::Malformed`]) are produced by the lower layers and are consumed by the builder,
/// which drops the offending entity, records a rejection and keeps going. Fatal errors
/// ([`Error::TypeNotFound`], [`Error::AddedFunction`], [`Error::CyclicDependency`]) abort
/// [`crate::MetaBuilder::build`] because they point at a broken rule database.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - Unparsable type expression or function signature
///
/// ## Type System Errors
/// - [`Error::UnresolvedType`] - A type expression could not be resolved (recoverable)
/// - [`Error::TypeNotFound`] - A rule-database type is missing from the registry (fatal)
/// - [`Error::AddedFunction`] - A synthetic function could not be translated (fatal)
/// - [`Error::InvalidInstantiation`] - Template arguments on a non-template type
/// - [`Error::TypeError`] - General type system operation error
///
/// ## Analysis Errors
/// - [`Error::RecursionLimit`] - Maximum scope or template depth exceeded
/// - [`Error::CyclicDependency`] - The class graph contains a cycle (fatal)
/// - [`Error::GraphError`] - Dependency graph inconsistency
///
/// # Examples
///
/// ```rust,no_run
/// use cppmeta::{CodeModel, Error, MetaBuilder, TypeDatabase};
/// use std::sync::Arc;
///
/// let builder = MetaBuilder::new(Arc::new(TypeDatabase::new()));
/// match builder.build(&CodeModel::new("module.h")) {
///     Ok(model) => println!("{} classes", model.classes().len()),
///     Err(Error::TypeNotFound { name, candidates }) => {
///         eprintln!("missing '{}', did you mean one of {:?}?", name, candidates);
///     }
///     Err(Error::CyclicDependency(cycle)) => eprintln!("cycle: {}", cycle),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A type expression or signature could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A source type expression could not be resolved against the type database.
    ///
    /// Always recoverable: the caller drops the entity that referenced the type.
    #[error("Unable to translate type \"{type_name}\": {reason}")]
    UnresolvedType {
        /// The type expression as written in the source
        type_name: String,
        /// Human readable explanation
        reason: String,
    },

    /// A type named by the rule database does not exist in the type database.
    ///
    /// This is a configuration error. `candidates` lists every registered entry whose
    /// qualified name ends with `::name`, so the author can add the missing qualifier.
    #[error("Type '{name}' wasn't found in the type database.{}", format_candidates(.candidates))]
    TypeNotFound {
        /// The unqualified or partially qualified name that failed
        name: String,
        /// Fully qualified entries that end with the requested name
        candidates: Vec<String>,
    },

    /// A function declared only in the rule database could not be translated.
    #[error("Unable to traverse function \"{function}\" added to \"{scope}\": {source}")]
    AddedFunction {
        /// Name of the synthetic function
        function: String,
        /// Owning class, or `<global>` for module level functions
        scope: String,
        /// The underlying failure
        source: Box<Error>,
    },

    /// Template instantiation arguments were attached to a type that cannot take them.
    #[error("Instantiations are not allowed on '{0}'")]
    InvalidInstantiation(String),

    /// General error during type system operations.
    #[error("{0}")]
    TypeError(String),

    /// Reached the maximum depth allowed while walking scopes or substituting templates.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// The class dependency graph contains a cycle; no ordering can be produced.
    #[error("Cyclic dependency found: {0}")]
    CyclicDependency(String),

    /// Dependency graph error.
    #[error("{0}")]
    GraphError(String),
}

fn format_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        return "\nDeclare it in the type system using the proper <*-type> tag.".to_string();
    }

    let mut message = String::from(
        "\nRemember to inform the full qualified name for the type you want to use.\nCandidates are:",
    );
    for candidate in candidates {
        message.push_str("\n    ");
        message.push_str(candidate);
    }
    message
}
