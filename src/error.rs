//! Error types for the generator.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while loading definitions or generating code.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Invalid or incomplete configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to read or write a file
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The definition document could not be parsed
    #[error("Failed to parse '{origin}' at {path}: {message}")]
    Parse {
        origin: String,
        path: String,
        message: String,
    },

    /// A `$ref` names a definition that does not exist
    #[error("Unknown schema reference '{0}'")]
    UnknownReference(String),

    /// A chain of `$ref`-only definitions loops back on itself
    #[error("Schema definition '{0}' is an alias of itself")]
    AliasCycle(String),

    /// The requested router is not exported by the document
    #[error("Could not find router '{name}' (available: {available})")]
    UnknownRouter { name: String, available: String },

    /// A procedure path is also used as a namespace path
    #[error("Procedure path '{0}' is used both as a procedure and as a namespace")]
    PathConflict(String),

    /// A schema variant with no compiler case
    #[error("Unsupported schema type: {0}")]
    UnsupportedSchema(String),

    /// A procedure declares more than one input schema
    #[error("Multiple inputs not supported.")]
    MultipleInputs,

    /// Two different schema nodes resolved to the same type name in one scope
    #[error("Type name '{0}' is already used by a different definition")]
    NameCollision(String),

    /// Wrappers nest deeper than the compiler allows
    #[error("Schema nesting exceeds the depth limit of {0}")]
    RecursionLimit(usize),
}

impl GeneratorError {
    /// Errors that abort the whole run when they reach a procedure's top level.
    pub fn is_fatal_in_procedure(&self) -> bool {
        matches!(
            self,
            GeneratorError::UnsupportedSchema(_) | GeneratorError::RecursionLimit(_)
        )
    }
}

/// A recoverable error: the named field or procedure was left out of the output.
#[derive(Debug)]
pub struct Diagnostic {
    pub location: String,
    pub error: GeneratorError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

pub type Result<T, E = GeneratorError> = std::result::Result<T, E>;
