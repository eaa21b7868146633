//! Error handling for plinth.
//! Defines the error kinds surfaced by template resolution and rendering.

use std::io;
use thiserror::Error;

/// Custom error types for plinth operations.
///
/// Errors raised while a template executes propagate through the whole
/// inheritance chain unchanged, so a caller of [`crate::engine::Engine::render`]
/// sees the same variant that the innermost template produced.
#[derive(Error, Debug)]
pub enum Error {
    /// The identifier does not follow the `namespace::path` convention.
    #[error("Invalid template name '{name}': templates must follow the namespace::template convention.")]
    InvalidTemplateName { name: String },

    /// The namespace is not registered or no template file exists at the resolved path.
    #[error("Template not found: {reason}.")]
    TemplateNotFound { reason: String },

    /// A rendering protocol violation: double parent, undefined block,
    /// unknown function or cyclic inheritance.
    #[error("Engine error: {0}.")]
    EngineError(String),

    /// A registered host function returned an error.
    #[error("Function '{name}' failed: {source}.")]
    FunctionError {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// Template syntax or evaluation failure reported by MiniJinja.
    #[error("Template rendering error: {0}.")]
    MinijinjaError(#[source] minijinja::Error),

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Parameter payloads that are not valid JSON.
    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),
}

impl Error {
    pub(crate) fn engine<S: Into<String>>(message: S) -> Self {
        Error::EngineError(message.into())
    }

    pub(crate) fn unknown_function(name: &str) -> Self {
        Error::engine(format!("The {name} function does not exist or is not callable"))
    }

    pub(crate) fn not_found<S: Into<String>>(reason: S) -> Self {
        Error::TemplateNotFound {
            reason: reason.into(),
        }
    }
}

impl From<minijinja::Error> for Error {
    /// Calls to names nothing was registered under are reported the same way
    /// as `call_registered` with an unknown name.
    fn from(err: minijinja::Error) -> Self {
        let unknown = match err.kind() {
            minijinja::ErrorKind::UnknownFunction => err
                .detail()
                .and_then(|detail| detail.strip_suffix(" is unknown"))
                .map(str::to_string),
            _ => None,
        };
        match unknown {
            Some(name) => Error::unknown_function(&name),
            None => Error::MinijinjaError(err),
        }
    }
}

/// Convenience type alias for Results with plinth's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
