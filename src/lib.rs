//! plinth resolves namespaced template identifiers to files on disk and
//! renders them with single-chain inheritance: a child template may name one
//! parent and define the blocks that parent emits.

/// Command-line interface module for the plinth binary
pub mod cli;

/// Engine configuration files
/// Supports JSON and YAML formats (plinth.json, plinth.yml, plinth.yaml)
pub mod config;

pub mod constants;

/// Render contexts, render results and the inheritance protocol
pub mod context;

/// The engine façade
pub mod engine;

/// Error types and handling for plinth
pub mod error;

/// HTML escaping
pub mod escape;

/// Host functions callable from templates
pub mod functions;

pub mod logger;

/// Template parameter loading for the command line
pub mod parser;

/// Template body execution (MiniJinja)
pub mod renderer;

/// Namespace-to-path resolution
pub mod resolver;

pub use context::{Blocks, Params, RenderContext, RenderResult};
pub use engine::{Engine, EngineBuilder, TemplateEngine};
pub use error::{Error, Result};
