//! Common constants used throughout plinth.

/// Separator between the namespace and the relative path of a template identifier
pub const NAMESPACE_SEPARATOR: &str = "::";

/// File extension appended to resolved template paths unless configured otherwise
pub const DEFAULT_EXTENSION: &str = "tmpl";

/// Supported configuration file names, in lookup order
pub const CONFIG_FILES: [&str; 3] = ["plinth.json", "plinth.yml", "plinth.yaml"];

/// Template functions provided by the engine itself.
/// Host functions registered under these names are only reachable via `call_registered`.
pub const BUILTIN_FUNCTIONS: [&str; 5] = ["parent", "block", "insert", "escape", "call_registered"];
