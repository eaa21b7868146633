//! Host functions callable from templates.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};

/// A function provided by the embedding application.
///
/// Arguments arrive in call order; the returned value is written into the
/// template output (or used in further expressions).
pub trait HostFunction: Send + Sync {
    fn call(&self, args: &[Value]) -> anyhow::Result<Value>;
}

impl<F> HostFunction for F
where
    F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        self(args)
    }
}

/// Name to host function mapping.
///
/// Populated while building an [`crate::engine::Engine`] and read-only once the
/// engine exists.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Arc<dyn HostFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` under `name`, replacing any earlier registration.
    pub fn register<S, F>(&mut self, name: S, function: F) -> &mut Self
    where
        S: Into<String>,
        F: HostFunction + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Calls the function registered under `name`.
    ///
    /// # Errors
    /// * `Error::EngineError` if nothing is registered under `name`
    /// * `Error::FunctionError` if the function itself fails
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| Error::unknown_function(name))?;

        function.call(args).map_err(|source| Error::FunctionError {
            name: name.to_string(),
            source,
        })
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.functions.keys()).finish()
    }
}
