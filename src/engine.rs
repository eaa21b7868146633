//! The engine façade: namespace registry, host functions and file extension,
//! plus the `render` / `exists` / `resolve_path` entry points.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::constants::{BUILTIN_FUNCTIONS, DEFAULT_EXTENSION};
use crate::context::{Blocks, Params, RenderContext, RenderResult};
use crate::error::{Error, Result};
use crate::functions::{FunctionRegistry, HostFunction};
use crate::renderer::{MiniJinjaRenderer, TemplateRenderer};
use crate::resolver::PathResolver;

/// Interface of a template engine.
pub trait TemplateEngine {
    /// Renders a template and returns its final content.
    ///
    /// # Errors
    /// * `Error::InvalidTemplateName` if the identifier is malformed
    /// * `Error::TemplateNotFound` if a template in the chain cannot be located
    /// * `Error::EngineError` if a template breaks the rendering protocol
    fn render(&self, name: &str, params: Params) -> Result<String>;

    /// Checks whether a template exists.
    ///
    /// # Errors
    /// * `Error::InvalidTemplateName` if the identifier is malformed
    fn exists(&self, name: &str) -> Result<bool>;

    /// Converts a template identifier to a file path.
    fn resolve_path(&self, name: &str) -> Result<PathBuf>;

    /// Calls a function registered with the engine.
    fn call_function(&self, name: &str, args: &[Value]) -> Result<Value>;
}

struct Inner {
    resolver: PathResolver,
    functions: FunctionRegistry,
    renderer: Arc<dyn TemplateRenderer>,
}

/// Template engine.
///
/// Cloning is cheap and clones share the same registries, which never change
/// after [`EngineBuilder::build`]. Independent renders may run concurrently.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    /// Creates an engine with the given namespaces, no host functions and the
    /// default extension.
    pub fn new<I, K, V>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::builder().namespaces(namespaces).build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        EngineBuilder::from(config).build()
    }

    /// Renders a template and returns both content and final block map.
    pub fn render_result(&self, name: &str, params: Params) -> Result<RenderResult> {
        debug!("Rendering '{name}'.");
        RenderContext::new(self.clone(), name, params, Blocks::new()).invoke()
    }

    pub fn render(&self, name: &str, params: Params) -> Result<String> {
        self.render_result(name, params).map(|result| result.into_parts().0)
    }

    /// Returns `false` only when the template cannot be located.
    pub fn exists(&self, name: &str) -> Result<bool> {
        match self.resolve_path(name) {
            Ok(_) => Ok(true),
            Err(Error::TemplateNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        self.inner.resolver.resolve(name)
    }

    pub fn call_function(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.inner.functions.call(name, args)
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.inner.functions
    }

    pub(crate) fn renderer(&self) -> &dyn TemplateRenderer {
        self.inner.renderer.as_ref()
    }

    /// Resolves a template and reads its source.
    pub(crate) fn load_source(&self, name: &str) -> Result<String> {
        let path = self.resolve_path(name)?;
        std::fs::read_to_string(&path).map_err(Error::IoError)
    }
}

impl TemplateEngine for Engine {
    fn render(&self, name: &str, params: Params) -> Result<String> {
        Engine::render(self, name, params)
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Engine::exists(self, name)
    }

    fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        Engine::resolve_path(self, name)
    }

    fn call_function(&self, name: &str, args: &[Value]) -> Result<Value> {
        Engine::call_function(self, name, args)
    }
}

/// Collects construction options for an [`Engine`].
pub struct EngineBuilder {
    namespaces: IndexMap<String, String>,
    functions: FunctionRegistry,
    extension: String,
    strict_undefined: bool,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            namespaces: IndexMap::new(),
            functions: FunctionRegistry::new(),
            extension: DEFAULT_EXTENSION.to_string(),
            strict_undefined: false,
            renderer: None,
        }
    }
}

impl EngineBuilder {
    /// Registers a namespace root directory.
    pub fn namespace<K: Into<String>, V: Into<String>>(mut self, name: K, root: V) -> Self {
        self.namespaces.insert(name.into(), root.into());
        self
    }

    pub fn namespaces<I, K, V>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, root) in namespaces {
            self.namespaces.insert(name.into(), root.into());
        }
        self
    }

    /// Registers a host function callable from templates.
    pub fn function<S, F>(mut self, name: S, function: F) -> Self
    where
        S: Into<String>,
        F: HostFunction + 'static,
    {
        let name = name.into();
        if BUILTIN_FUNCTIONS.contains(&name.as_str()) {
            warn!(
                "Function '{name}' shares its name with a built-in; \
                 templates must use call_registered."
            );
        }
        self.functions.register(name, function);
        self
    }

    /// Sets the template file extension, with or without the leading dot.
    pub fn extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension = extension.into();
        self
    }

    /// Makes undefined template variables an error in the default renderer.
    pub fn strict_undefined(mut self, strict: bool) -> Self {
        self.strict_undefined = strict;
        self
    }

    /// Replaces the MiniJinja body renderer.
    pub fn renderer<R: TemplateRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn build(self) -> Engine {
        let renderer: Arc<dyn TemplateRenderer> = match self.renderer {
            Some(renderer) => renderer,
            None if self.strict_undefined => Arc::new(MiniJinjaRenderer::strict()),
            None => Arc::new(MiniJinjaRenderer::new()),
        };

        Engine {
            inner: Arc::new(Inner {
                resolver: PathResolver::new(self.namespaces, self.extension),
                functions: self.functions,
                renderer,
            }),
        }
    }
}

impl From<&EngineConfig> for EngineBuilder {
    fn from(config: &EngineConfig) -> Self {
        Engine::builder()
            .namespaces(config.namespaces.clone())
            .extension(config.extension.clone())
            .strict_undefined(config.strict_undefined)
    }
}
