//! Render contexts and the inheritance protocol.
//!
//! A [`RenderContext`] executes exactly one template. While the template body
//! runs it may call back into the context to declare a parent, define or emit
//! blocks, insert other templates and call host functions. Once the body is
//! done the context either returns its own output or, when a parent was
//! declared, hands its blocks to a fresh context for the parent and returns
//! whatever that one produces. The child's own output is dropped in that case,
//! only its blocks survive.
//!
//! Block maps travel by value: each context works on its own copy and passes
//! it forward explicitly (to the parent, or back from an inserted template).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::escape::escape_html;

/// Template parameters, merged down the inheritance chain (later keys win).
pub type Params = IndexMap<String, Value>;

/// Finalized block contents keyed by block name.
pub type Blocks = IndexMap<String, String>;

/// The content and blocks produced by one template execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    content: String,
    blocks: Blocks,
}

impl RenderResult {
    pub fn new(content: String, blocks: Blocks) -> Self {
        Self { content, blocks }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn blocks(&self) -> &Blocks {
        &self.blocks
    }

    pub fn into_parts(self) -> (String, Blocks) {
        (self.content, self.blocks)
    }
}

/// State the template body mutates through the capability calls.
#[derive(Debug, Default)]
struct Frame {
    blocks: Blocks,
    parent: Option<String>,
    parent_params: Params,
}

/// The state of one in-flight template execution.
pub struct RenderContext {
    engine: Engine,
    name: String,
    params: Params,
    /// Children whose parent chain led to this context, outermost first.
    lineage: Vec<String>,
    frame: Mutex<Frame>,
}

impl RenderContext {
    /// Creates a root context for `name`.
    pub fn new<S: Into<String>>(engine: Engine, name: S, params: Params, blocks: Blocks) -> Self {
        Self::spawned(engine, name.into(), params, blocks, Vec::new())
    }

    fn spawned(
        engine: Engine,
        name: String,
        params: Params,
        blocks: Blocks,
        lineage: Vec<String>,
    ) -> Self {
        let frame = Frame {
            blocks,
            parent: None,
            parent_params: params.clone(),
        };
        Self {
            engine,
            name,
            params,
            lineage,
            frame: Mutex::new(frame),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Snapshot of the blocks defined so far.
    pub fn blocks(&self) -> Blocks {
        self.frame().blocks.clone()
    }

    /// The parent declared so far, if any.
    pub fn parent(&self) -> Option<String> {
        self.frame().parent.clone()
    }

    /// Executes the template and follows its parent chain.
    ///
    /// # Errors
    /// * `Error::EngineError` if the template already appears in its own parent
    ///   chain
    /// * any resolver error for this template or one of its ancestors
    /// * any error raised by the template body; partial output is discarded
    pub fn invoke(self) -> Result<RenderResult> {
        if self.lineage.contains(&self.name) {
            let chain = self
                .lineage
                .iter()
                .chain(std::iter::once(&self.name))
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(Error::engine(format!("cyclic inheritance detected: {chain}")));
        }

        let source = self.engine.load_source(&self.name)?;
        debug!("Executing template '{}'.", self.name);

        let context = Arc::new(self);
        let content = context.engine.renderer().execute(&context, &source)?;
        let Frame {
            blocks,
            parent,
            parent_params,
        } = std::mem::take(&mut *context.frame());

        match parent {
            Some(parent) => {
                debug!("Template '{}' delegates to parent '{}'.", context.name, parent);
                let lineage = context.child_lineage();
                let engine = context.engine.clone();
                RenderContext::spawned(engine, parent, parent_params, blocks, lineage).invoke()
            }
            None => Ok(RenderResult::new(content, blocks)),
        }
    }

    /// Declares the parent template, merging `params` into the parameters the
    /// parent will receive.
    ///
    /// # Errors
    /// * `Error::EngineError` if a parent was already declared
    pub fn set_parent<S: Into<String>>(&self, name: S, params: Params) -> Result<()> {
        let mut frame = self.frame();
        if frame.parent.is_some() {
            return Err(Error::engine("A parent template has already been defined"));
        }
        frame.parent = Some(name.into());
        frame.parent_params.extend(params);
        Ok(())
    }

    /// Returns the content of a block defined earlier in the chain.
    ///
    /// # Errors
    /// * `Error::EngineError` if no template has defined `name` yet
    pub fn block(&self, name: &str) -> Result<String> {
        self.frame()
            .blocks
            .get(name)
            .cloned()
            .ok_or_else(|| Error::engine(format!("The {name} block has not been defined")))
    }

    /// Captures `producer`'s output as block `name`, replacing any previous
    /// definition, and returns it.
    pub fn block_with<F>(&self, name: &str, producer: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        // the producer may re-enter this context, so the frame stays unlocked while it runs
        let content = producer()?;
        self.frame().blocks.insert(name.to_string(), content);
        self.block(name)
    }

    /// Renders `name` inline and returns its content.
    ///
    /// The inserted template sees this context's parameters merged with
    /// `params`, and the blocks it ends up with replace this context's blocks.
    /// Insertion does not extend the parent chain, so a template may insert
    /// itself as long as its own logic stops the recursion.
    pub fn insert(&self, name: &str, params: Params) -> Result<String> {
        let mut merged = self.params.clone();
        merged.extend(params);
        let blocks = self.blocks();

        debug!("Template '{}' inserts '{}'.", self.name, name);
        let result = RenderContext::spawned(
            self.engine.clone(),
            name.to_string(),
            merged,
            blocks,
            self.lineage.clone(),
        )
        .invoke()?;

        let (content, blocks) = result.into_parts();
        self.frame().blocks = blocks;
        Ok(content)
    }

    pub fn escape(&self, raw: &str) -> String {
        escape_html(raw)
    }

    /// Calls a host function registered with the engine.
    pub fn call_registered(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.engine.call_function(name, args)
    }

    fn child_lineage(&self) -> Vec<String> {
        let mut lineage = self.lineage.clone();
        lineage.push(self.name.clone());
        lineage
    }

    fn frame(&self) -> MutexGuard<'_, Frame> {
        self.frame.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TemplateRenderer;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    /// Runs each template as Rust code keyed by its file content.
    struct ScriptedRenderer;

    impl TemplateRenderer for ScriptedRenderer {
        fn execute(&self, context: &Arc<RenderContext>, source: &str) -> Result<String> {
            let mut out = String::new();
            match source.trim() {
                "child" => {
                    let params = Params::from([("role".into(), json!("child"))]);
                    context.set_parent("t::layout", params)?;
                    out += &context.block_with("title", || Ok("Child Title".to_string()))?;
                    out += "child text";
                }
                "layout" => {
                    out += "<h1>";
                    out += &context.block("title")?;
                    out += "</h1>";
                    out += context.params()["role"].as_str().unwrap_or_default();
                }
                "partial" => {
                    context.block_with("side", || Ok("from partial".to_string()))?;
                    out += "[partial]";
                }
                "outer" => {
                    out += &context.insert("t::partial", Params::new())?;
                    out += &context.block("side")?;
                }
                "twice" => {
                    context.set_parent("t::layout", Params::new())?;
                    context.set_parent("t::layout", Params::new())?;
                }
                "self" => context.set_parent("t::self", Params::new())?,
                "failing" => {
                    out += "partial output";
                    context.block("missing")?;
                }
                other => out += other,
            }
            Ok(out)
        }
    }

    fn engine_with(templates: &[&str]) -> (TempDir, Engine) {
        let temp_dir = TempDir::new().unwrap();
        for name in templates {
            fs::write(temp_dir.path().join(format!("{name}.tmpl")), name).unwrap();
        }
        let engine = Engine::builder()
            .namespace("t", temp_dir.path().display().to_string())
            .renderer(ScriptedRenderer)
            .build();
        (temp_dir, engine)
    }

    #[test]
    fn test_parent_receives_blocks_and_drops_child_output() {
        let (_dir, engine) = engine_with(&["child", "layout"]);
        let result = RenderContext::new(engine, "t::child", Params::new(), Blocks::new())
            .invoke()
            .unwrap();

        assert_eq!(result.content(), "<h1>Child Title</h1>child");
        assert_eq!(result.blocks().get("title").map(String::as_str), Some("Child Title"));
    }

    #[test]
    fn test_insert_merges_blocks_back() {
        let (_dir, engine) = engine_with(&["outer", "partial"]);
        let result = RenderContext::new(engine, "t::outer", Params::new(), Blocks::new())
            .invoke()
            .unwrap();

        assert_eq!(result.content(), "[partial]from partial");
    }

    #[test]
    fn test_parent_declared_twice() {
        let (_dir, engine) = engine_with(&["twice", "layout"]);
        let err = RenderContext::new(engine, "t::twice", Params::new(), Blocks::new())
            .invoke()
            .unwrap_err();

        assert!(err.to_string().contains("parent template has already been defined"));
    }

    #[test]
    fn test_self_parent_is_cyclic() {
        let (_dir, engine) = engine_with(&["self"]);
        let err = RenderContext::new(engine, "t::self", Params::new(), Blocks::new())
            .invoke()
            .unwrap_err();

        assert!(err.to_string().contains("cyclic inheritance detected: t::self -> t::self"));
    }

    #[test]
    fn test_failure_discards_output() {
        let (_dir, engine) = engine_with(&["failing"]);
        let err = RenderContext::new(engine, "t::failing", Params::new(), Blocks::new())
            .invoke()
            .unwrap_err();

        assert!(matches!(
            err,
            Error::EngineError(ref msg) if msg.contains("missing block has not been defined")
        ));
    }

    #[test]
    fn test_set_parent_merges_params() {
        let (_dir, engine) = engine_with(&[]);
        let params = Params::from([("a".into(), json!(1)), ("b".into(), json!(2))]);
        let context = RenderContext::new(engine, "t::any", params, Blocks::new());

        context.set_parent("t::base", Params::from([("b".into(), json!(3))])).unwrap();

        assert_eq!(context.parent().as_deref(), Some("t::base"));
        let frame = context.frame();
        assert_eq!(frame.parent_params["a"], json!(1));
        assert_eq!(frame.parent_params["b"], json!(3));
    }

    #[test]
    fn test_block_with_overwrites_previous_definition() {
        let (_dir, engine) = engine_with(&[]);
        let blocks = Blocks::from([("title".into(), "old".into())]);
        let context = RenderContext::new(engine, "t::any", Params::new(), blocks);

        assert_eq!(context.block("title").unwrap(), "old");
        assert_eq!(context.block_with("title", || Ok("new".into())).unwrap(), "new");
        assert_eq!(context.block("title").unwrap(), "new");
    }
}
