//! Template body execution.
//! Template files are MiniJinja sources; the render context's capabilities are
//! exposed to them as template functions (`parent`, `block`, `insert`,
//! `escape`, `call_registered` and every registered host function).
use std::sync::{Arc, Mutex, PoisonError};

use minijinja::value::{Kwargs, Rest, Value};
use minijinja::{AutoEscape, Environment, ErrorKind, State, UndefinedBehavior};

use crate::constants::BUILTIN_FUNCTIONS;
use crate::context::{Params, RenderContext};
use crate::error::{Error, Result};

type JinjaResult<T> = std::result::Result<T, minijinja::Error>;

/// Trait for template body executors.
pub trait TemplateRenderer: Send + Sync {
    /// Executes a template body and returns everything it wrote.
    ///
    /// # Arguments
    /// * `context` - Context of the template being executed
    /// * `source` - Contents of the resolved template file
    ///
    /// # Returns
    /// * `Result<String>` - Complete output; no partial output on failure
    fn execute(&self, context: &Arc<RenderContext>, source: &str) -> Result<String>;
}

/// MiniJinja-based template body executor.
#[derive(Clone)]
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer where undefined variables render as empty strings.
    pub fn new() -> Self {
        Self::with_undefined_behavior(UndefinedBehavior::Lenient)
    }

    /// Creates a renderer where using an undefined variable is an error.
    pub fn strict() -> Self {
        Self::with_undefined_behavior(UndefinedBehavior::Strict)
    }

    fn with_undefined_behavior(behavior: UndefinedBehavior) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(behavior);
        // escaping is explicit through `escape()`
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders the template source with the context's parameters as variables.
    ///
    /// # Errors
    /// * The first capability error raised by the template, unchanged
    /// * `Error::EngineError` for calls to functions nothing was registered under
    /// * `Error::MinijinjaError` for other syntax and evaluation failures
    fn execute(&self, context: &Arc<RenderContext>, source: &str) -> Result<String> {
        let failure = Failure::default();
        let mut env = self.env.clone();
        register_host_functions(&mut env, context, &failure);
        register_builtins(&mut env, context, &failure);

        env.add_template_owned(context.name().to_string(), source.to_string())?;
        let template = env.get_template(context.name())?;

        template
            .render(Value::from_serialize(context.params()))
            .map_err(|err| failure.take().unwrap_or_else(|| Error::from(err)))
    }
}

/// Keeps the first crate error raised inside a render so it can be returned
/// in place of MiniJinja's wrapper error.
#[derive(Clone, Default)]
struct Failure(Arc<Mutex<Option<Error>>>);

impl Failure {
    fn record(&self, err: Error) -> minijinja::Error {
        let message = err.to_string();
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
        minijinja::Error::new(ErrorKind::InvalidOperation, message)
    }

    fn take(&self) -> Option<Error> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

fn register_builtins(
    env: &mut Environment<'static>,
    context: &Arc<RenderContext>,
    failure: &Failure,
) {
    let (ctx, fail) = (Arc::clone(context), failure.clone());
    env.add_function("parent", move |name: String, params: Option<Value>| -> JinjaResult<String> {
        to_params(params)
            .and_then(|params| ctx.set_parent(name, params))
            .map_err(|err| fail.record(err))?;
        Ok(String::new())
    });

    let (ctx, fail) = (Arc::clone(context), failure.clone());
    env.add_function(
        "block",
        move |state: &State, name: String, kwargs: Kwargs| -> JinjaResult<String> {
            let caller: Option<Value> = kwargs.get("caller")?;
            kwargs.assert_all_used()?;
            let content = match caller {
                Some(caller) => ctx.block_with(&name, || {
                    let output = caller.call(state, &[])?;
                    Ok(output.to_string())
                }),
                None => ctx.block(&name),
            };
            content.map_err(|err| fail.record(err))
        },
    );

    let (ctx, fail) = (Arc::clone(context), failure.clone());
    env.add_function("insert", move |name: String, params: Option<Value>| -> JinjaResult<String> {
        to_params(params)
            .and_then(|params| ctx.insert(&name, params))
            .map_err(|err| fail.record(err))
    });

    let ctx = Arc::clone(context);
    env.add_function("escape", move |raw: Value| -> String {
        if raw.is_undefined() || raw.is_none() {
            return String::new();
        }
        match raw.as_str() {
            Some(raw) => ctx.escape(raw),
            None => ctx.escape(&raw.to_string()),
        }
    });

    let (ctx, fail) = (Arc::clone(context), failure.clone());
    env.add_function(
        "call_registered",
        move |name: String, args: Rest<Value>| -> JinjaResult<Value> {
            call_host(&ctx, &name, &args).map_err(|err| fail.record(err))
        },
    );
}

fn register_host_functions(
    env: &mut Environment<'static>,
    context: &Arc<RenderContext>,
    failure: &Failure,
) {
    for name in context.engine().functions().names() {
        // built-ins win; the builder already warned about the clash
        if BUILTIN_FUNCTIONS.contains(&name) {
            continue;
        }
        let (ctx, fail, fn_name) = (Arc::clone(context), failure.clone(), name.to_string());
        env.add_function(name.to_string(), move |args: Rest<Value>| -> JinjaResult<Value> {
            call_host(&ctx, &fn_name, &args).map_err(|err| fail.record(err))
        });
    }
}

fn call_host(context: &RenderContext, name: &str, args: &[Value]) -> Result<Value> {
    let args = args
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let result = context.call_registered(name, &args)?;
    Ok(Value::from_serialize(&result))
}

/// Converts the optional parameter map passed to `parent()` or `insert()`.
fn to_params(value: Option<Value>) -> Result<Params> {
    let value = match value {
        Some(value) if !(value.is_undefined() || value.is_none()) => value,
        _ => return Ok(Params::new()),
    };
    match serde_json::to_value(&value)? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(Error::engine(format!("template parameters must be a map, got {other}"))),
    }
}
