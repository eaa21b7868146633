//! Parameter loading for the command line: inline JSON or stdin.

use crate::context::Params;
use crate::error::{Error, Result};
use std::io::Read;

#[derive(Debug)]
pub enum ParamsSource {
    Stdin,
    Inline(String),
    None,
}

impl ParamsSource {
    pub fn new(take_from_stdin: bool, inline: Option<String>) -> Self {
        match (take_from_stdin, inline) {
            (true, _) => ParamsSource::Stdin,
            (false, Some(json)) => ParamsSource::Inline(json),
            (false, None) => ParamsSource::None,
        }
    }
}

/// Parses a JSON object into template parameters.
///
/// Blank input yields an empty parameter set.
///
/// # Errors
/// * `Error::JsonError` for malformed JSON
/// * `Error::ConfigError` if the JSON is not an object
pub fn parse_params(content: &str) -> Result<Params> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(Params::new());
    }

    match serde_json::from_str(content)? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        serde_json::Value::Null => Ok(Params::new()),
        other => Err(Error::ConfigError(format!(
            "Template parameters must be a JSON object, got: {other}"
        ))),
    }
}

pub fn load_from_stdin() -> Result<Params> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    parse_params(&buffer)
}

pub fn get_params(source: ParamsSource) -> Result<Params> {
    match source {
        ParamsSource::Stdin => load_from_stdin(),
        ParamsSource::Inline(json) => parse_params(&json),
        ParamsSource::None => Ok(Params::new()),
    }
}
