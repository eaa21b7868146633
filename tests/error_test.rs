use std::io;

use plinth::error::Error;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }

    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(Error::from(json_err), Error::JsonError(_)));
}

#[test]
fn test_error_display() {
    let err = Error::ConfigError("invalid config".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid config.");

    let err = Error::EngineError("The title block has not been defined".to_string());
    assert_eq!(err.to_string(), "Engine error: The title block has not been defined.");

    let err = Error::InvalidTemplateName {
        name: "foo".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid template name 'foo': templates must follow the namespace::template convention."
    );

    let err = Error::TemplateNotFound {
        reason: "The foo namespace has not been registered".to_string(),
    };
    assert_eq!(err.to_string(), "Template not found: The foo namespace has not been registered.");
}

#[test]
fn test_function_error_source() {
    let err = Error::FunctionError {
        name: "slug".to_string(),
        source: anyhow::anyhow!("bad input"),
    };
    assert_eq!(err.to_string(), "Function 'slug' failed: bad input.");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unknown_function_maps_to_engine_error() {
    let err = Error::from(minijinja::Error::new(
        minijinja::ErrorKind::UnknownFunction,
        "nope is unknown",
    ));
    assert_eq!(
        err.to_string(),
        "Engine error: The nope function does not exist or is not callable."
    );

    let err = Error::from(minijinja::Error::new(
        minijinja::ErrorKind::SyntaxError,
        "unexpected end of input",
    ));
    assert!(matches!(err, Error::MinijinjaError(_)));
}
