use plinth::config::{find_config, get_config, load_config_file, parse_config, EngineConfig};
use plinth::constants::CONFIG_FILES;
use plinth::{Engine, Params};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_json_config() {
    let content = r#"{"namespaces": {"site": "/srv/site"}, "extension": "html"}"#;
    let config = parse_config(content).unwrap();
    assert_eq!(config.namespaces["site"], "/srv/site");
    assert_eq!(config.extension, "html");
    assert!(!config.strict_undefined);
}

#[test]
fn test_parse_yaml_config_with_defaults() {
    let config = parse_config("namespaces:\n  site: /srv/site\nstrict_undefined: true\n").unwrap();
    assert_eq!(config.namespaces["site"], "/srv/site");
    assert_eq!(config.extension, "tmpl");
    assert!(config.strict_undefined);
}

#[test]
fn test_invalid_config() {
    let err = parse_config("namespaces: [unclosed").unwrap_err();
    assert!(err.to_string().contains("Invalid configuration format"));
}

#[test]
fn test_find_config_priority() {
    let temp_dir = TempDir::new().unwrap();
    assert!(find_config(temp_dir.path(), &CONFIG_FILES).is_none());

    fs::write(temp_dir.path().join("plinth.yaml"), "extension: yaml").unwrap();
    fs::write(temp_dir.path().join("plinth.json"), r#"{"extension": "json"}"#).unwrap();

    let found = find_config(temp_dir.path(), &CONFIG_FILES).unwrap();
    assert_eq!(found, temp_dir.path().join("plinth.json"));
}

#[test]
fn test_get_config_defaults_without_file() {
    let temp_dir = TempDir::new().unwrap();
    assert_eq!(get_config(temp_dir.path()).unwrap(), EngineConfig::default());
}

#[test]
fn test_relative_roots_follow_config_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("templates")).unwrap();
    fs::write(temp_dir.path().join("templates/hello.tmpl"), "Hello {{ name }}").unwrap();
    fs::write(
        temp_dir.path().join("plinth.yml"),
        "namespaces:\n  site: templates\n  abs: /srv/abs\n",
    )
    .unwrap();

    let config = get_config(temp_dir.path()).unwrap();
    assert_eq!(
        config.namespaces["site"],
        temp_dir.path().join("templates").display().to_string()
    );
    assert_eq!(config.namespaces["abs"], "/srv/abs");

    let engine = Engine::from_config(&config);
    let mut params = Params::new();
    params.insert("name".to_string(), serde_json::json!("config"));
    assert_eq!(engine.render("site::hello", params).unwrap(), "Hello config");
}

#[test]
fn test_missing_config_file() {
    let err = load_config_file("/definitely/not/here/plinth.json").unwrap_err();
    assert!(err.to_string().contains("Invalid configuration path"));
}
