//! Integration tests for parsing config fixtures.

use solr_multisub_config::{
    CURRENT_CONFIG_VERSION, parse_backend_config_json, parse_backend_config_toml,
};
use solr_multisub_domain::Scheme;
use solr_multisub_shared::ErrorCode;
use std::error::Error;
use std::fs;
use std::path::Path;

fn read_fixture(name: &str) -> Result<String, Box<dyn Error>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    Ok(fs::read_to_string(path)?)
}

#[test]
fn parses_valid_fixture_and_normalizes() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("multisub.valid.json")?;
    let config = parse_backend_config_json(&contents)?;

    assert_eq!(config.version, CURRENT_CONFIG_VERSION);
    assert_eq!(config.connection.scheme, Scheme::Https);
    assert_eq!(
        &*config.connection.search_host, "search.example.com",
        "host should be trimmed and lower-cased"
    );
    assert_eq!(config.subscription.identifier.as_deref(), Some("ABCD-12345"));
    assert!(config.overrides.selector.is_none(), "blank selector is unset");
    assert!(config.overrides.auto_switch);
    assert_eq!(
        config.overrides.manual_core_name.as_deref(),
        Some("WXYZ-67890.dev")
    );
    Ok(())
}

#[test]
fn parses_default_toml_fixture() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("multisub.default.toml")?;
    let config = parse_backend_config_toml(&contents)?;

    assert_eq!(config.connection.scheme, Scheme::Http);
    assert!(config.subscription.identifier.is_none());
    assert!(!config.overrides.auto_switch);
    Ok(())
}

#[test]
fn invalid_fixture_reports_error_code() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("multisub.invalid.json")?;
    let error = parse_backend_config_json(&contents)
        .err()
        .ok_or_else(|| std::io::Error::other("expected invalid fixture error"))?;

    assert_eq!(error.code, ErrorCode::new("config", "invalid_search_host"));
    assert_eq!(
        error.metadata.get("field").map(String::as_str),
        Some("searchHost")
    );
    Ok(())
}
