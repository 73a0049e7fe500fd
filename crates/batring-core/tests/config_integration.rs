//! Integration tests for config parsing against the real config.toml.

use batring_core::Config;
use std::path::PathBuf;

fn project_root() -> PathBuf {
    // Navigate from crates/batring-core/ up to project root
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent() // crates/
        .unwrap()
        .parent() // project root
        .unwrap()
        .to_path_buf()
}

#[test]
fn test_load_real_config() {
    let config_path = project_root().join("config.toml");

    let config = Config::load(&config_path).expect("Failed to load config.toml");

    assert!(config.indicator.size > 0, "Indicator size should be positive");
    assert!(
        ["top-left", "top-right", "bottom-left", "bottom-right"]
            .contains(&config.indicator.position.as_str()),
        "Indicator position should be valid"
    );
}

#[test]
fn test_real_config_validates() {
    let config_path = project_root().join("config.toml");
    let config = Config::load(&config_path).unwrap();

    config.validate().expect("Real config.toml should be valid");
}

#[test]
fn test_real_config_matches_typed_defaults() {
    // The commented defaults in config.toml must agree with the Default
    // impls, otherwise "no file found" and "default file" behave differently.
    let config_path = project_root().join("config.toml");
    let from_file = Config::load(&config_path).unwrap();

    assert_eq!(from_file, Config::default());
}

#[test]
fn test_config_summary() {
    let config_path = project_root().join("config.toml");
    let config = Config::load(&config_path).unwrap();

    let summary = config.summary();

    assert!(summary.contains("Indicator:"));
    assert!(summary.contains("Gauge:"));
    assert!(summary.contains("thresholds:"), "Summary should show thresholds");
}

#[test]
fn test_find_and_load_with_explicit_path() {
    let config_path = project_root().join("config.toml");

    let result = Config::find_and_load(Some(&config_path)).unwrap();

    assert!(!result.used_defaults);
    assert!(result.source.is_some());
    assert_eq!(result.source.unwrap(), config_path);

    result
        .config
        .validate()
        .expect("Loaded config should be valid");
}

#[test]
fn test_find_and_load_explicit_missing_fails() {
    let missing_path = PathBuf::from("/nonexistent/config.toml");

    // Explicit path that doesn't exist should fail (no fallback)
    let result = Config::find_and_load(Some(&missing_path));
    assert!(result.is_err());
}

#[test]
fn test_broken_config_returns_error_not_defaults() {
    use std::io::Write;

    let temp_dir = std::env::temp_dir().join("batring_test_broken_config");
    let _ = std::fs::remove_dir_all(&temp_dir); // Clean up any previous run
    std::fs::create_dir_all(&temp_dir).unwrap();

    let broken_config_path = temp_dir.join("config.toml");
    let mut file = std::fs::File::create(&broken_config_path).unwrap();
    writeln!(file, "this is not valid toml {{{{").unwrap();
    drop(file);

    let result = Config::load(&broken_config_path);
    assert!(result.is_err(), "Broken config should fail to load");

    std::fs::remove_dir_all(&temp_dir).unwrap();
}

#[test]
fn test_default_config_toml_parses_without_error() {
    let config =
        Config::from_default_toml().expect("DEFAULT_CONFIG_TOML should parse without error");

    config
        .validate()
        .expect("DEFAULT_CONFIG_TOML should pass validation");
}

#[test]
fn test_out_of_range_thresholds_are_clamped_not_rejected() {
    let toml = r#"
        [indicator]
        charging_threshold = 180
        discharging_threshold = -5
    "#;

    let config: Config = toml::from_str(toml).unwrap();
    config
        .validate()
        .expect("Out-of-range thresholds are clamped, not rejected");

    assert_eq!(config.indicator.charging_threshold(), 100);
    assert_eq!(config.indicator.discharging_threshold(), 0);
}
