mod common;

use hello_crew::config::{Config, ConfigFile};
use hello_crew::error::Error;

const DOC: &str = r#"
[models.a]
name = "m1"
timeout = 60
description = "first"

[models.b]
name = "m2"
description = "second"

[settings]
default_model = "a"

[lm_studio]
base_url = "http://localhost:1234/v1"
api_key = "lm-studio"
"#;

#[test]
fn load_then_save_keeps_values() {
    let (_dir, path) = common::config_file(DOC);
    let file = ConfigFile::at(&path);
    let before = file.load().unwrap();
    file.save(&before).unwrap();
    let after = file.load().unwrap();
    assert_eq!(before, after);
    assert_eq!(after.models.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(after, Config::from_toml(DOC).unwrap());
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        ConfigFile::at(&path).load(),
        Err(Error::ConfigNotFound { .. })
    ));
    assert!(matches!(
        ConfigFile::locate(&path),
        Err(Error::ConfigNotFound { .. })
    ));
}

#[test]
fn relative_path_is_found_in_ancestor() {
    let (dir, path) = common::config_file(DOC);
    let nested = dir.path().join("src").join("deep");
    std::fs::create_dir_all(&nested).unwrap();

    let file = ConfigFile::locate_from(std::path::Path::new(".env.toml"), &nested).unwrap();
    assert_eq!(file.path(), path);
    assert_eq!(file.load().unwrap().current_model(), "a");
}

#[test]
fn malformed_toml_is_a_config_error() {
    let (_dir, path) = common::config_file("[models.a\nname = ");
    assert!(matches!(ConfigFile::at(&path).load(), Err(Error::Config(_))));
}

#[test]
fn resolved_model_carries_connection_settings() {
    let (_dir, path) = common::config_file(DOC);
    let config = ConfigFile::at(&path).load().unwrap();
    let model = config.model_config(Some("b")).unwrap();
    assert_eq!(model.name, "m2");
    assert_eq!(model.timeout_secs, 300);
    assert_eq!(model.base_url, "http://localhost:1234/v1");
    assert_eq!(model.api_key, "lm-studio");
}

#[test]
fn defaults_are_read_but_never_written_back() {
    let (_dir, path) = common::config_file("[models.a]\nname = \"m1\"\n");
    let file = ConfigFile::at(&path);
    let config = file.load().unwrap();
    assert_eq!(config.current_model(), "phi3-mini");
    assert_eq!(config.lm_studio.base_url(), "http://localhost:1234/v1");
    assert_eq!(config.models["a"].timeout_secs(), 300);

    file.save(&config).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(!written.contains("lm_studio"), "{written}");
    assert!(!written.contains("settings"), "{written}");
    assert!(!written.contains("timeout"), "{written}");
    assert!(!written.contains("description"), "{written}");
}
