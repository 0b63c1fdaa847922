//! Tests for configuration loading and root folder resolution
//!
//! Uses serial_test: tests touching URYSITE_ROOT_FOLDER / URYSITE_ROOT are
//! marked #[serial] so they do not race each other.

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;
use ury_common::config::{
    CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig, ROOT_ENV,
    ROOT_FOLDER_ENV,
};

fn clear_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    env::remove_var(ROOT_ENV);
}

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    clear_env();

    // A module name that will not have a config file
    let resolver = RootFolderResolver::new("nonexistent-test-module-12345");
    let root_folder = resolver.resolve();

    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var_root_folder() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/ury-test-env-folder");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/ury-test-env-folder"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_env_var_root() {
    clear_env();
    env::set_var(ROOT_ENV, "/tmp/ury-test-env-root");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/ury-test-env-root"));

    clear_env();
}

#[test]
#[serial]
fn test_root_folder_env_takes_precedence() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/ury-priority-1");
    env::set_var(ROOT_ENV, "/tmp/ury-priority-2");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/ury-priority-1"));

    clear_env();
}

#[test]
#[serial]
fn test_cli_arg_beats_environment() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/ury-from-env");

    let root_folder = RootFolderResolver::new("test-module")
        .with_cli_arg(Some(PathBuf::from("/tmp/ury-from-cli")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/ury-from-cli"));

    clear_env();
}

#[test]
fn test_initializer_creates_nested_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("level1").join("level2");

    let initializer = RootFolderInitializer::new(root.clone());
    assert!(!initializer.database_exists());

    initializer.ensure_directory_exists().unwrap();
    // Idempotent
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("urysite.db"));
}

#[test]
fn test_toml_file_loads_all_sections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schedule.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/urysite"

        [logging]
        level = "debug"

        [server]
        bind_address = "0.0.0.0"
        port = 8080

        [schedule]
        require_approval = true
        max_inheritance_depth = 4
        coming_up_quantity = 6
        filler_title = "Sustainer"
        "#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/urysite")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert!(config.schedule.require_approval);
    assert_eq!(config.schedule.max_inheritance_depth, 4);
    assert_eq!(config.schedule.coming_up_quantity, 6);
    assert_eq!(config.schedule.filler_title, "Sustainer");
}

#[test]
fn test_toml_roundtrip() {
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/urysite")),
        ..TomlConfig::default()
    };

    let toml_str = toml::to_string(&config).unwrap();
    let parsed: TomlConfig = toml::from_str(&toml_str).unwrap();

    assert_eq!(parsed.root_folder, config.root_folder);
    assert_eq!(parsed.server.port, config.server.port);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = TomlConfig::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ury_common::Error::Io(_))));
}
