//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a per-module TOML file. Everything in
//! it is optional: a missing or unreadable file logs a warning and the
//! compiled defaults apply.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `URYSITE_ROOT_FOLDER` environment variable
//! 3. `URYSITE_ROOT` environment variable
//! 4. `root_folder` in the TOML config file
//! 5. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "urysite.db";

/// Primary root folder environment variable
pub const ROOT_FOLDER_ENV: &str = "URYSITE_ROOT_FOLDER";

/// Alternative root folder environment variable
pub const ROOT_ENV: &str = "URYSITE_ROOT";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Schedule behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Only approved metadata entries count as current
    #[serde(default)]
    pub require_approval: bool,

    /// Longest metadata parent chain followed before giving up (at least 1:
    /// timeslot titles come from the show, two levels up)
    #[serde(default = "default_max_inheritance_depth")]
    pub max_inheritance_depth: usize,

    /// Default length of the "coming up" listing
    #[serde(default = "default_coming_up_quantity")]
    pub coming_up_quantity: i64,

    /// Title shown for filler timeslots
    #[serde(default = "default_filler_title")]
    pub filler_title: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            require_approval: false,
            max_inheritance_depth: default_max_inheritance_depth(),
            coming_up_quantity: default_coming_up_quantity(),
            filler_title: default_filler_title(),
        }
    }
}

impl ScheduleConfig {
    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.max_inheritance_depth == 0 {
            return Err(Error::Config(
                "[schedule] max_inheritance_depth must be at least 1".to_string(),
            ));
        }
        if self.coming_up_quantity <= 0 {
            return Err(Error::Config(format!(
                "[schedule] coming_up_quantity must be positive (got {})",
                self.coming_up_quantity
            )));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_max_inheritance_depth() -> usize {
    8
}

fn default_coming_up_quantity() -> i64 {
    10
}

fn default_filler_title() -> String {
    "URY Jukebox".to_string()
}

impl TomlConfig {
    /// Parse and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.schedule.validate()?;
        Ok(config)
    }

    /// Load the config file for a module, falling back to defaults
    ///
    /// Never fails: a missing file is normal, a broken one is logged.
    pub fn load_for_module(module_name: &str) -> Self {
        let Some(path) = config_file_path(module_name) else {
            debug!("No config file found for {}, using defaults", module_name);
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Compiled-in platform defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
        }
    }
}

/// Resolves the root folder following the priority order in the module docs
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    /// Set the command-line override
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(root_folder) = TomlConfig::load_for_module(&self.module_name).root_folder {
            return root_folder;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

/// Locate the config file for a module
///
/// Linux checks `~/.config/urysite/<module>.toml` then
/// `/etc/urysite/<module>.toml`; other platforms use the user config dir only.
fn config_file_path(module_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", module_name);

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("urysite").join(&file_name)) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/urysite").join(&file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/urysite (or /var/lib/urysite for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("urysite"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/urysite"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("urysite"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/urysite"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("urysite"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\urysite"))
    } else {
        PathBuf::from("./urysite_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.root_folder.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 5780);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert!(!config.schedule.require_approval);
        assert_eq!(config.schedule.coming_up_quantity, 10);
        assert_eq!(config.schedule.filler_title, "URY Jukebox");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [schedule]
            require_approval = true
            "#,
        )
        .unwrap();

        assert!(config.schedule.require_approval);
        assert_eq!(config.schedule.max_inheritance_depth, 8);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let result = TomlConfig::load(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_inheritance_depth_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ury-schedule.toml");
        std::fs::write(&path, "[schedule]\nmax_inheritance_depth = 0\n").unwrap();

        let result = TomlConfig::load(&path);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("max_inheritance_depth")));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let config = ScheduleConfig {
            coming_up_quantity: 0,
            ..ScheduleConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(ScheduleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_database_path_uses_root_folder() {
        let initializer = RootFolderInitializer::new(PathBuf::from("/tmp/ury-root"));
        assert_eq!(
            initializer.database_path(),
            PathBuf::from("/tmp/ury-root/urysite.db")
        );
    }

    #[test]
    fn test_cli_arg_wins() {
        let resolver = RootFolderResolver::new("schedule")
            .with_cli_arg(Some(PathBuf::from("/srv/ury")));
        assert_eq!(resolver.resolve(), PathBuf::from("/srv/ury"));
    }
}
