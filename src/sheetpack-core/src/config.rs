use crate::assembler::PageOrder;
use crate::paths::AppDirs;
use crate::resolver::ResolverOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, PathBuf};
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    /// Name (key of `packs`) or directory of the pack used when none is given.
    #[serde(default)]
    pub default_pack: Option<String>,
    /// Named pack directories.
    #[serde(default)]
    pub packs: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub info: InfoConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            default_pack: None,
            packs: BTreeMap::new(),
            logging: LoggingConfig::default(),
            info: InfoConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    /// Mirror log lines to stderr; stdout is reserved for the plugin protocol.
    #[serde(default = "default_console_enabled")]
    pub console: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            console: default_console_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfoConfig {
    #[serde(default)]
    pub page_order: PageOrder,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("default_pack must not be empty")]
    EmptyDefaultPack,
    #[error("no pack selected; pass --pack or set default_pack in config.toml")]
    NoPackSelected,
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        if matches!(self.default_pack.as_deref(), Some(pack) if pack.trim().is_empty()) {
            return Err(ValidationError::EmptyDefaultPack);
        }
        Ok(())
    }

    /// Picks the pack directory: CLI override first, then `default_pack`.
    /// Either may name an entry of `packs`, a directory installed under
    /// [`AppDirs::packs_dir`], or be a directory path.
    pub fn resolve_pack(
        &self,
        cli_pack: Option<&str>,
        dirs: &AppDirs,
    ) -> Result<PathBuf, ValidationError> {
        let selected = cli_pack
            .or(self.default_pack.as_deref())
            .ok_or(ValidationError::NoPackSelected)?;
        if let Some(dir) = self.packs.get(selected) {
            return Ok(dir.clone());
        }

        let path = PathBuf::from(selected);
        let is_bare_name = matches!(
            path.components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
        if is_bare_name && !path.is_dir() {
            let installed = dirs.packs_dir().join(selected);
            if installed.is_dir() {
                return Ok(installed);
            }
        }
        Ok(path)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            page_order: self.info.page_order,
        }
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_console_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.max_log_files, 7);
        assert!(config.logging.console);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.info.page_order, PageOrder::Prefix);
    }

    #[test]
    fn invalid_version_rejected() {
        let mut config = Config::default();
        config.config_version = CURRENT_CONFIG_VERSION + 1;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn parses_packs_and_page_order() {
        let config: Config = toml::from_str(
            r#"
default_pack = "srd"

[packs]
srd = "/opt/packs/srd"

[info]
page_order = "listing"
"#,
        )
        .unwrap();
        assert_eq!(config.info.page_order, PageOrder::Listing);
        let dirs = AppDirs::under("/nonexistent/sheetpack");
        assert_eq!(
            config.resolve_pack(None, &dirs).unwrap(),
            PathBuf::from("/opt/packs/srd")
        );
        assert_eq!(
            config.resolve_pack(Some("./homebrew"), &dirs).unwrap(),
            PathBuf::from("./homebrew")
        );
    }

    #[test]
    fn bare_names_fall_back_to_installed_packs() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = AppDirs::under(tmp.path());
        fs::create_dir_all(dirs.packs_dir().join("homebrew")).unwrap();

        let mut config = Config::default();
        config
            .packs
            .insert("srd".to_string(), PathBuf::from("/opt/packs/srd"));
        config.default_pack = Some("homebrew".to_string());

        assert_eq!(
            config.resolve_pack(None, &dirs).unwrap(),
            dirs.packs_dir().join("homebrew")
        );
        assert_eq!(
            config.resolve_pack(Some("srd"), &dirs).unwrap(),
            PathBuf::from("/opt/packs/srd")
        );
        assert_eq!(
            config.resolve_pack(Some("missing"), &dirs).unwrap(),
            PathBuf::from("missing")
        );
    }

    #[test]
    fn missing_pack_selection_is_reported() {
        let dirs = AppDirs::under("/nonexistent/sheetpack");
        assert_eq!(
            Config::default().resolve_pack(None, &dirs),
            Err(ValidationError::NoPackSelected)
        );
    }

    #[test]
    fn load_reads_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = AppDirs::under(tmp.path());
        dirs.ensure_exists().unwrap();
        fs::write(
            Config::config_path(&dirs),
            "default_pack = \"homebrew\"\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        let config = Config::load_or_default(&dirs).unwrap();
        assert_eq!(config.default_pack.as_deref(), Some("homebrew"));
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
