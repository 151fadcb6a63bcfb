//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.keytally/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::saver::SavePolicy;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KeytallyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub data_file: Option<PathBuf>,
    pub save_interval_secs: Option<u64>,
    pub fold_case: Option<bool>,
}

/// Values passed on the command line (None / false = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub data_file: Option<PathBuf>,
    pub save_interval_secs: Option<u64>,
    pub fold_case: bool,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_DATA_FILE: &str = "key_counts.json";
pub const DEFAULT_SAVE_INTERVAL_SECS: u64 = 0;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_file: PathBuf,
    pub save_policy: SavePolicy,
    pub fold_case: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.keytally/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".keytally").join("config.toml"))
}

/// Load config from `~/.keytally/config.toml`.
pub fn load_config() -> Result<KeytallyConfig, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(KeytallyConfig::default())
        }
    }
}

/// Load config from an explicit path.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `KeytallyConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config_from(path: &Path) -> Result<KeytallyConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(KeytallyConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: KeytallyConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Keytally Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# data_file = "key_counts.json"     # Or set KEYTALLY_DATA_FILE env var
# save_interval_secs = 0            # 0 = save after every key; or KEYTALLY_SAVE_INTERVAL
# fold_case = false                 # Count "A" and "a" as the same key
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &KeytallyConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |name| std::env::var(name).ok())
}

/// Same as [`resolve`], with the environment lookup supplied by the caller.
pub fn resolve_with_env(
    config: &KeytallyConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Data file: CLI → env → config → default
    let data_file = cli
        .data_file
        .clone()
        .or_else(|| env("KEYTALLY_DATA_FILE").map(PathBuf::from))
        .or_else(|| config.general.data_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

    // Save interval: CLI → env → config → default
    let env_interval = env("KEYTALLY_SAVE_INTERVAL").and_then(|raw| match raw.trim().parse() {
        Ok(secs) => Some(secs),
        Err(_) => {
            warn!("Ignoring invalid KEYTALLY_SAVE_INTERVAL: {:?}", raw);
            None
        }
    });
    let save_interval_secs = cli
        .save_interval_secs
        .or(env_interval)
        .or(config.general.save_interval_secs)
        .unwrap_or(DEFAULT_SAVE_INTERVAL_SECS);

    // Fold case: a CLI flag can only turn it on
    let fold_case = cli.fold_case || config.general.fold_case.unwrap_or(false);

    ResolvedConfig {
        data_file,
        save_policy: SavePolicy::from_secs(save_interval_secs),
        fold_case,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&KeytallyConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(resolved.save_policy, SavePolicy::EveryKey);
        assert!(!resolved.fold_case);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = KeytallyConfig {
            general: GeneralConfig {
                data_file: Some(PathBuf::from("/tmp/counts.json")),
                save_interval_secs: Some(5),
                fold_case: Some(true),
            },
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.data_file, PathBuf::from("/tmp/counts.json"));
        assert_eq!(resolved.save_policy, SavePolicy::Interval(Duration::from_secs(5)));
        assert!(resolved.fold_case);
    }

    #[test]
    fn test_resolve_env_beats_config() {
        let config = KeytallyConfig {
            general: GeneralConfig {
                data_file: Some(PathBuf::from("from-config.json")),
                save_interval_secs: Some(5),
                ..Default::default()
            },
        };
        let env = |name: &str| match name {
            "KEYTALLY_DATA_FILE" => Some("from-env.json".to_string()),
            "KEYTALLY_SAVE_INTERVAL" => Some("0".to_string()),
            _ => None,
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.data_file, PathBuf::from("from-env.json"));
        assert_eq!(resolved.save_policy, SavePolicy::EveryKey);
    }

    #[test]
    fn test_resolve_cli_wins() {
        let config = KeytallyConfig {
            general: GeneralConfig {
                data_file: Some(PathBuf::from("from-config.json")),
                ..Default::default()
            },
        };
        let cli = CliOverrides {
            data_file: Some(PathBuf::from("from-cli.json")),
            save_interval_secs: Some(30),
            fold_case: true,
        };
        let env = |_: &str| Some("from-env.json".to_string());
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.data_file, PathBuf::from("from-cli.json"));
        assert_eq!(resolved.save_policy, SavePolicy::Interval(Duration::from_secs(30)));
        assert!(resolved.fold_case);
    }

    #[test]
    fn test_invalid_env_interval_is_ignored() {
        let env = |name: &str| (name == "KEYTALLY_SAVE_INTERVAL").then(|| "soon".to_string());
        let resolved = resolve_with_env(&KeytallyConfig::default(), &CliOverrides::default(), env);
        assert_eq!(resolved.save_policy, SavePolicy::EveryKey);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[general]
save_interval_secs = 10
"#;
        let config: KeytallyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.save_interval_secs, Some(10));
        assert!(config.general.data_file.is_none());
        assert!(config.general.fold_case.is_none());
    }

    #[test]
    fn test_missing_config_generates_commented_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".keytally").join("config.toml");

        let config = load_config_from(&path).unwrap();
        assert!(config.general.data_file.is_none());

        // The generated file is all comments, so it parses back to defaults
        let generated = fs::read_to_string(&path).unwrap();
        assert!(generated.contains("# data_file"));
        let reparsed = load_config_from(&path).unwrap();
        assert!(reparsed.general.save_interval_secs.is_none());
    }

    #[test]
    fn test_malformed_config_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general\nfold_case = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }
}
