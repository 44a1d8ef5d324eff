use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::merge::{DEFAULT_RESERVED_NAMES, MergeOptions};
use crate::store::{DEFAULT_OVERWRITE_EXPAND_PERCENT, StoreOptions};

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "NOTELOG_CONFIG";
/// Env var overriding `data_dir`.
pub const DATA_DIR_ENV: &str = "NOTELOG_DATA_DIR";
/// Env var overriding the output format.
pub const FORMAT_ENV: &str = "NOTELOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root under which each tenant gets its own directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_index_file_name")]
    pub index_file_name: String,
    #[serde(default = "default_data_file_name")]
    pub data_file_name: String,
    #[serde(default = "default_overwrite_expand_percent")]
    pub overwrite_expand_percent: u64,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default)]
    pub durable: bool,
    #[serde(default = "default_true")]
    pub tolerant_merge: bool,
    #[serde(default = "default_reserved_note_names")]
    pub reserved_note_names: Vec<String>,
    #[serde(default)]
    pub output: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            index_file_name: default_index_file_name(),
            data_file_name: default_data_file_name(),
            overwrite_expand_percent: default_overwrite_expand_percent(),
            lock_timeout_ms: default_lock_timeout_ms(),
            durable: false,
            tolerant_merge: default_true(),
            reserved_note_names: default_reserved_note_names(),
            output: None,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            overwrite_expand_percent: self.overwrite_expand_percent,
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            durable: self.durable,
        }
    }

    #[must_use]
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            tolerant: self.tolerant_merge,
            reserved_names: self.reserved_note_names.clone(),
        }
    }
}

/// Where the config file is looked up, in order.
fn config_path(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Some((PathBuf::from(path), true));
    }
    dirs::config_dir().map(|dir| (dir.join("notelog/config.toml"), false))
}

/// Read and parse one config file.
///
/// # Errors
///
/// Fails if the file cannot be read or is not valid TOML for [`ServerConfig`].
pub fn load_config_file(path: &Path) -> Result<ServerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ServerConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective config: explicit path, then `NOTELOG_CONFIG`, then
/// the user config dir, then defaults. `NOTELOG_DATA_DIR` wins over
/// `data_dir` from any source.
///
/// # Errors
///
/// Fails if an explicitly named file (by argument or `NOTELOG_CONFIG`) is
/// missing, or if the selected file cannot be read or parsed.
pub fn load_config(explicit: Option<&Path>) -> Result<ServerConfig> {
    let mut config = match config_path(explicit) {
        Some((path, true)) => {
            if !path.exists() {
                bail!("Config file {} does not exist", path.display());
            }
            load_config_file(&path)?
        }
        Some((path, false)) if path.exists() => load_config_file(&path)?,
        _ => ServerConfig::default(),
    };
    apply_env_overrides(&mut config, env::var_os(DATA_DIR_ENV).map(PathBuf::from));
    Ok(config)
}

fn apply_env_overrides(config: &mut ServerConfig, data_dir: Option<PathBuf>) {
    if let Some(dir) = data_dir.filter(|d| !d.as_os_str().is_empty()) {
        config.data_dir = dir;
    }
}

/// How command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// `--json` beats `NOTELOG_FORMAT`, which beats the config file; otherwise
/// pretty on a terminal and plain text when piped.
pub fn resolve_output(cli_json: bool, config: &ServerConfig) -> OutputFormat {
    resolve_output_from(cli_json, config.output.as_deref(), env::var(FORMAT_ENV).ok().as_deref())
}

fn resolve_output_from(
    cli_json: bool,
    config_output: Option<&str>,
    env_format: Option<&str>,
) -> OutputFormat {
    fn normalize_output_mode(raw: &str) -> Option<OutputFormat> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some(OutputFormat::Pretty),
            "text" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    if cli_json {
        return OutputFormat::Json;
    }
    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode;
    }
    if let Some(mode) = config_output.and_then(normalize_output_mode) {
        return mode;
    }
    if std::io::stdout().is_terminal() {
        OutputFormat::Pretty
    } else {
        OutputFormat::Text
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from("notelog-data"), |dir| dir.join("notelog"))
}

fn default_index_file_name() -> String {
    "index.txt".to_string()
}

fn default_data_file_name() -> String {
    "data.bin".to_string()
}

const fn default_overwrite_expand_percent() -> u64 {
    DEFAULT_OVERWRITE_EXPAND_PERCENT
}

const fn default_lock_timeout_ms() -> u64 {
    5000
}

const fn default_true() -> bool {
    true
}

fn default_reserved_note_names() -> Vec<String> {
    DEFAULT_RESERVED_NAMES
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_uses_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").expect("write");
        let cfg = load_config_file(&path).expect("load");
        assert_eq!(cfg.index_file_name, "index.txt");
        assert_eq!(cfg.data_file_name, "data.bin");
        assert_eq!(cfg.overwrite_expand_percent, 140);
        assert_eq!(cfg.lock_timeout_ms, 5000);
        assert!(!cfg.durable);
        assert!(cfg.tolerant_merge);
        assert_eq!(cfg.reserved_note_names, vec!["scratch", "inbox", "daily journal"]);
    }

    #[test]
    fn parses_overrides() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/srv/notelog"
durable = true
tolerant_merge = false
lock_timeout_ms = 250
reserved_note_names = ["scratch"]
"#,
        )
        .expect("write");
        let cfg = load_config_file(&path).expect("load");
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/notelog"));
        assert!(cfg.durable);

        let store = cfg.store_options();
        assert_eq!(store.lock_timeout, Duration::from_millis(250));
        assert!(store.durable);
        let merge = cfg.merge_options();
        assert!(!merge.tolerant);
        assert_eq!(merge.reserved_names, vec!["scratch"]);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "durable = \"yes please\"").expect("write");
        let err = load_config_file(&path).expect_err("must fail");
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn data_dir_env_override() {
        let mut cfg = ServerConfig::default();
        apply_env_overrides(&mut cfg, Some(PathBuf::from("/tmp/tenants")));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/tenants"));

        apply_env_overrides(&mut cfg, Some(PathBuf::new()));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/tenants"));
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        assert_eq!(
            resolve_output_from(true, Some("pretty"), Some("text")),
            OutputFormat::Json
        );
    }

    #[test]
    fn env_beats_config_and_aliases_normalize() {
        assert_eq!(
            resolve_output_from(false, Some("json"), Some("human")),
            OutputFormat::Pretty
        );
        assert_eq!(
            resolve_output_from(false, Some("plain"), Some("bogus")),
            OutputFormat::Text
        );
    }
}
