#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::reminder::{DEFAULT_COOLDOWN_SECONDS, DEFAULT_WINDOW_SECONDS, MAX_COOLDOWN_SECONDS};
use crate::error::LisaError;
use crate::task::model::{Module, Priority};

/// Overrides `reminders.cooldown_seconds` when set.
pub const INTERVAL_ENV: &str = "LISA_REMINDER_INTERVAL";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub reminders: RemindersConfig,
    pub tasks: TasksConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: "~/.config/lisa/tasks.json".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemindersConfig {
    #[serde(alias = "interval_seconds")]
    pub cooldown_seconds: i64,
    pub window_seconds: i64,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            window_seconds: DEFAULT_WINDOW_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TasksConfig {
    pub default_module: Module,
    pub default_priority: Priority,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_module: Module::Work,
            default_priority: Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "~/.config/lisa/lisa.log".to_owned(),
            level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub icons: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { icons: true }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

impl Config {
    pub fn validate(&self) -> Result<(), LisaError> {
        if self.storage.data_file.trim().is_empty() {
            return Err(LisaError::Config(
                "storage.data_file must not be empty".to_owned(),
            ));
        }
        if !(0..=MAX_COOLDOWN_SECONDS).contains(&self.reminders.cooldown_seconds) {
            return Err(LisaError::Config(format!(
                "reminders.cooldown_seconds must be between 0 and {MAX_COOLDOWN_SECONDS}"
            )));
        }
        if self.reminders.window_seconds <= 0 {
            return Err(LisaError::Config(
                "reminders.window_seconds must be >= 1".to_owned(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.trim()) {
            return Err(LisaError::Config(format!(
                "logging.level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Cooldown used when no `--interval` is given: the environment override
    /// if it holds an integer in range, otherwise the configured value.
    #[must_use]
    pub fn default_cooldown_seconds(&self, env_value: Option<&str>) -> i64 {
        if let Some(raw) = env_value {
            match raw.trim().parse::<i64>() {
                Ok(secs) if (0..=MAX_COOLDOWN_SECONDS).contains(&secs) => return secs,
                _ => tracing::warn!(
                    var = INTERVAL_ENV,
                    value = raw,
                    "ignoring invalid reminder interval"
                ),
            }
        }
        self.reminders.cooldown_seconds
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
}

pub fn default_paths() -> anyhow::Result<ConfigPaths> {
    let unix = home_config_path_unix();
    if !cfg!(windows) {
        return Ok(ConfigPaths { config_file: unix });
    }

    // Windows: prefer the Unix-style path if present for portability.
    if unix.exists() {
        return Ok(ConfigPaths { config_file: unix });
    }

    let proj = ProjectDirs::from("com", "lisa", "lisa")
        .context("failed to determine platform config directory")?;
    Ok(ConfigPaths {
        config_file: proj.config_dir().join("config.toml"),
    })
}

fn home_config_path_unix() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    home.join(".config").join("lisa").join("config.toml")
}

fn home_dir() -> Option<PathBuf> {
    if let Some(v) = std::env::var_os("HOME") {
        return Some(PathBuf::from(v));
    }
    if let Some(v) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(v));
    }
    let drive = std::env::var_os("HOMEDRIVE");
    let path = std::env::var_os("HOMEPATH");
    match (drive, path) {
        (Some(d), Some(p)) => Some(PathBuf::from(d).join(PathBuf::from(p))),
        _ => None,
    }
}

#[must_use]
pub fn expand_tilde(input: &str) -> String {
    if let Some(rest) = input.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(rest).to_string_lossy().to_string();
    }
    input.to_owned()
}

pub fn expand_path(input: &str) -> anyhow::Result<PathBuf> {
    let expanded = expand_env_vars(&expand_tilde(input.trim()));
    let p = PathBuf::from(expanded);
    if p.is_absolute() {
        return Ok(p);
    }
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(cwd.join(p))
}

fn expand_env_vars(input: &str) -> String {
    // Expand $VAR and ${VAR}. Leave unknown vars untouched.
    let Ok(re) = regex::Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?") else {
        return input.to_owned();
    };
    re.replace_all(input, |caps: &regex::Captures<'_>| {
        let key = &caps[1];
        std::env::var(key).unwrap_or_else(|_| caps[0].to_owned())
    })
    .to_string()
}

pub fn load() -> anyhow::Result<(Config, ConfigPaths)> {
    let paths = default_paths()?;
    let cfg = load_at_path(&paths.config_file)?;
    Ok((cfg, paths))
}

pub fn load_at_path(path: &Path) -> anyhow::Result<Config> {
    let (_doc, cfg) = load_from_file(path)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn list_resolved_toml() -> anyhow::Result<String> {
    let (cfg, _paths) = load()?;
    Ok(toml::to_string_pretty(&cfg)?)
}

pub fn get_value_string(key: &str) -> anyhow::Result<Option<String>> {
    let paths = default_paths()?;
    get_value_string_at_path(&paths.config_file, key)
}

pub fn set_value_string(key: &str, value: &str) -> anyhow::Result<()> {
    let paths = default_paths()?;
    set_value_string_at_path(&paths.config_file, key, value)
}

fn load_from_file(path: &Path) -> anyhow::Result<(toml_edit::DocumentMut, Config)> {
    if !path.exists() {
        return Ok((toml_edit::DocumentMut::new(), Config::default()));
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let doc = raw
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("failed to parse TOML in {}", path.display()))?;

    let cfg: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to deserialize TOML in {}", path.display()))?;
    Ok((doc, cfg))
}

pub fn get_value_string_at_path(path: &Path, key: &str) -> anyhow::Result<Option<String>> {
    let (_doc, cfg) = load_from_file(path)?;
    cfg.validate()?;

    let norm = normalize_key(key);
    let value = lookup_value(&cfg, &norm);
    Ok(value.map(format_value_for_stdout))
}

pub fn set_value_string_at_path(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let (mut doc, cfg) = load_from_file(path)?;
    cfg.validate()?;

    let (norm_key, value_item) = normalize_key_and_parse_value(key, value)?;
    apply_set(&mut doc, &norm_key, value_item)?;

    // Validate by re-parsing the updated doc into a Config.
    let new_raw = doc.to_string();
    let new_cfg: Config = toml::from_str(&new_raw)
        .with_context(|| format!("config update produced invalid TOML for {}", path.display()))?;
    new_cfg.validate()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, new_raw.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyType {
    Bool,
    Int,
    String,
    Enum(&'static [&'static str]),
}

fn normalize_key(key: &str) -> String {
    match key.trim() {
        "data_file" | "storage.file" => "storage.data_file",
        "interval" | "reminders.interval_seconds" => "reminders.cooldown_seconds",
        "log_file" => "logging.file",
        "log_level" => "logging.level",
        other => other,
    }
    .to_owned()
}

fn normalize_key_and_parse_value(
    key: &str,
    value: &str,
) -> anyhow::Result<(String, toml_edit::Item)> {
    let norm = normalize_key(key);
    let key_type = key_type(&norm).ok_or_else(|| LisaError::InvalidConfigKey(key.to_owned()))?;
    let invalid = |msg: String| LisaError::InvalidConfigValue {
        key: key.to_owned(),
        msg,
    };
    let item = match key_type {
        KeyType::Bool => toml_edit::value(parse_bool(value).map_err(invalid)?),
        KeyType::Int => toml_edit::value(parse_int(value).map_err(invalid)?),
        KeyType::String => toml_edit::value(value),
        KeyType::Enum(allowed) => {
            let v = value.trim().to_lowercase();
            if !allowed.contains(&v.as_str()) {
                return Err(invalid(format!("must be one of: {}", allowed.join(", "))).into());
            }
            toml_edit::value(v)
        }
    };

    Ok((norm, item))
}

fn key_type(key: &str) -> Option<KeyType> {
    Some(match key {
        "storage.data_file" | "logging.file" => KeyType::String,
        "ui.icons" => KeyType::Bool,
        "reminders.cooldown_seconds" | "reminders.window_seconds" => KeyType::Int,
        "tasks.default_module" => KeyType::Enum(&["work", "home", "study"]),
        "tasks.default_priority" => KeyType::Enum(&["low", "medium", "high"]),
        "logging.level" => KeyType::Enum(LOG_LEVELS),
        _ => return None,
    })
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected true|false, got '{other}'")),
    }
}

fn parse_int(s: &str) -> Result<i64, String> {
    s.trim()
        .parse::<i64>()
        .map_err(|e| format!("expected integer, got '{s}': {e}"))
}

fn apply_set(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: toml_edit::Item,
) -> anyhow::Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        return Err(LisaError::InvalidConfigKey(key.to_owned()).into());
    };

    let mut cur = doc.as_table_mut();
    for seg in sections {
        if !cur.contains_key(seg) {
            let mut t = toml_edit::Table::new();
            t.set_implicit(true);
            cur.insert(seg, toml_edit::Item::Table(t));
        }
        cur = cur[seg].as_table_mut().ok_or_else(|| {
            LisaError::Config(format!("cannot set {key}: '{seg}' is not a table"))
        })?;
    }

    cur.insert(leaf, value);
    Ok(())
}

fn lookup_value(cfg: &Config, key: &str) -> Option<serde_json::Value> {
    let mut v = serde_json::to_value(cfg).ok()?;
    for seg in key.split('.').filter(|s| !s.is_empty()) {
        match v {
            serde_json::Value::Object(mut map) => {
                v = map.remove(seg)?;
            }
            _ => return None,
        }
    }
    Some(v)
}

fn format_value_for_stdout(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_owned(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn config_validation_catches_invalid_values() {
        let mut cfg = Config::default();
        cfg.reminders.window_seconds = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.logging.level = "loud".to_owned();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_interval_overrides_config() {
        let mut cfg = Config::default();
        cfg.reminders.cooldown_seconds = 600;
        assert_eq!(cfg.default_cooldown_seconds(None), 600);
        assert_eq!(cfg.default_cooldown_seconds(Some("120")), 120);
        assert_eq!(cfg.default_cooldown_seconds(Some("soon")), 600);
        assert_eq!(cfg.default_cooldown_seconds(Some("-5")), 600);
        assert_eq!(
            cfg.default_cooldown_seconds(Some(&i64::MAX.to_string())),
            600
        );
    }

    #[test]
    fn oversized_cooldown_is_rejected() {
        let mut cfg = Config::default();
        cfg.reminders.cooldown_seconds = MAX_COOLDOWN_SECONDS;
        cfg.validate().unwrap();
        cfg.reminders.cooldown_seconds = MAX_COOLDOWN_SECONDS + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reminders]\ninterval_seconds = 90\n").unwrap();

        let cfg = load_at_path(&path).unwrap();
        assert_eq!(cfg.reminders.cooldown_seconds, 90);
        assert_eq!(cfg.reminders.window_seconds, DEFAULT_WINDOW_SECONDS);
        assert_eq!(cfg.tasks.default_priority, Priority::Medium);
    }

    #[test]
    fn config_set_and_get_dot_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        set_value_string_at_path(&path, "ui.icons", "false").unwrap();
        assert_eq!(
            get_value_string_at_path(&path, "ui.icons")
                .unwrap()
                .as_deref(),
            Some("false")
        );

        set_value_string_at_path(&path, "interval", "900").unwrap();
        assert_eq!(
            get_value_string_at_path(&path, "reminders.cooldown_seconds")
                .unwrap()
                .as_deref(),
            Some("900")
        );

        set_value_string_at_path(&path, "tasks.default_module", "Home").unwrap();
        assert!(set_value_string_at_path(&path, "tasks.default_module", "garden").is_err());
        assert!(set_value_string_at_path(&path, "reminders.window_seconds", "0").is_err());
        assert!(set_value_string_at_path(&path, "nope.key", "1").is_err());

        let cfg = load_at_path(&path).unwrap();
        assert!(!cfg.ui.icons);
        assert_eq!(cfg.reminders.cooldown_seconds, 900);
        assert_eq!(cfg.tasks.default_module, Module::Home);
    }

    #[test]
    fn expands_tilde_and_env_vars() {
        let p = expand_path("/tmp/${LISA_TEST_SURELY_UNSET}/tasks.json").unwrap();
        assert_eq!(
            p,
            PathBuf::from("/tmp/${LISA_TEST_SURELY_UNSET}/tasks.json")
        );
        assert!(expand_path("relative.json").unwrap().is_absolute());
    }
}
