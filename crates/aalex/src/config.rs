//! Assistant configuration stored as `config.json` in the assistant home.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::supervisor::{default_components, ComponentSpec};

pub const CONFIG_FILENAME: &str = "config.json";
pub const CONFIG_VERSION: &str = "1.0.0";
pub const HOME_ENV_VAR: &str = "AALEX_HOME";

const DEFAULT_MUSIC_URL: &str = "https://www.youtube.com/watch?v=QH2-TGUlwu4";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub version: String,
    pub assistant_name: String,
    pub greeting: String,
    pub wake_words: Vec<String>,
    /// Relative paths resolve against the assistant home.
    pub custom_commands_file: PathBuf,
    pub music_url: String,
    pub components: Vec<ComponentSpec>,
    pub supervisor: SupervisorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    pub poll_interval_ms: u64,
    pub grace_period_ms: u64,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            grace_period_ms: 3_000,
        }
    }
}

impl SupervisorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            assistant_name: "Aalex".to_string(),
            greeting: "Aalex online. Welcome back.".to_string(),
            wake_words: vec![
                "hey aalex".to_string(),
                "ok aalex".to_string(),
                "aalex".to_string(),
            ],
            custom_commands_file: PathBuf::from("custom_commands.json"),
            music_url: DEFAULT_MUSIC_URL.to_string(),
            components: default_components(),
            supervisor: SupervisorSettings::default(),
        }
    }
}

impl AssistantConfig {
    pub fn custom_commands_path(&self, home: &Path) -> PathBuf {
        if self.custom_commands_file.is_absolute() {
            self.custom_commands_file.clone()
        } else {
            home.join(&self.custom_commands_file)
        }
    }
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILENAME)
}

/// `AALEX_HOME`, else the platform config dir, else `./.aalex`.
pub fn resolve_home_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty()) {
        return PathBuf::from(home);
    }
    match dirs::config_dir() {
        Some(dir) => dir.join("aalex"),
        None => PathBuf::from(".aalex"),
    }
}

pub fn load_or_create_config(dir: &Path) -> CoreResult<AssistantConfig> {
    std::fs::create_dir_all(dir).map_err(|error| {
        CoreError::Internal(format!(
            "failed to create assistant directory {}: {error}",
            dir.display()
        ))
    })?;

    let path = config_path(dir);
    if !path.exists() {
        let config = AssistantConfig::default();
        write_config(&path, &config)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(config);
    }

    let data = std::fs::read_to_string(&path).map_err(|error| {
        CoreError::Internal(format!(
            "failed to read config {}: {error}",
            path.display()
        ))
    })?;
    let mut config: AssistantConfig = serde_json::from_str(&data).map_err(|error| {
        CoreError::InvalidInput(format!(
            "failed to parse config {}: {error}",
            path.display()
        ))
    })?;

    if config.version != CONFIG_VERSION {
        tracing::info!(
            "upgrading config {} from version {}",
            path.display(),
            config.version
        );
        config.version = CONFIG_VERSION.to_string();
        write_config(&path, &config)?;
    }

    Ok(config)
}

pub fn write_config(path: &Path, config: &AssistantConfig) -> CoreResult<()> {
    let data = serde_json::to_string_pretty(config)
        .map_err(|error| CoreError::Internal(format!("failed to serialize config: {error}")))?;
    std::fs::write(path, data).map_err(|error| {
        CoreError::Internal(format!(
            "failed to write config {}: {error}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_default_config_on_first_load() {
        let dir = tempdir().expect("tempdir");
        let config = load_or_create_config(dir.path()).expect("load");
        assert_eq!(config, AssistantConfig::default());
        assert!(config_path(dir.path()).exists());

        let again = load_or_create_config(dir.path()).expect("reload");
        assert_eq!(again, config);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(
            config_path(dir.path()),
            r#"{"version": "1.0.0", "assistant_name": "Jarvis", "supervisor": {"grace_period_ms": 500}}"#,
        )
        .unwrap();

        let config = load_or_create_config(dir.path()).expect("load");
        assert_eq!(config.assistant_name, "Jarvis");
        assert_eq!(config.wake_words, AssistantConfig::default().wake_words);
        assert_eq!(config.supervisor.grace_period(), Duration::from_millis(500));
        assert_eq!(config.supervisor.poll_interval_ms, 1_000);
        assert_eq!(config.components.len(), 3);
    }

    #[test]
    fn old_version_is_rewritten() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(config_path(dir.path()), r#"{"version": "0.1.0"}"#).unwrap();

        let config = load_or_create_config(dir.path()).expect("load");
        assert_eq!(config.version, CONFIG_VERSION);
        let stored = std::fs::read_to_string(config_path(dir.path())).unwrap();
        assert!(stored.contains(CONFIG_VERSION));
    }

    #[test]
    fn unparsable_config_is_rejected() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(config_path(dir.path()), "not json").unwrap();
        assert!(matches!(
            load_or_create_config(dir.path()),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn custom_commands_path_resolves_against_home() {
        let config = AssistantConfig::default();
        let home = Path::new("/tmp/aalex-home");
        assert_eq!(
            config.custom_commands_path(home),
            home.join("custom_commands.json")
        );
    }
}
