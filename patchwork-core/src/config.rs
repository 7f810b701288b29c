use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::history::{DEFAULT_GESTURE_DURATION, DEFAULT_MAX_RECORDS};
use crate::recent_projects::DEFAULT_RECENT_LIMIT;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    history: HistoryConfig,
    #[serde(default)]
    project: ProjectConfig,
}

#[derive(Deserialize, Default)]
struct HistoryConfig {
    gesture_duration_ms: Option<u64>,
    max_records: Option<usize>,
}

#[derive(Deserialize, Default)]
struct ProjectConfig {
    default_project: Option<PathBuf>,
    recent_limit: Option<usize>,
}

pub struct Config {
    history: HistoryConfig,
    project: ProjectConfig,
}

impl Config {
    /// Embedded defaults overridden by the user's config file, if any.
    pub fn load() -> Self {
        let mut base = embedded();

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            history: base.history,
            project: base.project,
        }
    }

    /// Embedded defaults only.
    pub fn embedded() -> Self {
        let base = embedded();
        Config {
            history: base.history,
            project: base.project,
        }
    }

    /// Embedded defaults overridden by `user`, a config.toml document.
    pub fn from_toml(user: &str) -> Result<Self, toml::de::Error> {
        let mut base = embedded();
        merge(&mut base, toml::from_str(user)?);
        Ok(Config {
            history: base.history,
            project: base.project,
        })
    }

    /// Debounce window for gestures (clamped to 10ms..60s).
    pub fn gesture_duration(&self) -> Duration {
        self.history
            .gesture_duration_ms
            .map(|ms| Duration::from_millis(ms.clamp(10, 60_000)))
            .unwrap_or(DEFAULT_GESTURE_DURATION)
    }

    pub fn max_records(&self) -> usize {
        self.history
            .max_records
            .unwrap_or(DEFAULT_MAX_RECORDS)
            .max(1)
    }

    /// Default project path. Relative paths resolve against the patchwork
    /// config directory; `None` when there is no config directory to resolve
    /// against.
    pub fn default_project(&self) -> Option<PathBuf> {
        let file = self
            .project
            .default_project
            .clone()
            .unwrap_or_else(|| PathBuf::from("default.pws"));
        if file.is_absolute() {
            Some(file)
        } else {
            config_root().map(|dir| dir.join(file))
        }
    }

    pub fn recent_limit(&self) -> usize {
        self.project.recent_limit.unwrap_or(DEFAULT_RECENT_LIMIT)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::embedded()
    }
}

/// `<config dir>/patchwork`.
pub fn config_root() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("patchwork"))
}

fn user_config_path() -> Option<PathBuf> {
    config_root().map(|d| d.join("config.toml"))
}

fn embedded() -> ConfigFile {
    match toml::from_str(DEFAULT_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            log::error!(target: "config", "embedded config.toml is malformed: {}", e);
            ConfigFile::default()
        }
    }
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    merge_history(&mut base.history, user.history);
    merge_project(&mut base.project, user.project);
}

fn merge_history(base: &mut HistoryConfig, user: HistoryConfig) {
    if user.gesture_duration_ms.is_some() {
        base.gesture_duration_ms = user.gesture_duration_ms;
    }
    if user.max_records.is_some() {
        base.max_records = user.max_records;
    }
}

fn merge_project(base: &mut ProjectConfig, user: ProjectConfig) {
    if user.default_project.is_some() {
        base.default_project = user.default_project;
    }
    if user.recent_limit.is_some() {
        base.recent_limit = user.recent_limit;
    }
}
