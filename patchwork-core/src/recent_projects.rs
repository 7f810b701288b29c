use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::config_root;

pub const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentProject {
    pub path: PathBuf,
    pub name: String,
    #[serde(with = "system_time_serde")]
    pub last_opened: SystemTime,
}

/// Most-recently-used project files, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentProjects {
    pub entries: Vec<RecentProject>,
    #[serde(skip, default = "default_limit")]
    limit: usize,
    /// Where `save` writes. `None` keeps the list in memory only.
    #[serde(skip)]
    file: Option<PathBuf>,
}

fn default_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl Default for RecentProjects {
    fn default() -> Self {
        Self::with_limit(DEFAULT_RECENT_LIMIT)
    }
}

impl RecentProjects {
    /// An empty in-memory list.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
            file: None,
        }
    }

    /// Read the list from the patchwork config directory.
    pub fn load(limit: usize) -> Self {
        match config_root() {
            Some(root) => Self::load_from(root.join("recent.json"), limit),
            None => Self::with_limit(limit),
        }
    }

    /// Read the list kept in `file`. A missing or unreadable file gives an
    /// empty list that `save` will create.
    pub fn load_from(file: impl Into<PathBuf>, limit: usize) -> Self {
        let file = file.into();
        let mut recent = match std::fs::read_to_string(&file) {
            Ok(contents) => match serde_json::from_str::<RecentProjects>(&contents) {
                Ok(recent) => recent,
                Err(e) => {
                    log::warn!(target: "persistence", "ignoring malformed recent projects: {}", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        recent.limit = limit.max(1);
        recent.entries.truncate(recent.limit);
        recent.file = Some(file);
        recent
    }

    pub fn save(&self) {
        let Some(path) = &self.file else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::warn!(target: "persistence", "could not write {}: {}", path.display(), e);
                }
            }
            Err(e) => log::warn!(target: "persistence", "could not encode recent projects: {}", e),
        }
    }

    /// Record `path` as just used. The entry is named after the file stem.
    pub fn add(&mut self, path: &Path) {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.entries.retain(|e| e.path != path);
        self.entries.insert(
            0,
            RecentProject {
                path: path.to_path_buf(),
                name,
                last_opened: SystemTime::now(),
            },
        );
        self.entries.truncate(self.limit);
    }

    pub fn remove(&mut self, path: &Path) {
        self.entries.retain(|e| e.path != path);
    }

    pub fn most_recent(&self) -> Option<&RecentProject> {
        self.entries.first()
    }
}

mod system_time_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}
