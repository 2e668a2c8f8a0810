use crate::error::{CodefieldError, Result};
use crate::model::{NoteTypeId, DEFAULT_LANGUAGE, DEFAULT_THEME};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

/// User preferences, stored as a flat JSON document.
///
/// Keys this version does not know about are kept in `extra` and written
/// back untouched, so a downgrade never loses settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodefieldConfig {
    /// Theme used everywhere: dialog, editing surface, reviewer.
    #[serde(rename = "global_theme", default = "default_theme")]
    pub active_theme: String,

    /// Note types whose templates receive the review-time resource block.
    #[serde(rename = "injected_model_ids", default)]
    pub injected: BTreeSet<NoteTypeId>,

    /// Note types that skip the host's empty-field check.
    #[serde(rename = "bypassed_model_ids", default)]
    pub bypassed: BTreeSet<NoteTypeId>,

    /// Language the next dialog opens with.
    #[serde(default = "default_language")]
    pub last_language: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for CodefieldConfig {
    fn default() -> Self {
        Self {
            active_theme: default_theme(),
            injected: BTreeSet::new(),
            bypassed: BTreeSet::new(),
            last_language: default_language(),
            extra: Map::new(),
        }
    }
}

impl CodefieldConfig {
    /// Merges a stored document over the defaults. `null` means "nothing
    /// stored yet".
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            other => Err(CodefieldError::Store(format!(
                "configuration must be a JSON object, found {}",
                other
            ))),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn should_inject(&self, id: NoteTypeId) -> bool {
        self.injected.contains(&id)
    }

    pub fn is_bypassed(&self, id: NoteTypeId) -> bool {
        self.bypassed.contains(&id)
    }
}

/// Where the configuration document lives.
pub trait ConfigStore {
    fn load(&self) -> Result<CodefieldConfig>;
    fn save(&mut self, config: &CodefieldConfig) -> Result<()>;
}

/// `config.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    dir: PathBuf,
}

impl FileConfigStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILENAME)
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<CodefieldConfig> {
        let config_path = self.path();

        if !config_path.exists() {
            return Ok(CodefieldConfig::default());
        }

        let content = fs::read_to_string(&config_path).map_err(CodefieldError::Io)?;
        if content.trim().is_empty() {
            return Ok(CodefieldConfig::default());
        }
        let value: Value = serde_json::from_str(&content).map_err(CodefieldError::Serialization)?;
        CodefieldConfig::from_value(value)
    }

    fn save(&mut self, config: &CodefieldConfig) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(CodefieldError::Io)?;
        }

        let content =
            serde_json::to_string_pretty(config).map_err(CodefieldError::Serialization)?;
        fs::write(self.path(), content).map_err(CodefieldError::Io)?;
        Ok(())
    }
}

/// Holds the raw document in memory, for hosts that own persistence
/// themselves and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    document: Value,
    saves: usize,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Value) -> Self {
        Self { document, saves: 0 }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<CodefieldConfig> {
        CodefieldConfig::from_value(self.document.clone())
    }

    fn save(&mut self, config: &CodefieldConfig) -> Result<()> {
        self.document = config.to_value()?;
        self.saves += 1;
        Ok(())
    }
}
