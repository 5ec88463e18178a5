use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::field::FieldSpec;

pub const DEFAULT_DELIMITER: &str = "\t";
const FALLBACK_TITLE: &str = "qscout";

/// The configuration document driving one form build. Loaded once and
/// treated as an immutable snapshot afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page_title: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionSpec {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl GameConfig {
    /// Fills the document-level delimiter and normalizes every field.
    pub fn normalize(&mut self) {
        if self.delimiter.is_none() {
            self.delimiter = Some(DEFAULT_DELIMITER.to_string());
        }
        for section in &mut self.sections {
            for field in &mut section.fields {
                field.normalize();
            }
        }
    }

    /// The empty error document shown when loading fails.
    pub fn error_fallback() -> Self {
        let mut cfg = GameConfig {
            title: Some("Error".to_string()),
            ..Default::default()
        };
        cfg.normalize();
        cfg
    }

    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.page_title.as_deref())
            .unwrap_or(FALLBACK_TITLE)
    }

    pub fn page_title(&self) -> &str {
        self.page_title
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(FALLBACK_TITLE)
    }

    pub fn delimiter(&self) -> &str {
        self.delimiter.as_deref().unwrap_or(DEFAULT_DELIMITER)
    }
}

pub trait ConfigStore {
    fn load(&self) -> GameConfig;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "qscout") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and normalizes the document, reporting what went wrong so the
    /// caller can surface it to the operator.
    pub fn try_load(&self) -> io::Result<GameConfig> {
        let bytes = fs::read(&self.path)?;
        let mut cfg: GameConfig = serde_json::from_slice(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        cfg.normalize();
        Ok(cfg)
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> GameConfig {
        self.try_load().unwrap_or_else(|_| GameConfig::error_fallback())
    }
}
