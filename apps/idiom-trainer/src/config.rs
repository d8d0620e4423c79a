//! Configuration for idiom trainer.

use idiom_core::{Bucket, QuizMode, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "idiom-trainer";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub study: StudyConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|err| {
                eprintln!("Ignoring invalid config {}: {}", path.display(), err);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Write the defaults out on first run so there is a file to edit.
    pub fn write_default_if_missing(&self) -> anyhow::Result<()> {
        match Self::config_path() {
            Some(path) if !path.exists() => self.save(),
            _ => Ok(()),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(self)?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Progress database location, `data.db_path` taking precedence.
    pub fn db_path(&self) -> PathBuf {
        self.data
            .db_path
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("progress.db")))
            .unwrap_or_else(|| "progress.db".into())
    }

    /// Log file location, next to the database unless configured.
    pub fn log_path(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("idiom-trainer.log")))
            .unwrap_or_else(|| "idiom-trainer.log".into())
    }

    fn data_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME).map(|d| d.data_dir().to_path_buf())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub auto_reveal: bool,
    #[serde(default)]
    pub default_bucket: Bucket,
}

fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            auto_reveal: false,
            default_bucket: Bucket::All,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default)]
    pub default_mode: QuizMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON dataset replacing the bundled one.
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}
