use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Serialized form of a config or catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Json,
    Yaml,
}

impl DocFormat {
    /// `.yaml`/`.yml` are YAML; everything else is read as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DocFormat::Yaml,
            _ => DocFormat::Json,
        }
    }

    pub fn parse<T: for<'de> Deserialize<'de>>(self, text: &str) -> Result<T> {
        match self {
            DocFormat::Json => serde_json::from_str(text).context("parsing JSON"),
            DocFormat::Yaml => serde_yaml::from_str(text).context("parsing YAML"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed dice seed; entropy when absent.
    pub seed: Option<u64>,
    /// Entries returned by a log query when the caller gives no limit.
    pub log_limit: usize,
    /// Added to the d20 when rolling initiative for generated monsters.
    pub monster_initiative_bonus: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            log_limit: 50,
            monster_initiative_bonus: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterDefaults {
    pub max_monsters: u32,
    pub min_monsters: u32,
}

impl Default for EncounterDefaults {
    fn default() -> Self {
        Self {
            max_monsters: 10,
            min_monsters: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub encounter: EncounterDefaults,
    /// Monster catalog file used instead of the built-in one.
    pub catalog_path: Option<String>,
}

impl AppConfig {
    pub fn parse(text: &str, format: DocFormat) -> Result<Self> {
        format.parse(text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text, DocFormat::from_path(path))
            .with_context(|| format!("loading config {}", path.display()))
    }
}
