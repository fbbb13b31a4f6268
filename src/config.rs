//! Configuration loader.
//!
//! Merges built-in defaults, `voice-pdf-assistant.toml` (or an explicit file)
//! and `APP_*` environment variables, with `__` separating nested keys.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_CONFIG_FILE: &str = "voice-pdf-assistant.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extract: ExtractSettings,
    pub rank: RankSettings,
    pub embedding: EmbeddingSettings,
    pub voice: VoiceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub paragraph_min_chars: usize,
    pub heading_min_font_size: f32,
    pub heading_max_words: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            paragraph_min_chars: 40,
            heading_min_font_size: 14.0,
            heading_max_words: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankSettings {
    pub min_paragraph_chars: usize,
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            min_paragraph_chars: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    FastEmbed,
    Hashing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub cache_dir: Option<String>,
    pub show_download_progress: bool,
    pub hashing_dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::FastEmbed,
            cache_dir: None,
            show_download_progress: true,
            hashing_dimension: 384,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    pub enabled: bool,
    pub model_dir: String,
    pub sample_rate: u32,
    pub chunk_frames: usize,
    pub stop_word: String,
    /// Normalized 0.0..=1.0 speaking rate; `None` keeps the engine default.
    pub speech_rate: Option<f32>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            model_dir: "vosk-model-small-en-us-0.15".to_string(),
            sample_rate: 16_000,
            chunk_frames: 4096,
            stop_word: "stop".to_string(),
            speech_rate: None,
        }
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load from the default file (if present) plus environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"));
        Ok(Self::from_figment(figment))
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(self.figment.extract()?)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(self.figment.extract_inner(key)?)
    }
}

impl VoiceSettings {
    pub fn model_path(&self) -> PathBuf {
        expand_path(&self.model_dir)
    }
}

impl EmbeddingSettings {
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache_dir.as_deref().map(expand_path).or_else(|| {
            dirs::cache_dir().map(|dir| dir.join("voice-pdf-assistant").join("fastembed"))
        })
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_path(input: &str) -> PathBuf {
    match input.strip_prefix('~') {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(input),
        },
        None => PathBuf::from(input),
    }
}
