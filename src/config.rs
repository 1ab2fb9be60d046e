use serde::Deserialize;
use std::path::Path;
use crate::error::{Result, KikitoriError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
    pub subtitle: SubtitleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Output sample rate of the cleaned audio (Hz)
    pub sample_rate: u32,
    /// Output channel count of the cleaned audio
    pub channels: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Path to the whisper command-line tool
    pub binary_path: String,
    /// Pretrained model name passed to whisper
    pub model: String,
    /// Spoken language of the input
    pub language: String,
    /// Segments whose no-speech probability exceeds this are treated as silence
    pub no_speech_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Segments shorter than this (seconds) are dropped
    pub min_duration: f64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            sample_rate: 16000,
            channels: 1,
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper".to_string(),
            model: "large-v3".to_string(),
            language: "ja".to_string(),
            no_speech_threshold: 0.3,
        }
    }
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self { min_duration: 0.5 }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KikitoriError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    /// Load `explicit` if given, else `config.toml` in the working directory, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let local = Path::new("config.toml");
                if local.exists() {
                    tracing::info!("Found config.toml in current directory, loading...");
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
