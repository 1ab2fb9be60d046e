// Transcription engine adapter
//
// The pipeline talks to speech recognition through the Transcriber trait.
// WhisperTranscriber drives the `whisper` command-line tool; tests substitute
// a mock that returns canned segments.

pub mod whisper;

use async_trait::async_trait;
use std::path::Path;

use crate::config::TranscriberConfig;
use crate::error::Result;

pub use whisper::WhisperTranscriber;

/// A time-bounded unit of recognized speech
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Seconds from the start of the audio
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Speed/accuracy preset for decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Sampling with best-of-3 candidates
    Fast,
    /// Beam search, width 2
    #[default]
    Balanced,
    /// Beam search, width 5
    Accurate,
}

/// Decoding search parameters handed to the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingOptions {
    /// Beam width; `None` selects sampling-based decoding
    pub beam_size: Option<u32>,
    /// Number of sampled candidates; only meaningful without a beam
    pub best_of: Option<u32>,
    pub temperature: f32,
}

impl Mode {
    pub fn decoding_options(self) -> DecodingOptions {
        match self {
            Mode::Fast => DecodingOptions {
                beam_size: None,
                best_of: Some(3),
                temperature: 0.3,
            },
            Mode::Balanced => DecodingOptions {
                beam_size: Some(2),
                best_of: None,
                temperature: 0.0,
            },
            Mode::Accurate => DecodingOptions {
                beam_size: Some(5),
                best_of: None,
                temperature: 0.0,
            },
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Fast => write!(f, "fast"),
            Mode::Balanced => write!(f, "balanced"),
            Mode::Accurate => write!(f, "accurate"),
        }
    }
}

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Make sure the model can be loaded before any audio is submitted
    async fn load(&self) -> Result<()>;

    /// Run the model once over the whole audio file
    async fn transcribe(&self, audio_path: &Path, options: &DecodingOptions) -> Result<Vec<Segment>>;

    /// Human-readable model name for status output
    fn model_name(&self) -> String;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the default transcriber (OpenAI whisper command-line tool)
    pub fn create_default(config: TranscriberConfig) -> Box<dyn Transcriber> {
        Box::new(WhisperTranscriber::new(config))
    }
}
