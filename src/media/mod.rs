// Media processing
//
// - Commands: ffmpeg command and audio filter graph builders
// - Processor: ffmpeg-backed implementation of MediaProcessorTrait

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::{Result, KikitoriError};

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Check that the media processor binary can be executed
    async fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;

    /// Clean the audio track of `input_path` into a mono PCM wave file at `output_path`
    async fn preprocess_audio(&self, input_path: &Path, output_path: &Path) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}

/// Fail with `MissingInput` unless `path` exists on disk
pub fn validate_input(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(KikitoriError::MissingInput(path.display().to_string()))
    }
}
