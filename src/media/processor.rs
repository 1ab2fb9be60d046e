use async_trait::async_trait;
use std::path::Path;
use tracing::{info, debug};

use crate::config::MediaConfig;
use crate::error::{Result, KikitoriError};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }

    fn missing(&self, reason: String) -> KikitoriError {
        KikitoriError::MissingDependency {
            binary: self.config.binary_path.clone(),
            reason,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn check_availability(&self) -> Result<()> {
        self.get_version_info().await?;
        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let stdout = self
            .command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| match e {
                KikitoriError::Preprocess(msg) => self.missing(msg),
                other => other,
            })?;

        Ok(stdout.lines().next().unwrap_or("Unknown version").to_string())
    }

    async fn preprocess_audio(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        info!("Preprocessing audio with {}...", self.config.binary_path);
        debug!("{} -> {}", input_path.display(), output_path.display());

        self.command_builder
            .clean_audio(
                input_path,
                output_path,
                self.config.sample_rate,
                self.config.channels,
            )
            .execute()
            .await?;

        info!("Cleaned audio saved to {}", output_path.display());
        Ok(())
    }
}
