use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, KikitoriError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Suppress ffmpeg's banner and progress output
    pub fn quiet(self) -> Self {
        self.arg("-hide_banner").arg("-loglevel").arg("error")
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Add audio filter graph
    pub fn audio_filter(self, chain: &AudioFilterChain) -> Self {
        self.arg("-af").arg(chain.to_string())
    }

    /// Execute the command, returning captured stdout on success
    pub async fn execute(&self) -> Result<String> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| KikitoriError::MissingDependency {
                binary: self.binary_path.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KikitoriError::Preprocess(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// A single ffmpeg audio filter
#[derive(Debug, Clone, PartialEq)]
pub enum AudioFilter {
    HighPass { cutoff_hz: u32 },
    LowPass { cutoff_hz: u32 },
    /// FFT-based spectral noise reduction
    Denoise,
    DynamicNormalize { frame_ms: u32, gauss_size: u32 },
    Compand {
        attacks: f32,
        decays: f32,
        /// Transfer function as (input dB, output dB) pairs
        points: Vec<(i32, i32)>,
        soft_knee: u32,
    },
    Gain { db: i32 },
}

impl std::fmt::Display for AudioFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFilter::HighPass { cutoff_hz } => write!(f, "highpass=f={}", cutoff_hz),
            AudioFilter::LowPass { cutoff_hz } => write!(f, "lowpass=f={}", cutoff_hz),
            AudioFilter::Denoise => write!(f, "afftdn"),
            AudioFilter::DynamicNormalize { frame_ms, gauss_size } => {
                write!(f, "dynaudnorm=f={}:g={}", frame_ms, gauss_size)
            }
            AudioFilter::Compand { attacks, decays, points, soft_knee } => {
                let points = points
                    .iter()
                    .map(|(input, output)| format!("{}/{}", input, output))
                    .collect::<Vec<_>>()
                    .join("|");
                write!(
                    f,
                    "compand=attacks={}:decays={}:points={}:soft-knee={}",
                    attacks, decays, points, soft_knee
                )
            }
            AudioFilter::Gain { db } => write!(f, "volume={}dB", db),
        }
    }
}

/// Ordered ffmpeg filter graph, rendered as a comma-separated `-af` argument
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFilterChain {
    filters: Vec<AudioFilter>,
}

impl AudioFilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, filter: AudioFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[AudioFilter] {
        &self.filters
    }

    /// Speech cleaning preset: band-limit to the voice range, denoise,
    /// normalize, compress, then boost.
    pub fn cleaning() -> Self {
        Self::new()
            .then(AudioFilter::HighPass { cutoff_hz: 100 })
            .then(AudioFilter::LowPass { cutoff_hz: 3000 })
            .then(AudioFilter::Denoise)
            .then(AudioFilter::DynamicNormalize { frame_ms: 150, gauss_size: 20 })
            .then(AudioFilter::Compand {
                attacks: 0.3,
                decays: 0.8,
                points: vec![(-80, -80), (-20, -5), (0, -3)],
                soft_knee: 6,
            })
            .then(AudioFilter::Gain { db: 6 })
    }
}

impl std::fmt::Display for AudioFilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .filters
            .iter()
            .map(|filter| filter.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&rendered)
    }
}

/// Builder for the media operations the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build the audio cleaning command producing 16-bit PCM wave output
    pub fn clean_audio<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        sample_rate: u32,
        channels: u32,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio preprocessing")
            .quiet()
            .overwrite()
            .input(input_path)
            .no_video()
            .audio_filter(&AudioFilterChain::cleaning())
            .audio_sample_rate(sample_rate)
            .audio_channels(channels)
            .audio_codec("pcm_s16le")
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}
