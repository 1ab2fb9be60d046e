// OpenAI Whisper command-line implementation

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, KikitoriError};
use super::{DecodingOptions, Segment, Transcriber};

/// Stderr fragments whisper prints when the model itself cannot be loaded
const MODEL_LOAD_MARKERS: &[&str] = &[
    "--model",
    "available models",
    "SHA256 checksum",
    "load_model",
];

/// Stderr lines kept when reporting a failed run
const STDERR_TAIL_LINES: usize = 20;

/// Whisper JSON output format
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperOutput {
    pub segments: Vec<WhisperSegment>,
    pub language: Option<String>,
}

/// Whisper segment format
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub avg_logprob: Option<f64>,
    pub no_speech_prob: Option<f64>,
}

impl From<WhisperSegment> for Segment {
    fn from(seg: WhisperSegment) -> Self {
        Segment::new(seg.start, seg.end, seg.text)
    }
}

/// Transcriber backed by the `whisper` command-line tool
pub struct WhisperTranscriber {
    config: TranscriberConfig,
}

impl WhisperTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    /// Arguments for a single full-file transcription run
    pub fn build_args(&self, audio_path: &Path, options: &DecodingOptions, output_dir: &Path) -> Vec<String> {
        let optional = |value: Option<u32>| value.map_or_else(|| "None".to_string(), |v| v.to_string());

        vec![
            audio_path.to_string_lossy().to_string(),
            "--model".to_string(), self.config.model.clone(),
            "--language".to_string(), self.config.language.clone(),
            "--task".to_string(), "transcribe".to_string(),
            "--word_timestamps".to_string(), "False".to_string(),
            "--condition_on_previous_text".to_string(), "False".to_string(),
            "--no_speech_threshold".to_string(), self.config.no_speech_threshold.to_string(),
            "--temperature".to_string(), options.temperature.to_string(),
            // a single fixed temperature, no fallback schedule
            "--temperature_increment_on_fallback".to_string(), "None".to_string(),
            "--beam_size".to_string(), optional(options.beam_size),
            "--best_of".to_string(), optional(options.best_of),
            "--output_format".to_string(), "json".to_string(),
            "--output_dir".to_string(), output_dir.to_string_lossy().to_string(),
            "--verbose".to_string(), "False".to_string(),
        ]
    }

    /// Parse whisper's JSON result into segments
    pub fn parse_output(json: &str) -> Result<Vec<Segment>> {
        let output: WhisperOutput = serde_json::from_str(json)
            .map_err(|e| KikitoriError::Transcription(format!("Failed to parse Whisper JSON: {}", e)))?;

        if let Some(language) = &output.language {
            debug!("Whisper reported language: {}", language);
        }
        for seg in &output.segments {
            debug!(
                "Segment {:.2}-{:.2}s avg_logprob={:?} no_speech_prob={:?}",
                seg.start, seg.end, seg.avg_logprob, seg.no_speech_prob
            );
        }

        Ok(output.segments.into_iter().map(Segment::from).collect())
    }

    /// Whisper's own account of a run that produced no result: the
    /// `Skipping <file> due to ...` notice from stdout plus the tail of stderr.
    fn failure_report(stdout: &str, stderr: &str) -> String {
        let mut lines: Vec<&str> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("Skipping"))
            .collect();

        let stderr_lines: Vec<&str> = stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();
        let tail_start = stderr_lines.len().saturating_sub(STDERR_TAIL_LINES);
        lines.extend(&stderr_lines[tail_start..]);

        if lines.is_empty() {
            "whisper exited without producing a transcript".to_string()
        } else {
            lines.join("\n")
        }
    }

    fn classify_failure(stderr: &str) -> KikitoriError {
        let stderr = stderr.trim().to_string();
        if MODEL_LOAD_MARKERS.iter().any(|marker| stderr.contains(marker)) {
            KikitoriError::ModelLoad(stderr)
        } else {
            KikitoriError::Transcription(stderr)
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn load(&self) -> Result<()> {
        info!("Loading Whisper {} model...", self.config.model);

        let output = Command::new(&self.config.binary_path)
            .arg("--help")
            .output()
            .await
            .map_err(|e| KikitoriError::ModelLoad(format!(
                "{} command not found: {}",
                self.config.binary_path, e
            )))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KikitoriError::ModelLoad(format!(
                "{} is not usable: {}",
                self.config.binary_path,
                stderr.trim()
            )));
        }

        Ok(())
    }

    async fn transcribe(&self, audio_path: &Path, options: &DecodingOptions) -> Result<Vec<Segment>> {
        info!("Transcribing...");

        let temp_dir = tempfile::tempdir()
            .map_err(|e| KikitoriError::Transcription(format!("Failed to create temp directory: {}", e)))?;
        let output_dir = temp_dir.path();

        let args = self.build_args(audio_path, options, output_dir);
        debug!("Executing {} {:?}", self.config.binary_path, args);

        let output = Command::new(&self.config.binary_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| KikitoriError::Transcription(format!("Failed to execute whisper: {}", e)))?;

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| KikitoriError::Transcription("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_stem.to_string_lossy()));

        // whisper catches inference errors per file and still exits 0
        if !output.status.success() || !json_file.exists() {
            let report = Self::failure_report(
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
            );
            return Err(Self::classify_failure(&report));
        }

        let json_content = tokio::fs::read_to_string(&json_file)
            .await
            .map_err(|e| KikitoriError::Transcription(format!(
                "Failed to read {}: {}",
                json_file.display(),
                e
            )))?;

        Self::parse_output(&json_content)
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}
