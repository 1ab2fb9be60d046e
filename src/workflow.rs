use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, KikitoriError};
use crate::media::{validate_input, MediaProcessorFactory, MediaProcessorTrait};
use crate::subtitle::{build_entries, write_outputs};
use crate::transcribe::{Mode, Transcriber, TranscriberFactory};

/// One invocation of the pipeline
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: PathBuf,
    pub mode: Mode,
    /// Also write a plain-text transcript
    pub write_txt: bool,
    pub output_dir: PathBuf,
}

/// File names derived from the input's stem
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub clean_audio: PathBuf,
    pub srt: PathBuf,
    pub txt: Option<PathBuf>,
}

impl OutputPaths {
    pub fn derive(input: &Path, output_dir: &Path, language: &str, write_txt: bool) -> Result<Self> {
        let stem = input
            .file_stem()
            .ok_or_else(|| KikitoriError::MissingInput(format!("{} has no file name", input.display())))?
            .to_string_lossy();

        Ok(Self {
            clean_audio: output_dir.join(format!("{}_clean.wav", stem)),
            srt: output_dir.join(format!("{}_{}.srt", stem, language)),
            txt: write_txt.then(|| output_dir.join(format!("{}_{}.txt", stem, language))),
        })
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Subtitle entries written
    pub entries: usize,
    /// End time of the last recognized segment, in seconds
    pub audio_duration: f64,
    pub srt_path: PathBuf,
    pub txt_path: Option<PathBuf>,
}

/// Deletes the intermediate audio file when dropped
struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Deleted temporary file: {}", self.path.display()),
            Err(e) => warn!("Failed to delete temporary file {}: {}", self.path.display(), e),
        }
    }
}

pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
    transcriber: Box<dyn Transcriber>,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        let transcriber = TranscriberFactory::create_default(config.transcriber.clone());
        Self::with_components(config, media, transcriber)
    }

    pub fn with_components(
        config: Config,
        media: Box<dyn MediaProcessorTrait>,
        transcriber: Box<dyn Transcriber>,
    ) -> Self {
        Self {
            config,
            media,
            transcriber,
        }
    }

    /// Validate, preprocess, transcribe and write subtitles.
    ///
    /// The intermediate wave file is removed on every exit path once
    /// preprocessing has been attempted.
    pub async fn run(&self, request: &RunRequest) -> Result<RunSummary> {
        self.media.check_availability().await?;
        validate_input(&request.input)?;

        let paths = OutputPaths::derive(
            &request.input,
            &request.output_dir,
            &self.config.transcriber.language,
            request.write_txt,
        )?;
        let _cleanup = TempFileGuard::new(&paths.clean_audio);

        with_spinner(
            "Preprocessing audio...",
            self.media.preprocess_audio(&request.input, &paths.clean_audio),
        )
        .await?;

        self.transcriber.load().await?;
        info!("Using {} mode with model {}", request.mode, self.transcriber.model_name());
        let options = request.mode.decoding_options();
        let segments = with_spinner(
            "Transcribing...",
            self.transcriber.transcribe(&paths.clean_audio, &options),
        )
        .await?;

        let entries = build_entries(&segments, self.config.subtitle.min_duration);
        write_outputs(&entries, &paths.srt, paths.txt.as_deref()).await?;

        Ok(RunSummary {
            entries: entries.len(),
            audio_duration: segments.last().map_or(0.0, |s| s.end),
            srt_path: paths.srt,
            txt_path: paths.txt,
        })
    }
}

/// Show a spinner while a long external call is awaited
async fn with_spinner<T, F>(message: &'static str, task: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = task.await;
    spinner.finish_and_clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessorTrait;
    use crate::transcribe::{MockTranscriber, Segment};
    use assert_fs::prelude::*;

    fn media_writing_wav() -> MockMediaProcessorTrait {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_check_availability().returning(|| Ok(()));
        media
            .expect_preprocess_audio()
            .times(1)
            .returning(|_, output| {
                std::fs::write(output, b"RIFF")?;
                Ok(())
            });
        media
    }

    fn transcriber_returning(segments: Vec<Segment>, mode: Mode) -> MockTranscriber {
        let expected = mode.decoding_options();
        let mut transcriber = MockTranscriber::new();
        transcriber.expect_load().returning(|| Ok(()));
        transcriber.expect_model_name().return_const("mock".to_string());
        transcriber
            .expect_transcribe()
            .withf(move |_, options| *options == expected)
            .times(1)
            .returning(move |audio, _| {
                assert!(audio.exists(), "cleaned audio should exist while transcribing");
                Ok(segments.clone())
            });
        transcriber
    }

    fn request_for(dir: &assert_fs::TempDir, txt: bool) -> RunRequest {
        let input = dir.child("interview.mp4");
        input.touch().unwrap();
        RunRequest {
            input: input.path().to_path_buf(),
            mode: Mode::Balanced,
            write_txt: txt,
            output_dir: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::derive(Path::new("/videos/talk.final.mkv"), Path::new("out"), "ja", true).unwrap();
        assert_eq!(paths.clean_audio, PathBuf::from("out/talk.final_clean.wav"));
        assert_eq!(paths.srt, PathBuf::from("out/talk.final_ja.srt"));
        assert_eq!(paths.txt, Some(PathBuf::from("out/talk.final_ja.txt")));

        let paths = OutputPaths::derive(Path::new("talk.mp3"), Path::new("."), "ja", false).unwrap();
        assert!(paths.txt.is_none());
    }

    #[tokio::test]
    async fn test_end_to_end_with_mock_segments() {
        let dir = assert_fs::TempDir::new().unwrap();
        let request = request_for(&dir, true);

        let segments = vec![
            Segment::new(0.0, 2.0, " おはようございます"),
            Segment::new(2.0, 2.3, "あ"),
            Segment::new(2.3, 4.0, "今日は"),
            Segment::new(4.0, 5.0, "今日は"),
            Segment::new(5.0, 5.0, "いい天気"),
            Segment::new(6.0, 7.25, "今日は"),
        ];

        let transcriber = transcriber_returning(segments, Mode::Balanced);

        let workflow = Workflow::with_components(
            Config::default(),
            Box::new(media_writing_wav()),
            Box::new(transcriber),
        );

        let summary = workflow.run(&request).await.unwrap();
        assert_eq!(summary.entries, 4);
        assert_eq!(summary.audio_duration, 7.25);

        let srt = std::fs::read_to_string(&summary.srt_path).unwrap();
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:02,000\nおはようございます\n\n\
             2\n00:00:02,300 --> 00:00:04,000\n今日は\n\n\
             3\n00:00:05,000 --> 00:00:05,500\nいい天気\n\n\
             4\n00:00:06,000 --> 00:00:07,250\n今日は\n\n"
        );

        let txt = std::fs::read_to_string(summary.txt_path.unwrap()).unwrap();
        assert_eq!(txt, "おはようございます\n今日は\nいい天気\n今日は\n");

        assert!(!dir.path().join("interview_clean.wav").exists());
    }

    #[tokio::test]
    async fn test_cleanup_after_transcription_failure() {
        let dir = assert_fs::TempDir::new().unwrap();
        let request = request_for(&dir, false);

        let mut transcriber = MockTranscriber::new();
        transcriber.expect_load().returning(|| Ok(()));
        transcriber.expect_model_name().return_const("mock".to_string());
        transcriber
            .expect_transcribe()
            .returning(|_, _| Err(KikitoriError::Transcription("decoder crashed".to_string())));

        let workflow = Workflow::with_components(
            Config::default(),
            Box::new(media_writing_wav()),
            Box::new(transcriber),
        );

        let err = workflow.run(&request).await.unwrap_err();
        assert!(matches!(err, KikitoriError::Transcription(_)));
        assert!(!dir.path().join("interview_clean.wav").exists());
        assert!(!dir.path().join("interview_ja.srt").exists());
    }

    #[tokio::test]
    async fn test_cleanup_after_model_load_failure() {
        let dir = assert_fs::TempDir::new().unwrap();
        let request = request_for(&dir, false);

        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_load()
            .returning(|| Err(KikitoriError::ModelLoad("no weights".to_string())));
        transcriber.expect_transcribe().never();

        let workflow = Workflow::with_components(
            Config::default(),
            Box::new(media_writing_wav()),
            Box::new(transcriber),
        );

        let err = workflow.run(&request).await.unwrap_err();
        assert_eq!(err.exit_code(), 6);
        assert!(!dir.path().join("interview_clean.wav").exists());
    }

    #[tokio::test]
    async fn test_cleanup_after_output_write_failure() {
        let dir = assert_fs::TempDir::new().unwrap();
        let request = request_for(&dir, false);
        // a directory where the subtitle file should go makes the write fail
        dir.child("interview_ja.srt").create_dir_all().unwrap();

        let transcriber = transcriber_returning(vec![Segment::new(0.0, 2.0, "こんにちは")], Mode::Balanced);

        let workflow = Workflow::with_components(
            Config::default(),
            Box::new(media_writing_wav()),
            Box::new(transcriber),
        );

        let err = workflow.run(&request).await.unwrap_err();
        assert!(matches!(err, KikitoriError::OutputWrite(_)));
        assert_eq!(err.exit_code(), 8);
        assert!(!dir.path().join("interview_clean.wav").exists());
    }

    #[tokio::test]
    async fn test_missing_input_stops_before_preprocessing() {
        let dir = assert_fs::TempDir::new().unwrap();
        let request = RunRequest {
            input: dir.path().join("absent.mp4"),
            mode: Mode::Fast,
            write_txt: false,
            output_dir: dir.path().to_path_buf(),
        };

        let mut media = MockMediaProcessorTrait::new();
        media.expect_check_availability().returning(|| Ok(()));
        media.expect_preprocess_audio().never();

        let workflow = Workflow::with_components(
            Config::default(),
            Box::new(media),
            Box::new(MockTranscriber::new()),
        );

        let err = workflow.run(&request).await.unwrap_err();
        assert!(matches!(err, KikitoriError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_missing_dependency_stops_run() {
        let dir = assert_fs::TempDir::new().unwrap();
        let request = request_for(&dir, false);

        let mut media = MockMediaProcessorTrait::new();
        media.expect_check_availability().returning(|| {
            Err(KikitoriError::MissingDependency {
                binary: "ffmpeg".to_string(),
                reason: "No such file or directory".to_string(),
            })
        });
        media.expect_preprocess_audio().never();

        let workflow = Workflow::with_components(
            Config::default(),
            Box::new(media),
            Box::new(MockTranscriber::new()),
        );

        let err = workflow.run(&request).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_preprocess_failure_leaves_no_partial_audio() {
        let dir = assert_fs::TempDir::new().unwrap();
        let request = request_for(&dir, false);

        let mut media = MockMediaProcessorTrait::new();
        media.expect_check_availability().returning(|| Ok(()));
        media.expect_preprocess_audio().returning(|_, output| {
            std::fs::write(output, b"partial")?;
            Err(KikitoriError::Preprocess("Invalid data found when processing input".to_string()))
        });

        let mut transcriber = MockTranscriber::new();
        transcriber.expect_load().never();

        let workflow = Workflow::with_components(
            Config::default(),
            Box::new(media),
            Box::new(transcriber),
        );

        let err = workflow.run(&request).await.unwrap_err();
        assert!(matches!(err, KikitoriError::Preprocess(_)));
        assert!(!dir.path().join("interview_clean.wav").exists());
    }
}
