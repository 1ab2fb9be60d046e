use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::transcribe::Mode;

/// Transcribe Japanese audio/video to clean subtitles using Whisper
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to video or audio file (e.g. .mp4, .mkv, .mp3)
    pub input: PathBuf,

    /// Also output a plain .txt transcript
    #[arg(long)]
    pub txt: bool,

    /// Transcription mode: fast (no beam), balanced (beam=2), accurate (beam=5)
    #[arg(long, value_enum, default_value_t = ModeArg::Balanced)]
    pub mode: ModeArg,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the subtitle files (defaults to the current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Fast,
    Balanced,
    Accurate,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Fast => Mode::Fast,
            ModeArg::Balanced => Mode::Balanced,
            ModeArg::Accurate => Mode::Accurate,
        }
    }
}
