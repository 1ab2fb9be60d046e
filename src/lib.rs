//! Kikitori - Japanese subtitle transcription
//!
//! Cleans the audio track of a video or audio file with ffmpeg, transcribes it
//! with a pretrained Whisper model and writes SRT subtitles plus an optional
//! plain-text transcript.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod transcribe;
pub mod subtitle;
pub mod media;
pub mod error;
