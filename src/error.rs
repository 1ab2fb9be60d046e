use thiserror::Error;

#[derive(Error, Debug)]
pub enum KikitoriError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{binary} is not installed or not in your PATH: {reason}")]
    MissingDependency { binary: String, reason: String },

    #[error("File not found: {0}")]
    MissingInput(String),

    #[error("ffmpeg failed: {0}")]
    Preprocess(String),

    #[error("Failed to load Whisper model: {0}")]
    ModelLoad(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Failed to write output files: {0}")]
    OutputWrite(String),
}

impl KikitoriError {
    /// Process exit status for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            KikitoriError::Io(_) => 1,
            KikitoriError::Config(_) => 2,
            KikitoriError::MissingDependency { .. } => 3,
            KikitoriError::MissingInput(_) => 4,
            KikitoriError::Preprocess(_) => 5,
            KikitoriError::ModelLoad(_) => 6,
            KikitoriError::Transcription(_) => 7,
            KikitoriError::OutputWrite(_) => 8,
        }
    }
}

impl From<toml::de::Error> for KikitoriError {
    fn from(e: toml::de::Error) -> Self {
        KikitoriError::Config(format!("Failed to parse config file: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, KikitoriError>;
