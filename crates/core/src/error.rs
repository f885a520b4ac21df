use tales_types::TextError;

/// Failure of a story generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation was cancelled")]
    Cancelled,
    #[error("generation failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("a title is required")]
    MissingTitle,
    #[error("a story is already being generated")]
    GenerationInProgress,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("failed to read sessions file: {0}")]
    SessionRead(std::io::Error),
    #[error("failed to parse sessions file: {0}")]
    SessionParse(serde_yaml::Error),
    #[error("failed to export story: {0}")]
    Export(std::io::Error),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),
}

pub type StoryResult<T> = std::result::Result<T, StoryError>;
