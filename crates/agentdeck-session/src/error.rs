use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("No agent selected")]
    NoAgentSelected,

    #[error("A run is already in progress")]
    RunInProgress,

    #[error("Agent not found: {name}: {reason:#}")]
    AgentNotFound { name: String, reason: anyhow::Error },

    #[error("Agent directory error: {0:#}")]
    Directory(anyhow::Error),

    #[error("Conversation store error: {0:#}")]
    Store(anyhow::Error),

    #[error("Upload failed: {0:#}")]
    Upload(anyhow::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),
}

pub type Result<T> = std::result::Result<T, SessionError>;
