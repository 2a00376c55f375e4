use thiserror::Error;

/// A label that is not part of a closed vocabulary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} label: {label:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

/// Failures of the external cache collaborator.
///
/// These never reach engine callers; the engine logs them and keeps running
/// on local state.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache rejected write for key {key}: {reason}")]
    Rejected { key: String, reason: String },

    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
