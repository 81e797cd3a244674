use thiserror::Error;

#[derive(Debug, Error)]
pub enum CfrError {
    /// A history outside the fixed game tree reached the dispatch logic.
    #[error("invalid history: {0:?}")]
    InvalidHistory(String),

    /// Average strategy requested for an info set that has never been reached.
    #[error("info set {key} has no accumulated reach probability")]
    DegenerateAverageStrategy { key: String },

    #[error("failed to write progress log: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CfrError>;
