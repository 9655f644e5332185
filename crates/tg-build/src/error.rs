use thiserror::Error;

use tg_core::CoreError;

use crate::sequence::SequenceError;

/// Errors that abort a build.
///
/// Malformed input never surfaces here; it is counted in
/// [`DataQuality`](tg_core::DataQuality) and skipped.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("edge sequence: {0}")]
    Sequence(#[from] SequenceError),

    #[error("{what} exceeds the 32-bit index space")]
    Overflow { what: &'static str },

    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),
}

pub type BuildResult<T> = Result<T, BuildError>;
