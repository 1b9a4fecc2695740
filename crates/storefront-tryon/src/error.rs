//! Try-on error types.

use edge_data::FetchError;
use thiserror::Error;

/// Errors from a try-on job.
#[derive(Error, Debug)]
pub enum TryOnError {
    /// The uploaded file has no content.
    #[error("uploaded image is empty")]
    EmptyImage,

    /// A job was requested before any image was uploaded.
    #[error("no image uploaded")]
    NoUpload,

    /// A job is already running for this session.
    #[error("a try-on job is already processing")]
    AlreadyProcessing,

    /// The queue reported the job as failed.
    #[error("try-on job failed: {0}")]
    JobFailed(String),

    /// The job finished without any output image.
    #[error("try-on job returned no images")]
    EmptyResult,

    /// The queue answered with something unexpected.
    #[error("invalid queue response: {0}")]
    InvalidResponse(String),

    /// The job was cancelled by closing the session.
    #[error("try-on job aborted")]
    Aborted,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type TryOnResult<T> = Result<T, TryOnError>;
