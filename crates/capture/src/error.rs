//! Capture error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screen capture not available")]
    NotAvailable,

    #[error("Projection could not be created: {0}")]
    Projection(String),

    #[error("Virtual display creation failed: {0}")]
    VirtualDisplay(String),

    #[error("Permission request failed: {0}")]
    PermissionRequest(String),

    #[error("Capture surface has been released")]
    SurfaceReleased,

    #[error("Capture resource not acquired")]
    NotAcquired,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
