//! Encoder error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Unsupported resolution: {width}x{height}")]
    UnsupportedResolution { width: u32, height: u32 },

    #[error("Encoder start failed: {0}")]
    Start(String),

    #[error("Encoder stop failed: {0}")]
    Stop(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EncoderResult<T> = Result<T, EncoderError>;
