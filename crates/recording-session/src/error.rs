//! Recording session error types

use capture::CaptureError;
use encoder::EncoderError;
use recording_protocol::{BridgeError, ErrorCode};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Screen capture is not available on this platform")]
    NotAvailable,

    #[error("No foreground activity to show the capture prompt")]
    ActivityUnavailable,

    #[error("Screen recording permission was denied")]
    PermissionDenied,

    #[error("No permission result within {0:?}")]
    PermissionTimeout(Duration),

    #[error("Projection error: {0}")]
    Projection(#[source] CaptureError),

    #[error("Encoder configuration failed: {0}")]
    Configuration(#[source] EncoderError),

    #[error("Encoder start failed: {0}")]
    EncoderStart(#[source] EncoderError),

    #[error("Start recording failed: {0}")]
    StartRecording(String),

    #[error("Not recording")]
    NotRecording,

    #[error("Stop recording failed: {0}")]
    StopRecording(String),
}

pub type RecordingResult<T> = Result<T, RecordingError>;

impl RecordingError {
    /// Rejection code reported to the host
    pub fn code(&self) -> ErrorCode {
        match self {
            RecordingError::AlreadyRecording => ErrorCode::AlreadyRecording,
            RecordingError::NotAvailable => ErrorCode::NotAvailable,
            RecordingError::ActivityUnavailable => ErrorCode::ActivityUnavailable,
            RecordingError::PermissionDenied => ErrorCode::PermissionDenied,
            RecordingError::PermissionTimeout(_) => ErrorCode::PermissionTimeout,
            RecordingError::Projection(_) => ErrorCode::ProjectionError,
            RecordingError::Configuration(_)
            | RecordingError::EncoderStart(_)
            | RecordingError::StartRecording(_) => ErrorCode::StartRecordingError,
            RecordingError::NotRecording => ErrorCode::NotRecording,
            RecordingError::StopRecording(_) => ErrorCode::StopRecordingError,
        }
    }

    pub fn to_bridge_error(&self) -> BridgeError {
        BridgeError::new(self.code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_failures_report_start_error() {
        let configure =
            RecordingError::Configuration(EncoderError::Configuration("bad path".into()));
        let start = RecordingError::EncoderStart(EncoderError::Start("surface gone".into()));
        assert_eq!(configure.code(), ErrorCode::StartRecordingError);
        assert_eq!(start.code(), ErrorCode::StartRecordingError);
    }

    #[test]
    fn test_bridge_error_carries_message() {
        let err = RecordingError::Projection(CaptureError::Projection("revoked".into()));
        let bridge = err.to_bridge_error();
        assert_eq!(bridge.code, ErrorCode::ProjectionError);
        assert!(bridge.message.contains("revoked"));
    }

    #[test]
    fn test_precondition_codes() {
        for err in [
            RecordingError::AlreadyRecording,
            RecordingError::NotAvailable,
            RecordingError::ActivityUnavailable,
            RecordingError::NotRecording,
        ] {
            assert!(err.code().is_precondition(), "{err}");
        }
        assert!(!RecordingError::PermissionDenied.code().is_precondition());
    }
}
