//! Error types for the protocol

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol error
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition {
        from: crate::RecordingState,
        to: crate::RecordingState,
    },
}

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Rejection code reported to the host for a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AlreadyRecording,
    NotAvailable,
    /// No foreground UI context to launch the permission prompt from
    #[serde(rename = "ACTIVITY_ERROR")]
    ActivityUnavailable,
    PermissionDenied,
    PermissionTimeout,
    ProjectionError,
    StartRecordingError,
    NotRecording,
    StopRecordingError,
}

impl ErrorCode {
    /// Wire string of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AlreadyRecording => "ALREADY_RECORDING",
            ErrorCode::NotAvailable => "NOT_AVAILABLE",
            ErrorCode::ActivityUnavailable => "ACTIVITY_ERROR",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::PermissionTimeout => "PERMISSION_TIMEOUT",
            ErrorCode::ProjectionError => "PROJECTION_ERROR",
            ErrorCode::StartRecordingError => "START_RECORDING_ERROR",
            ErrorCode::NotRecording => "NOT_RECORDING",
            ErrorCode::StopRecordingError => "STOP_RECORDING_ERROR",
        }
    }

    /// Whether the error was raised before any resource was touched
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ErrorCode::AlreadyRecording
                | ErrorCode::NotAvailable
                | ErrorCode::ActivityUnavailable
                | ErrorCode::NotRecording
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection payload handed to the host bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeError {
    pub code: ErrorCode,
    pub message: String,
}

impl BridgeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
