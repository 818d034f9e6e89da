//! Status reply returned to the host

use serde::{Deserialize, Serialize};

/// Reply of `getRecordingStatus`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStatus {
    pub is_recording: bool,
    /// Most recent start/stop failure, `None` after a clean start or stop
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_shape() {
        let status = RecordingStatus {
            is_recording: true,
            error: None,
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value, serde_json::json!({ "isRecording": true, "error": null }));
    }

    #[test]
    fn test_status_with_error() {
        let status: RecordingStatus =
            serde_json::from_str(r#"{"isRecording":false,"error":"stop failed"}"#).unwrap();
        assert!(!status.is_recording);
        assert_eq!(status.error.as_deref(), Some("stop failed"));
    }
}
