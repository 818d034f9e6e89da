//! Screen-capture permission requests
//!
//! The platform answers a capture request out-of-band: `request_capture`
//! only launches the prompt, and the grant or denial is delivered later to
//! whoever consumes the result (the recording session). Results are matched
//! to requests by request code.

use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::time::Instant;
use tracing::debug;

use crate::{CaptureError, CaptureResult};

/// Request code attached to every screen-capture prompt
pub const REQUEST_MEDIA_PROJECTION: i32 = 1001;

/// Platform result code for an accepted prompt
pub const RESULT_OK: i32 = -1;

/// Platform-issued credential authorizing a projection
#[derive(Clone)]
pub struct GrantToken {
    result_code: i32,
    payload: Bytes,
}

impl GrantToken {
    pub fn new(result_code: i32, payload: impl Into<Bytes>) -> Self {
        Self {
            result_code,
            payload: payload.into(),
        }
    }

    pub fn result_code(&self) -> i32 {
        self.result_code
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

impl std::fmt::Debug for GrantToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantToken")
            .field("result_code", &self.result_code)
            .field("payload", &format_args!("<{} bytes>", self.payload.len()))
            .finish()
    }
}

/// Result of a capture prompt
#[derive(Debug, Clone)]
pub enum PermissionOutcome {
    Granted(GrantToken),
    Denied,
}

impl PermissionOutcome {
    /// Fold the platform's `(granted, token)` pair; a grant without a token counts as denial
    pub fn from_result(granted: bool, token: Option<GrantToken>) -> Self {
        match (granted, token) {
            (true, Some(token)) => PermissionOutcome::Granted(token),
            _ => PermissionOutcome::Denied,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionOutcome::Granted(_))
    }
}

/// Issues capture prompts to the platform
pub trait PermissionBroker: Send + Sync {
    /// Launch the prompt; the outcome arrives later through a side channel
    fn request_capture(&self, request_code: i32) -> CaptureResult<()>;
}

/// A prompt waiting for the user
#[derive(Debug, Clone)]
pub struct PermissionRequest {
    pub request_code: i32,
    pub issued_at: Instant,
}

/// Broker that hands every prompt to a channel drained by the platform UI
#[derive(Debug, Clone)]
pub struct ChannelBroker {
    tx: Sender<PermissionRequest>,
}

impl ChannelBroker {
    pub fn new() -> (Self, Receiver<PermissionRequest>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl PermissionBroker for ChannelBroker {
    fn request_capture(&self, request_code: i32) -> CaptureResult<()> {
        debug!("Forwarding capture prompt (request code {})", request_code);
        self.tx
            .send(PermissionRequest {
                request_code,
                issued_at: Instant::now(),
            })
            .map_err(|_| CaptureError::PermissionRequest("permission UI is gone".to_string()))
    }
}
