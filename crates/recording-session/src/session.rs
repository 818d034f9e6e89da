//! Recording session state machine
//!
//! `start_recording` parks a continuation in the pending slot and waits;
//! the platform later delivers the prompt result through
//! [`RecordingSession::on_permission_result`], possibly on another thread,
//! which acquires capture and encoder and resolves the continuation once.
//! Every mutation of state, the pending slot and the resource handles goes
//! through the single session mutex.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use capture::{
    CaptureResource, GrantToken, PermissionOutcome, REQUEST_MEDIA_PROJECTION,
    VirtualDisplayConfig,
};
use encoder::{Encoder, EncoderBackend, EncoderError, EncoderStats, EncodingParams};
use recording_protocol::{RecordingState, RecordingStatus, SessionId};

use crate::{OutputNamer, RecorderConfig, RecorderPlatform, RecordingError, RecordingResult};

/// Continuation of a `start_recording` call waiting for the prompt result
struct PendingPermission {
    ticket: u64,
    session_id: SessionId,
    issued_at: Instant,
    reply: oneshot::Sender<RecordingResult<()>>,
}

struct SessionInner {
    state: RecordingState,
    /// `Some` exactly while `state == AwaitingPermission`
    pending: Option<PendingPermission>,
    capture: Option<CaptureResource>,
    encoder: Option<Encoder>,
    session_id: Option<SessionId>,
    last_error: Option<String>,
    output_path: Option<PathBuf>,
    next_ticket: u64,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            pending: None,
            capture: None,
            encoder: None,
            session_id: None,
            last_error: None,
            output_path: None,
            next_ticket: 0,
        }
    }

    fn set_state(&mut self, next: RecordingState) {
        if let Err(e) = self.state.validate_transition(next) {
            error!("{}", e);
        }
        debug!("Recording state: {} -> {}", self.state, next);
        self.state = next;
    }

    fn record_error(&mut self, err: &RecordingError) {
        self.last_error = Some(err.to_string());
    }

    fn log_id(&self) -> String {
        self.session_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// The screen recorder
///
/// Construct one per process at startup and share it (`Arc`) between the
/// host bridge and whatever delivers permission results. `stop_recording`
/// must be awaited inside a Tokio runtime.
pub struct RecordingSession {
    config: RecorderConfig,
    platform: RecorderPlatform,
    params: EncodingParams,
    display: VirtualDisplayConfig,
    namer: OutputNamer,
    inner: Arc<Mutex<SessionInner>>,
}

impl RecordingSession {
    pub fn new(config: RecorderConfig, platform: RecorderPlatform) -> Self {
        let params = EncodingParams::with_container(config.container);
        Self::with_params(config, platform, params)
    }

    fn with_params(
        config: RecorderConfig,
        platform: RecorderPlatform,
        params: EncodingParams,
    ) -> Self {
        let display = VirtualDisplayConfig {
            width: params.width,
            height: params.height,
            target_fps: params.fps,
            ..Default::default()
        };

        let session = Self {
            config,
            platform,
            params,
            display,
            namer: OutputNamer::new(),
            inner: Arc::new(Mutex::new(SessionInner::new())),
        };
        if let Err(e) = session.check_encoder() {
            warn!("Every start_recording will fail: {}", e);
        }
        session
    }

    /// Whether the encoder backend accepts the configured encoding parameters
    pub fn check_encoder(&self) -> RecordingResult<()> {
        let backend = self.platform.encoders.create();
        backend
            .check_params(&self.params)
            .map_err(RecordingError::Configuration)
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Whether the platform has a screen-capture service
    pub fn is_available(&self) -> bool {
        self.platform.projections.is_available()
    }

    pub fn state(&self) -> RecordingState {
        self.inner.lock().state
    }

    pub fn is_recording(&self) -> bool {
        self.state() == RecordingState::Active
    }

    pub fn recording_status(&self) -> RecordingStatus {
        let inner = self.inner.lock();
        RecordingStatus {
            is_recording: inner.state == RecordingState::Active,
            error: inner.last_error.clone(),
        }
    }

    /// File of the current or most recent recording
    pub fn last_output_path(&self) -> Option<PathBuf> {
        self.inner.lock().output_path.clone()
    }

    pub fn has_pending_request(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// Ask for capture permission and start recording once it is granted
    ///
    /// Resolves `true` once capture and encoder are running. Without a
    /// configured permission timeout this waits for as long as the platform
    /// takes to deliver a result.
    pub async fn start_recording(&self) -> RecordingResult<bool> {
        let (ticket, mut reply) = self.begin_start()?;

        if let Err(e) = self
            .platform
            .broker
            .request_capture(REQUEST_MEDIA_PROJECTION)
        {
            let err = RecordingError::StartRecording(e.to_string());
            if self.abandon_pending(ticket, &err) {
                return Err(err);
            }
        }

        let delivered = match self.config.permission_timeout() {
            None => reply.await,
            Some(limit) => match tokio::time::timeout(limit, &mut reply).await {
                Ok(delivered) => delivered,
                Err(_) => {
                    let err = RecordingError::PermissionTimeout(limit);
                    if self.abandon_pending(ticket, &err) {
                        return Err(err);
                    }
                    // A result claimed the slot just before the deadline
                    reply.await
                }
            },
        };

        match delivered {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RecordingError::StartRecording(
                "permission request was dropped".to_string(),
            )),
        }
    }

    /// Precondition checks and pending-slot registration, all under the lock
    fn begin_start(&self) -> RecordingResult<(u64, oneshot::Receiver<RecordingResult<()>>)> {
        let mut inner = self.inner.lock();

        if inner.state.is_busy() {
            warn!(
                "[{}] start_recording rejected: session is {}",
                inner.log_id(),
                inner.state
            );
            return Err(RecordingError::AlreadyRecording);
        }
        if !self.is_available() {
            return Err(RecordingError::NotAvailable);
        }
        if !self.platform.host.has_foreground_ui() {
            return Err(RecordingError::ActivityUnavailable);
        }

        let (tx, rx) = oneshot::channel();
        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        let session_id = SessionId::new();

        inner.session_id = Some(session_id);
        inner.pending = Some(PendingPermission {
            ticket,
            session_id,
            issued_at: Instant::now(),
            reply: tx,
        });
        inner.set_state(RecordingState::AwaitingPermission);

        info!("[{}] Requesting screen capture permission", session_id);
        Ok((ticket, rx))
    }

    /// Drop our own pending request; `false` if a result already claimed it
    fn abandon_pending(&self, ticket: u64, err: &RecordingError) -> bool {
        let mut inner = self.inner.lock();
        match inner.pending.as_ref() {
            Some(pending) if pending.ticket == ticket => {}
            _ => return false,
        }

        inner.pending = None;
        inner.set_state(RecordingState::Idle);
        inner.record_error(err);
        warn!("[{}] Permission request abandoned: {}", inner.log_id(), err);
        inner.session_id = None;
        true
    }

    /// Deliver the platform's answer to the capture prompt
    ///
    /// Safe to call from any thread. Results for other request codes and
    /// results with nothing pending are ignored.
    pub fn on_permission_result(&self, request_code: i32, outcome: PermissionOutcome) {
        if request_code != REQUEST_MEDIA_PROJECTION {
            debug!("Ignoring result for request code {}", request_code);
            return;
        }

        let mut inner = self.inner.lock();
        let Some(pending) = inner.pending.take() else {
            debug!("Permission result with no pending request, ignoring");
            return;
        };

        let session_id = pending.session_id;
        debug!(
            "[{}] Permission result after {:?}: granted={}",
            session_id,
            pending.issued_at.elapsed(),
            outcome.is_granted()
        );

        let result = match outcome {
            PermissionOutcome::Denied => Err(RecordingError::PermissionDenied),
            PermissionOutcome::Granted(grant) => self.activate(&mut inner, grant),
        };

        match &result {
            Ok(()) => {
                inner.last_error = None;
                inner.set_state(RecordingState::Active);
                info!(
                    "[{}] Screen recording started -> {}",
                    session_id,
                    inner
                        .output_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                );
            }
            Err(e) => {
                inner.record_error(e);
                inner.set_state(RecordingState::Idle);
                inner.session_id = None;
                error!("[{}] Error starting recording: {}", session_id, e);
            }
        }
        drop(inner);

        if pending.reply.send(result).is_err() {
            warn!(
                "[{}] start_recording caller went away before the permission result",
                session_id
            );
        }
    }

    /// Acquire capture, then arm and start the encoder
    ///
    /// Anything acquired here is released by drop if a later step fails.
    fn activate(&self, inner: &mut SessionInner, grant: GrantToken) -> RecordingResult<()> {
        let capture =
            CaptureResource::acquire(self.platform.projections.as_ref(), grant, &self.display)
                .map_err(RecordingError::Projection)?;
        let surface = capture.surface().map_err(RecordingError::Projection)?;

        let output_dir = self
            .config
            .output_dir
            .clone()
            .or_else(|| self.platform.host.files_dir())
            .ok_or_else(|| {
                RecordingError::Configuration(EncoderError::Configuration(
                    "no writable output directory".to_string(),
                ))
            })?;
        let output_path =
            self.namer
                .next_path(&output_dir, &self.config.file_prefix, self.params.container);

        let mut encoder = Encoder::configure(
            self.platform.encoders.create(),
            output_path.clone(),
            surface,
            self.params.clone(),
        )
        .map_err(RecordingError::Configuration)?;
        encoder.start().map_err(RecordingError::EncoderStart)?;

        inner.capture = Some(capture);
        inner.encoder = Some(encoder);
        inner.output_path = Some(output_path);
        Ok(())
    }

    /// Stop the encoder, release it and the capture, and return to idle
    ///
    /// Both resources are released even when the encoder fails to stop.
    pub async fn stop_recording(&self) -> RecordingResult<String> {
        let (encoder, capture, session_id) = {
            let mut inner = self.inner.lock();
            if inner.state != RecordingState::Active {
                return Err(RecordingError::NotRecording);
            }
            inner.set_state(RecordingState::Stopping);
            (inner.encoder.take(), inner.capture.take(), inner.session_id)
        };
        let log_id = session_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        info!("[{}] Stopping screen recording", log_id);

        // Teardown blocks on the encoder thread; it finishes the state
        // change itself so an abandoned stop call cannot leave us Stopping.
        let inner = self.inner.clone();
        let task = tokio::task::spawn_blocking(move || {
            let result = Self::teardown(encoder, capture);
            Self::finish_stop(&inner, result)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                let err = RecordingError::StopRecording(format!("teardown task failed: {}", e));
                let mut inner = self.inner.lock();
                if inner.state == RecordingState::Stopping {
                    inner.set_state(RecordingState::Idle);
                    inner.session_id = None;
                }
                inner.record_error(&err);
                error!("[{}] Error stopping recording: {}", log_id, err);
                Err(err)
            }
        }
    }

    /// Stop then release, as independent steps
    fn teardown(
        encoder: Option<Encoder>,
        capture: Option<CaptureResource>,
    ) -> RecordingResult<EncoderStats> {
        let mut encoder = encoder;
        let stopped = match encoder.as_mut() {
            Some(encoder) => encoder
                .stop()
                .map_err(|e| RecordingError::StopRecording(e.to_string())),
            None => Err(RecordingError::StopRecording(
                "no encoder attached".to_string(),
            )),
        };

        if let Some(mut encoder) = encoder {
            encoder.release();
        }
        if let Some(mut capture) = capture {
            capture.release();
        }
        stopped
    }

    fn finish_stop(
        inner: &Mutex<SessionInner>,
        result: RecordingResult<EncoderStats>,
    ) -> RecordingResult<String> {
        let mut inner = inner.lock();
        let log_id = inner.log_id();
        inner.set_state(RecordingState::Idle);
        inner.session_id = None;

        match result {
            Ok(stats) => {
                inner.last_error = None;
                let path = inner
                    .output_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                info!(
                    "[{}] Screen recording stopped. File: {} ({} frames, {} bytes)",
                    log_id, path, stats.frames_encoded, stats.bytes_output
                );
                Ok(format!("Recording saved to {}", path))
            }
            Err(e) => {
                inner.record_error(&e);
                error!("[{}] Error stopping recording: {}", log_id, e);
                Err(e)
            }
        }
    }
}
