//! Capture surface: the frame queue between a projection and an encoder
//!
//! The projection side holds a [`SurfaceWriter`], the encoder side a
//! [`VideoSurface`]. Once the surface is invalidated neither end may be used
//! again; every access after that fails with [`CaptureError::SurfaceReleased`].

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::{CaptureError, CaptureResult, CapturedFrame};

/// Frames buffered between producer and consumer
pub const DEFAULT_SURFACE_CAPACITY: usize = 8;

#[derive(Debug, Default)]
struct SurfaceShared {
    released: AtomicBool,
    frames_written: AtomicU64,
    frames_dropped: AtomicU64,
}

/// Producer end of a capture surface
#[derive(Debug)]
pub struct SurfaceWriter {
    tx: Sender<CapturedFrame>,
    shared: Arc<SurfaceShared>,
}

/// Consumer end of a capture surface
#[derive(Debug, Clone)]
pub struct VideoSurface {
    rx: Receiver<CapturedFrame>,
    shared: Arc<SurfaceShared>,
    width: u32,
    height: u32,
}

impl VideoSurface {
    /// Create a surface of the given geometry
    pub fn channel(
        width: u32,
        height: u32,
        capacity: usize,
    ) -> (SurfaceWriter, VideoSurface) {
        let (tx, rx) = bounded(capacity.max(1));
        let shared = Arc::new(SurfaceShared::default());
        (
            SurfaceWriter {
                tx,
                shared: shared.clone(),
            },
            VideoSurface {
                rx,
                shared,
                width,
                height,
            },
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_live(&self) -> bool {
        !self.shared.released.load(Ordering::SeqCst)
    }

    /// Wait up to `timeout` for the next frame
    ///
    /// `Ok(None)` means no frame arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> CaptureResult<Option<CapturedFrame>> {
        if !self.is_live() {
            return Err(CaptureError::SurfaceReleased);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::SurfaceReleased),
        }
    }

    /// Frames currently waiting in the queue
    pub fn queued(&self) -> usize {
        self.rx.len()
    }

    /// Take a queued frame without blocking
    pub fn try_recv(&self) -> CaptureResult<Option<CapturedFrame>> {
        if !self.is_live() {
            return Err(CaptureError::SurfaceReleased);
        }
        Ok(self.rx.try_recv().ok())
    }

    /// Mark the surface dead and discard anything still queued
    pub fn invalidate(&self) {
        if !self.shared.released.swap(true, Ordering::SeqCst) {
            while self.rx.try_recv().is_ok() {}
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.shared.frames_written.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.shared.frames_dropped.load(Ordering::Relaxed)
    }
}

impl SurfaceWriter {
    pub fn is_live(&self) -> bool {
        !self.shared.released.load(Ordering::SeqCst)
    }

    /// Queue a frame; a full queue drops the frame rather than blocking the producer
    pub fn push(&self, frame: CapturedFrame) -> CaptureResult<()> {
        if !self.is_live() {
            return Err(CaptureError::SurfaceReleased);
        }
        match self.tx.try_send(frame) {
            Ok(()) => {
                self.shared.frames_written.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.shared.frames_dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(CaptureError::SurfaceReleased),
        }
    }
}
