//! Synthetic screen projection
//!
//! Renders a moving test pattern instead of the real screen. Used where no
//! platform capture service is wired in (the demo binary, tests) and as the
//! reference for what a platform projection has to do with its sink.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{
    CaptureError, CaptureResult, CapturedFrame, GrantToken, PixelFormat, Projection,
    ProjectionProvider, RESULT_OK, SurfaceWriter, VirtualDisplayConfig,
};

/// Capture statistics
#[derive(Debug, Clone, Default)]
pub struct CaptureStats {
    /// Total frames rendered into the surface
    pub frames_captured: u64,
    /// Frames refused by the surface
    pub frames_rejected: u64,
}

/// Capture service backed by [`SyntheticProjection`]
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    available: bool,
    stats: Arc<Mutex<CaptureStats>>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self {
            available: true,
            stats: Arc::new(Mutex::new(CaptureStats::default())),
        }
    }

    /// A provider reporting that the platform has no capture service
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Totals across every projection this provider created
    pub fn stats(&self) -> CaptureStats {
        self.stats.lock().clone()
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionProvider for SyntheticProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    fn create_projection(&self, grant: GrantToken) -> CaptureResult<Box<dyn Projection>> {
        if !self.available {
            return Err(CaptureError::NotAvailable);
        }
        if grant.result_code() != RESULT_OK {
            return Err(CaptureError::Projection(format!(
                "grant carries result code {}",
                grant.result_code()
            )));
        }
        Ok(Box::new(SyntheticProjection::new(self.stats.clone())))
    }
}

/// Test-pattern projection rendering on its own thread
pub struct SyntheticProjection {
    running: Arc<AtomicBool>,
    frame_count: Arc<AtomicU64>,
    stats: Arc<Mutex<CaptureStats>>,
    worker: Option<JoinHandle<()>>,
}

impl SyntheticProjection {
    fn new(stats: Arc<Mutex<CaptureStats>>) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            frame_count: Arc::new(AtomicU64::new(0)),
            stats,
            worker: None,
        }
    }

    /// Diagonal gradient that scrolls one step per frame
    fn render(width: u32, height: u32, sequence: u64) -> CapturedFrame {
        let shift = (sequence % 1024) as u32 * 4;
        let (w, h) = (width.max(1), height.max(1));
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let r = ((x + shift) % w * 255 / w) as u8;
                let g = ((y + shift) % h * 255 / h) as u8;
                let b = ((x + y) / 4 + shift) as u8;
                data.extend_from_slice(&[b, g, r, 255]);
            }
        }
        CapturedFrame::packed(Bytes::from(data), width, height, PixelFormat::Bgra8, sequence)
    }

    fn render_loop(
        config: VirtualDisplayConfig,
        sink: SurfaceWriter,
        running: Arc<AtomicBool>,
        frame_count: Arc<AtomicU64>,
        stats: Arc<Mutex<CaptureStats>>,
    ) {
        let frame_duration = Duration::from_secs_f64(1.0 / config.target_fps.max(1) as f64);

        while running.load(Ordering::SeqCst) {
            let loop_start = Instant::now();
            let sequence = frame_count.fetch_add(1, Ordering::Relaxed);
            let frame = Self::render(config.width, config.height, sequence);

            if let Err(e) = sink.push(frame) {
                debug!("Synthetic display '{}' surface closed: {}", config.name, e);
                stats.lock().frames_rejected += 1;
                break;
            }
            stats.lock().frames_captured += 1;

            // Rate limiting
            let elapsed = loop_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }

        debug!("Synthetic display '{}' render loop ended", config.name);
    }
}

impl Projection for SyntheticProjection {
    fn create_virtual_display(
        &mut self,
        config: &VirtualDisplayConfig,
        sink: SurfaceWriter,
    ) -> CaptureResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::VirtualDisplay(
                "virtual display already created".to_string(),
            ));
        }
        if config.width == 0 || config.height == 0 {
            self.running.store(false, Ordering::SeqCst);
            return Err(CaptureError::VirtualDisplay(format!(
                "invalid size {}x{}",
                config.width, config.height
            )));
        }

        info!(
            "Starting synthetic display '{}': {}x{} @ {} fps",
            config.name, config.width, config.height, config.target_fps
        );

        let config = config.clone();
        let running = self.running.clone();
        let frame_count = self.frame_count.clone();
        let stats = self.stats.clone();
        let worker = std::thread::Builder::new()
            .name("synthetic-display".to_string())
            .spawn(move || Self::render_loop(config, sink, running, frame_count, stats))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::Internal(e.to_string())
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Synthetic display thread panicked");
            }
            info!(
                "Stopped synthetic display after {} frames",
                self.frame_count.load(Ordering::Relaxed)
            );
        }
    }
}

impl Drop for SyntheticProjection {
    fn drop(&mut self) {
        self.stop();
    }
}
