//! One-shot encoder lifecycle

use capture::VideoSurface;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{EncoderBackend, EncoderError, EncoderResult, EncoderStats, EncodingParams};

/// Encoder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Configured, not yet started
    Armed,
    Running,
    Stopped,
    Released,
}

/// An encoder bound to one output file and one surface
///
/// `start` is only valid when armed and `stop` only when running; each
/// succeeds at most once. The backend is released exactly once, by
/// [`Encoder::release`] or on drop.
pub struct Encoder {
    backend: Box<dyn EncoderBackend>,
    state: EncoderState,
    output_path: PathBuf,
    params: EncodingParams,
}

impl Encoder {
    /// Validate the parameters and prepare `backend` to record `surface` into `output_path`
    pub fn configure(
        mut backend: Box<dyn EncoderBackend>,
        output_path: impl Into<PathBuf>,
        surface: VideoSurface,
        params: EncodingParams,
    ) -> EncoderResult<Self> {
        let output_path = output_path.into();

        let prepared = Self::check_inputs(&output_path, &surface, &params)
            .and_then(|()| backend.check_params(&params))
            .and_then(|()| backend.prepare(&output_path, surface, &params));
        if let Err(e) = prepared {
            backend.release();
            return Err(match e {
                EncoderError::Configuration(_) | EncoderError::UnsupportedResolution { .. } => e,
                other => EncoderError::Configuration(other.to_string()),
            });
        }

        info!(
            "Encoder '{}' armed: {} -> {:?} ({:?}, {}x{} @ {} fps, {} bps)",
            backend.name(),
            output_path.display(),
            params.container,
            params.codec,
            params.width,
            params.height,
            params.fps,
            params.bitrate_bps
        );

        Ok(Self {
            backend,
            state: EncoderState::Armed,
            output_path,
            params,
        })
    }

    fn check_inputs(
        output_path: &Path,
        surface: &VideoSurface,
        params: &EncodingParams,
    ) -> EncoderResult<()> {
        params.validate()?;
        if output_path.as_os_str().is_empty() || output_path.file_name().is_none() {
            return Err(EncoderError::Configuration(format!(
                "invalid output path '{}'",
                output_path.display()
            )));
        }
        if !surface.is_live() {
            return Err(EncoderError::Configuration(
                "capture surface unavailable".into(),
            ));
        }
        Ok(())
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn params(&self) -> &EncodingParams {
        &self.params
    }

    /// Armed -> Running
    pub fn start(&mut self) -> EncoderResult<()> {
        if self.state != EncoderState::Armed {
            return Err(EncoderError::Start(format!(
                "encoder is {:?}, not armed",
                self.state
            )));
        }
        match self.backend.start() {
            Ok(()) => {
                self.state = EncoderState::Running;
                debug!("Encoder '{}' running", self.backend.name());
                Ok(())
            }
            Err(e) => Err(match e {
                EncoderError::Start(_) => e,
                other => EncoderError::Start(other.to_string()),
            }),
        }
    }

    /// Running -> Stopped; the transition happens even if the backend reports an error
    pub fn stop(&mut self) -> EncoderResult<EncoderStats> {
        if self.state != EncoderState::Running {
            return Err(EncoderError::Stop(format!(
                "encoder is {:?}, not running",
                self.state
            )));
        }
        self.state = EncoderState::Stopped;
        match self.backend.stop() {
            Ok(stats) => {
                info!(
                    "Encoder '{}' stopped: {} frames, {} bytes -> {}",
                    self.backend.name(),
                    stats.frames_encoded,
                    stats.bytes_output,
                    self.output_path.display()
                );
                Ok(stats)
            }
            Err(e) => {
                warn!("Encoder '{}' stop failed: {}", self.backend.name(), e);
                Err(match e {
                    EncoderError::Stop(_) => e,
                    other => EncoderError::Stop(other.to_string()),
                })
            }
        }
    }

    /// Free the backend; later calls do nothing
    pub fn release(&mut self) {
        if self.state == EncoderState::Released {
            return;
        }
        self.backend.release();
        self.state = EncoderState::Released;
        debug!("Encoder '{}' released", self.backend.name());
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .field("output_path", &self.output_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        prepared: AtomicUsize,
        started: AtomicUsize,
        stopped: AtomicUsize,
        released: AtomicUsize,
    }

    #[derive(Default)]
    struct MockBackend {
        calls: Arc<Calls>,
        fail_prepare: bool,
        fail_start: bool,
        fail_stop: bool,
        reject_params: bool,
    }

    impl EncoderBackend for MockBackend {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn check_params(&self, _params: &EncodingParams) -> EncoderResult<()> {
            if self.reject_params {
                return Err(EncoderError::Configuration("mp4 muxer missing".into()));
            }
            Ok(())
        }

        fn prepare(
            &mut self,
            _output_path: &Path,
            _surface: VideoSurface,
            _params: &EncodingParams,
        ) -> EncoderResult<()> {
            self.calls.prepared.fetch_add(1, Ordering::SeqCst);
            if self.fail_prepare {
                return Err(EncoderError::Io(std::io::Error::other("read-only")));
            }
            Ok(())
        }

        fn start(&mut self) -> EncoderResult<()> {
            self.calls.started.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(EncoderError::EncodingFailed("surface gone".into()));
            }
            Ok(())
        }

        fn stop(&mut self) -> EncoderResult<EncoderStats> {
            self.calls.stopped.fetch_add(1, Ordering::SeqCst);
            if self.fail_stop {
                return Err(EncoderError::Io(std::io::Error::other("disk full")));
            }
            Ok(EncoderStats::default())
        }

        fn release(&mut self) {
            self.calls.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn surface() -> VideoSurface {
        VideoSurface::channel(1080, 1920, 2).1
    }

    fn configure(backend: MockBackend) -> EncoderResult<Encoder> {
        Encoder::configure(
            Box::new(backend),
            "/tmp/out.mp4",
            surface(),
            EncodingParams::default(),
        )
    }

    #[test]
    fn test_full_lifecycle() {
        let backend = MockBackend::default();
        let calls = backend.calls.clone();
        let mut encoder = configure(backend).unwrap();
        assert_eq!(encoder.state(), EncoderState::Armed);

        encoder.start().unwrap();
        assert_eq!(encoder.state(), EncoderState::Running);
        encoder.stop().unwrap();
        assert_eq!(encoder.state(), EncoderState::Stopped);
        encoder.release();
        encoder.release();
        drop(encoder);

        assert_eq!(calls.prepared.load(Ordering::SeqCst), 1);
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transitions_are_one_shot() {
        let backend = MockBackend::default();
        let calls = backend.calls.clone();
        let mut encoder = configure(backend).unwrap();

        assert!(matches!(encoder.stop(), Err(EncoderError::Stop(_))));
        encoder.start().unwrap();
        assert!(matches!(encoder.start(), Err(EncoderError::Start(_))));
        encoder.stop().unwrap();
        assert!(matches!(encoder.stop(), Err(EncoderError::Stop(_))));

        assert_eq!(calls.started.load(Ordering::SeqCst), 1);
        assert_eq!(calls.stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_after_failed_stop() {
        let backend = MockBackend {
            fail_stop: true,
            ..Default::default()
        };
        let calls = backend.calls.clone();
        let mut encoder = configure(backend).unwrap();
        encoder.start().unwrap();

        assert!(matches!(encoder.stop(), Err(EncoderError::Stop(_))));
        assert_eq!(encoder.state(), EncoderState::Stopped);
        encoder.release();
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prepare_failure_is_configuration_error() {
        let backend = MockBackend {
            fail_prepare: true,
            ..Default::default()
        };
        let calls = backend.calls.clone();
        assert!(matches!(configure(backend), Err(EncoderError::Configuration(_))));
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsupported_params_rejected_before_prepare() {
        let backend = MockBackend {
            reject_params: true,
            ..Default::default()
        };
        let calls = backend.calls.clone();
        assert!(matches!(configure(backend), Err(EncoderError::Configuration(_))));
        assert_eq!(calls.prepared.load(Ordering::SeqCst), 0);
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dead_surface_rejected_before_prepare() {
        let backend = MockBackend::default();
        let calls = backend.calls.clone();
        let dead = surface();
        dead.invalidate();
        let result = Encoder::configure(
            Box::new(backend),
            "/tmp/out.mp4",
            dead,
            EncodingParams::default(),
        );
        assert!(matches!(result, Err(EncoderError::Configuration(_))));
        assert_eq!(calls.prepared.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_start_failure_keeps_encoder_armed_until_drop() {
        let backend = MockBackend {
            fail_start: true,
            ..Default::default()
        };
        let calls = backend.calls.clone();
        let mut encoder = configure(backend).unwrap();
        assert!(matches!(encoder.start(), Err(EncoderError::Start(_))));
        assert_eq!(encoder.state(), EncoderState::Armed);
        drop(encoder);
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
    }
}
