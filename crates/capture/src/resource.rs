//! Owned capture connection plus the surface it feeds

use tracing::{debug, info};

use crate::{
    CaptureError, CaptureResult, DEFAULT_SURFACE_CAPACITY, GrantToken, Projection,
    ProjectionProvider, VideoSurface, VirtualDisplayConfig,
};

/// Exclusive owner of one projection and its surface
///
/// Released exactly once: by [`CaptureResource::release`] or on drop,
/// whichever comes first.
pub struct CaptureResource {
    projection: Option<Box<dyn Projection>>,
    surface: Option<VideoSurface>,
}

impl CaptureResource {
    /// Resource holding nothing; releasing it is a no-op
    pub fn empty() -> Self {
        Self {
            projection: None,
            surface: None,
        }
    }

    /// Create a projection from `grant` and mirror the screen into a fresh surface
    pub fn acquire(
        provider: &dyn ProjectionProvider,
        grant: GrantToken,
        config: &VirtualDisplayConfig,
    ) -> CaptureResult<Self> {
        let projection = provider.create_projection(grant)?;
        let (writer, surface) =
            VideoSurface::channel(config.width, config.height, DEFAULT_SURFACE_CAPACITY);

        let mut resource = Self {
            projection: Some(projection),
            surface: Some(surface),
        };

        // Dropping `resource` on the error path stops the projection.
        if let Some(projection) = resource.projection.as_mut() {
            projection.create_virtual_display(config, writer)?;
        }

        info!(
            "Capture acquired: '{}' {}x{} @ {} fps",
            config.name, config.width, config.height, config.target_fps
        );
        Ok(resource)
    }

    /// Consumer end of the live surface
    pub fn surface(&self) -> CaptureResult<VideoSurface> {
        match &self.surface {
            Some(surface) if surface.is_live() => Ok(surface.clone()),
            Some(_) => Err(CaptureError::SurfaceReleased),
            None => Err(CaptureError::NotAcquired),
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.projection.is_some()
    }

    /// Stop the projection and invalidate the surface; later calls do nothing
    pub fn release(&mut self) {
        let surface = self.surface.take();
        let projection = self.projection.take();
        if surface.is_none() && projection.is_none() {
            return;
        }

        if let Some(surface) = surface {
            surface.invalidate();
        }
        if let Some(mut projection) = projection {
            projection.stop();
        }
        debug!("Capture released");
    }
}

impl Drop for CaptureResource {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CaptureResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureResource")
            .field("acquired", &self.is_acquired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RESULT_OK, SurfaceWriter};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        created: AtomicUsize,
        stopped: AtomicUsize,
    }

    struct MockProjection {
        counters: Arc<Counters>,
        fail_display: bool,
        sink: Option<SurfaceWriter>,
    }

    impl Projection for MockProjection {
        fn create_virtual_display(
            &mut self,
            _config: &VirtualDisplayConfig,
            sink: SurfaceWriter,
        ) -> CaptureResult<()> {
            if self.fail_display {
                return Err(CaptureError::VirtualDisplay("no display".into()));
            }
            self.sink = Some(sink);
            Ok(())
        }

        fn stop(&mut self) {
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockProvider {
        counters: Arc<Counters>,
        fail_projection: bool,
        fail_display: bool,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                counters: Arc::new(Counters::default()),
                fail_projection: false,
                fail_display: false,
            }
        }
    }

    impl ProjectionProvider for MockProvider {
        fn is_available(&self) -> bool {
            true
        }

        fn create_projection(&self, _grant: GrantToken) -> CaptureResult<Box<dyn Projection>> {
            if self.fail_projection {
                return Err(CaptureError::Projection("revoked".into()));
            }
            self.counters.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockProjection {
                counters: self.counters.clone(),
                fail_display: self.fail_display,
                sink: None,
            }))
        }
    }

    fn grant() -> GrantToken {
        GrantToken::new(RESULT_OK, vec![0xAB])
    }

    #[test]
    fn test_acquire_and_release_once() {
        let provider = MockProvider::new();
        let mut resource =
            CaptureResource::acquire(&provider, grant(), &VirtualDisplayConfig::default()).unwrap();
        let surface = resource.surface().unwrap();
        assert!(resource.is_acquired());
        assert_eq!(surface.width(), 1080);

        resource.release();
        resource.release();
        drop(resource);

        assert!(!surface.is_live());
        assert_eq!(provider.counters.created.load(Ordering::SeqCst), 1);
        assert_eq!(provider.counters.stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_surface_after_release() {
        let provider = MockProvider::new();
        let mut resource =
            CaptureResource::acquire(&provider, grant(), &VirtualDisplayConfig::default()).unwrap();
        resource.release();
        assert!(matches!(resource.surface(), Err(CaptureError::NotAcquired)));
    }

    #[test]
    fn test_failed_display_stops_projection() {
        let mut provider = MockProvider::new();
        provider.fail_display = true;
        let result = CaptureResource::acquire(&provider, grant(), &VirtualDisplayConfig::default());
        assert!(matches!(result, Err(CaptureError::VirtualDisplay(_))));
        assert_eq!(provider.counters.created.load(Ordering::SeqCst), 1);
        assert_eq!(provider.counters.stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_projection_touches_nothing() {
        let mut provider = MockProvider::new();
        provider.fail_projection = true;
        let result = CaptureResource::acquire(&provider, grant(), &VirtualDisplayConfig::default());
        assert!(matches!(result, Err(CaptureError::Projection(_))));
        assert_eq!(provider.counters.stopped.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_release_never_acquired() {
        let mut resource = CaptureResource::empty();
        resource.release();
        resource.release();
        assert!(!resource.is_acquired());
    }
}
