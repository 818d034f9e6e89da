//! Screen projection trait abstraction

use crate::{CaptureResult, GrantToken, SurfaceWriter};

/// Virtual display mirrored into the capture surface
#[derive(Debug, Clone)]
pub struct VirtualDisplayConfig {
    /// Display name shown by the platform
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Target FPS
    pub target_fps: u32,
}

impl Default for VirtualDisplayConfig {
    fn default() -> Self {
        Self {
            name: "ScreenRecording".to_string(),
            width: 1080,
            height: 1920,
            target_fps: 30,
        }
    }
}

/// An authorized capture connection
pub trait Projection: Send {
    /// Start mirroring the screen into `sink`
    fn create_virtual_display(
        &mut self,
        config: &VirtualDisplayConfig,
        sink: SurfaceWriter,
    ) -> CaptureResult<()>;

    /// Tear down the virtual display and the connection
    fn stop(&mut self);
}

/// Platform screen-capture service
pub trait ProjectionProvider: Send + Sync {
    /// Whether the capture service exists on this OS
    fn is_available(&self) -> bool;

    /// Turn a grant into a capture connection
    fn create_projection(&self, grant: GrantToken) -> CaptureResult<Box<dyn Projection>>;
}
