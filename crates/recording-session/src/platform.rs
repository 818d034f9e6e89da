//! Collaborators the session is wired to

use capture::{PermissionBroker, ProjectionProvider};
use encoder::BackendFactory;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Host application seen from the recorder
pub trait HostContext: Send + Sync {
    /// Whether a foreground UI exists to launch the capture prompt from
    fn has_foreground_ui(&self) -> bool;

    /// Caller-writable directory for recordings
    fn files_dir(&self) -> Option<PathBuf>;
}

/// Everything platform-specific a session needs
#[derive(Clone)]
pub struct RecorderPlatform {
    pub host: Arc<dyn HostContext>,
    pub broker: Arc<dyn PermissionBroker>,
    pub projections: Arc<dyn ProjectionProvider>,
    pub encoders: Arc<dyn BackendFactory>,
}

/// Host with a fixed files directory and a switchable foreground flag
#[derive(Debug)]
pub struct StaticHost {
    foreground: AtomicBool,
    files_dir: Option<PathBuf>,
}

impl StaticHost {
    pub fn new(files_dir: impl Into<PathBuf>) -> Self {
        Self {
            foreground: AtomicBool::new(true),
            files_dir: Some(files_dir.into()),
        }
    }

    /// Host without a files directory
    pub fn without_storage() -> Self {
        Self {
            foreground: AtomicBool::new(true),
            files_dir: None,
        }
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }
}

impl HostContext for StaticHost {
    fn has_foreground_ui(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    fn files_dir(&self) -> Option<PathBuf> {
        self.files_dir.clone()
    }
}
