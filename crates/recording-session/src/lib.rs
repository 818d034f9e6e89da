//! Recording Session - the screen recorder state machine
//!
//! One [`RecordingSession`] per process orchestrates the permission prompt,
//! the capture resource and the encoder behind four operations:
//! start, stop, is-recording and status.

mod config;
mod error;
mod output;
mod platform;
mod session;

pub use config::*;
pub use error::*;
pub use output::*;
pub use platform::*;
pub use session::*;
