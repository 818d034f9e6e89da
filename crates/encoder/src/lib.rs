//! Video Encoder - surface-to-file recording
//!
//! Provides the encoder half of a recording session:
//! - fixed encoding parameters ([`EncodingParams`])
//! - the platform encoder seam ([`EncoderBackend`])
//! - [`Encoder`], enforcing armed -> running -> stopped and a single release
//! - OpenH264 (software, cross-platform) writing an H.264 Annex-B stream

mod encoder;
mod error;
mod openh264_backend;
mod params;
mod traits;

pub use encoder::*;
pub use error::*;
pub use openh264_backend::*;
pub use params::*;
pub use traits::*;
