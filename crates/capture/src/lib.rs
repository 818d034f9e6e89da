//! Screen Capture - permission, projection and capture surface
//!
//! Provides the capture half of a recording session:
//! - permission prompts answered out-of-band ([`PermissionBroker`])
//! - the platform projection seam ([`ProjectionProvider`], [`Projection`])
//! - [`CaptureResource`], the owned projection plus the surface it feeds
//! - a synthetic test-pattern projection for hosts without a capture service

mod error;
mod frame;
mod permission;
mod resource;
mod surface;
mod synthetic;
mod traits;

pub use error::*;
pub use frame::*;
pub use permission::*;
pub use resource::*;
pub use surface::*;
pub use synthetic::*;
pub use traits::*;
