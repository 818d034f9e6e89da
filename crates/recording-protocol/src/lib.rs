//! Shared Protocol Definitions for the screen recorder
//!
//! This crate contains the state, status and error-code types shared between
//! the recording session and whatever bridge exposes it to a host application.

mod error;
mod state;
mod status;

pub use error::*;
pub use state::*;
pub use status::*;

/// Name the recorder module is registered under on the host side
pub const MODULE_NAME: &str = "ScreenRecorder";
