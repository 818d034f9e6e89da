//! Encoder backend trait abstraction

use capture::VideoSurface;
use std::path::Path;

use crate::{EncoderResult, EncodingParams};

/// Platform encoder/muxer writing one output file
///
/// [`crate::Encoder`] guarantees the call order: `prepare` once, then
/// `start` at most once, then `stop` at most once, and `release` exactly once
/// regardless of how the earlier calls went.
pub trait EncoderBackend: Send {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Reject parameters this backend can never record with
    fn check_params(&self, _params: &EncodingParams) -> EncoderResult<()> {
        Ok(())
    }

    /// Bind the output file and source surface
    fn prepare(
        &mut self,
        output_path: &Path,
        surface: VideoSurface,
        params: &EncodingParams,
    ) -> EncoderResult<()>;

    /// Begin pulling frames from the surface
    fn start(&mut self) -> EncoderResult<()>;

    /// Finish the file
    fn stop(&mut self) -> EncoderResult<EncoderStats>;

    /// Free the encoder and close the output stream
    fn release(&mut self);
}

/// Creates one backend per recording
pub trait BackendFactory: Send + Sync {
    fn create(&self) -> Box<dyn EncoderBackend>;
}

impl<F> BackendFactory for F
where
    F: Fn() -> Box<dyn EncoderBackend> + Send + Sync,
{
    fn create(&self) -> Box<dyn EncoderBackend> {
        self()
    }
}

/// Encoder statistics
#[derive(Debug, Clone, Default)]
pub struct EncoderStats {
    /// Total frames encoded
    pub frames_encoded: u64,
    /// Total bytes output
    pub bytes_output: u64,
    /// Keyframes generated
    pub keyframes: u64,
    /// Frames skipped (wrong size, empty bitstream)
    pub frames_skipped: u64,
}
