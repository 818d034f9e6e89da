//! Fixed encoding parameters

use serde::{Deserialize, Serialize};

use crate::{EncoderError, EncoderResult};

/// Video bitrate of every recording
pub const DEFAULT_BITRATE_BPS: u32 = 512 * 1000;
/// Frame rate of every recording
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_WIDTH: u32 = 1080;
pub const DEFAULT_HEIGHT: u32 = 1920;
/// Keyframe every 2 seconds at 30fps
pub const DEFAULT_KEYFRAME_INTERVAL: u32 = 60;

/// Video codec type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Codec {
    H264,
    H265,
}

impl Default for Codec {
    fn default() -> Self {
        Self::H264
    }
}

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// MPEG-4 file written by a platform muxer
    Mp4,
    /// Raw H.264 elementary stream with Annex-B start codes
    AnnexB,
}

impl Default for Container {
    fn default() -> Self {
        Self::Mp4
    }
}

impl Container {
    /// File extension for outputs in this container
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::AnnexB => "h264",
        }
    }
}

/// Encoding parameters, video only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingParams {
    pub container: Container,
    pub codec: Codec,
    pub bitrate_bps: u32,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Keyframe interval (GOP size)
    pub keyframe_interval: u32,
}

impl Default for EncodingParams {
    fn default() -> Self {
        Self {
            container: Container::Mp4,
            codec: Codec::H264,
            bitrate_bps: DEFAULT_BITRATE_BPS,
            fps: DEFAULT_FPS,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            keyframe_interval: DEFAULT_KEYFRAME_INTERVAL,
        }
    }
}

impl EncodingParams {
    /// Defaults with another container; nothing else is negotiable
    pub fn with_container(container: Container) -> Self {
        Self {
            container,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> EncoderResult<()> {
        // 4:2:0 chroma subsampling needs even dimensions
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(EncoderError::UnsupportedResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.bitrate_bps == 0 {
            return Err(EncoderError::Configuration("bitrate must be non-zero".into()));
        }
        if !(1..=120).contains(&self.fps) {
            return Err(EncoderError::Configuration(format!(
                "frame rate {} outside 1..=120",
                self.fps
            )));
        }
        if self.keyframe_interval == 0 {
            return Err(EncoderError::Configuration(
                "keyframe interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Duration of one frame in microseconds
    pub fn frame_interval_us(&self) -> u64 {
        1_000_000 / self.fps.max(1) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_defaults() {
        let params = EncodingParams::default();
        assert_eq!(params.codec, Codec::H264);
        assert_eq!(params.container, Container::Mp4);
        assert_eq!(params.bitrate_bps, 512_000);
        assert_eq!(params.fps, 30);
        assert_eq!((params.width, params.height), (1080, 1920));
        params.validate().unwrap();
    }

    #[test]
    fn test_with_container_keeps_defaults() {
        let params = EncodingParams::with_container(Container::AnnexB);
        assert_eq!(params.container.extension(), "h264");
        assert_eq!(params.bitrate_bps, DEFAULT_BITRATE_BPS);
    }

    #[test]
    fn test_rejects_odd_resolution() {
        let params = EncodingParams {
            width: 1081,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(EncoderError::UnsupportedResolution { width: 1081, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_rates() {
        let zero_bitrate = EncodingParams {
            bitrate_bps: 0,
            ..Default::default()
        };
        let fast = EncodingParams {
            fps: 240,
            ..Default::default()
        };
        assert!(zero_bitrate.validate().is_err());
        assert!(fast.validate().is_err());
    }
}
