//! OpenH264 software backend
//!
//! Pulls frames from the capture surface on a worker thread, encodes them
//! with OpenH264 and appends the NAL units (Annex-B) to the output file.

use capture::{CapturedFrame, VideoSurface};
use openh264::Error as OpenH264Error;
use openh264::encoder::{Encoder as H264Encoder, EncoderConfig as OpenH264Config};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    Codec, Container, EncoderBackend, EncoderError, EncoderResult, EncoderStats, EncodingParams,
};

/// Prepared encoder state, moved onto the worker thread at start
struct EncodeJob {
    encoder: H264Encoder,
    surface: VideoSurface,
    params: EncodingParams,
    output: BufWriter<File>,
    stats: EncoderStats,
    frame_counter: u64,
    yuv_buffer: Vec<u8>,
}

/// OpenH264-based software encoder backend
pub struct OpenH264Backend {
    job: Option<EncodeJob>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<EncoderResult<EncoderStats>>>,
}

impl OpenH264Backend {
    pub fn new() -> Self {
        Self {
            job: None,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Factory for [`crate::BackendFactory`] slots
    pub fn boxed() -> Box<dyn EncoderBackend> {
        Box::new(Self::new())
    }
}

impl Default for OpenH264Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeJob {
    /// Convert BGRA/RGBA to I420 (YUV planar)
    fn rgb_to_yuv(&mut self, frame: &CapturedFrame) -> &[u8] {
        let width = frame.width as usize;
        let height = frame.height as usize;

        // I420 size: Y plane + U plane (1/4) + V plane (1/4) = 1.5 * width * height
        let y_size = width * height;
        let uv_size = (width / 2) * (height / 2);
        self.yuv_buffer.resize(y_size + 2 * uv_size, 0);

        let (y_plane, uv_planes) = self.yuv_buffer.split_at_mut(y_size);
        let (u_plane, v_plane) = uv_planes.split_at_mut(uv_size);

        for y in 0..height {
            for x in 0..width {
                let (r, g, b) = frame.rgb_at(x as u32, y as u32);
                let (r, g, b) = (r as i32, g as i32, b as i32);

                // BT.601 conversion
                let y_val = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
                y_plane[y * width + x] = y_val.clamp(0, 255) as u8;

                // Subsample for U and V (every 2x2 block)
                if x % 2 == 0 && y % 2 == 0 {
                    let u_val = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
                    let v_val = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;

                    let uv_idx = (y / 2) * (width / 2) + (x / 2);
                    u_plane[uv_idx] = u_val.clamp(0, 255) as u8;
                    v_plane[uv_idx] = v_val.clamp(0, 255) as u8;
                }
            }
        }

        &self.yuv_buffer
    }

    fn encode_frame(&mut self, frame: &CapturedFrame) -> EncoderResult<()> {
        if frame.width != self.params.width
            || frame.height != self.params.height
            || !frame.is_well_formed()
        {
            debug!(
                "Skipping {}x{} frame #{} (expected {}x{})",
                frame.width, frame.height, frame.sequence, self.params.width, self.params.height
            );
            self.stats.frames_skipped += 1;
            return Ok(());
        }

        let yuv_data = self.rgb_to_yuv(frame).to_vec();
        let yuv_source = openh264::formats::YUVBuffer::from_vec(
            yuv_data,
            self.params.width as usize,
            self.params.height as usize,
        );

        let is_keyframe = self.frame_counter % self.params.keyframe_interval as u64 == 0;
        if is_keyframe {
            self.encoder.force_intra_frame();
        }
        self.frame_counter += 1;

        let bitstream = match self.encoder.encode(&yuv_source) {
            Ok(bitstream) => bitstream,
            Err(e) => {
                warn!("Encoding error on frame #{}: {}", frame.sequence, e);
                self.stats.frames_skipped += 1;
                return Ok(());
            }
        };

        // Collect NAL units with Annex-B start codes
        let mut nal_data = Vec::new();
        for l in 0..bitstream.num_layers() {
            if let Some(layer) = bitstream.layer(l) {
                for n in 0..layer.nal_count() {
                    if let Some(nal) = layer.nal_unit(n) {
                        let has_start_code =
                            nal.starts_with(&[0, 0, 0, 1]) || nal.starts_with(&[0, 0, 1]);
                        if !has_start_code {
                            nal_data.extend_from_slice(&[0, 0, 0, 1]);
                        }
                        nal_data.extend_from_slice(nal);
                    }
                }
            }
        }

        if nal_data.is_empty() {
            self.stats.frames_skipped += 1;
            return Ok(());
        }

        self.output.write_all(&nal_data)?;
        self.stats.frames_encoded += 1;
        self.stats.bytes_output += nal_data.len() as u64;
        if is_keyframe {
            self.stats.keyframes += 1;
        }
        Ok(())
    }

    fn run(mut self, running: Arc<AtomicBool>) -> EncoderResult<EncoderStats> {
        let poll = Duration::from_micros(self.params.frame_interval_us());
        let mut surface_lost = false;

        while running.load(Ordering::SeqCst) {
            match self.surface.recv_timeout(poll) {
                Ok(Some(frame)) => self.encode_frame(&frame)?,
                Ok(None) => {}
                Err(e) => {
                    warn!("Encoder lost its surface: {}", e);
                    surface_lost = true;
                    break;
                }
            }
        }

        // Frames queued before the stop request still belong to the recording.
        // The projection keeps producing until capture is released, so only
        // the backlog present now is drained.
        if !surface_lost {
            let backlog = self.surface.queued();
            debug!("Draining {} queued frames", backlog);
            for _ in 0..backlog {
                match self.surface.try_recv() {
                    Ok(Some(frame)) => self.encode_frame(&frame)?,
                    _ => break,
                }
            }
        }

        self.output.flush()?;

        if surface_lost {
            return Err(EncoderError::EncodingFailed(
                "capture surface released while recording".to_string(),
            ));
        }
        Ok(self.stats)
    }
}

impl EncoderBackend for OpenH264Backend {
    fn name(&self) -> &'static str {
        "openh264"
    }

    fn check_params(&self, params: &EncodingParams) -> EncoderResult<()> {
        if params.codec != Codec::H264 {
            return Err(EncoderError::Configuration(
                "OpenH264 only supports H.264".to_string(),
            ));
        }
        if params.container != Container::AnnexB {
            return Err(EncoderError::Configuration(format!(
                "OpenH264 backend writes raw Annex-B streams, not {:?}",
                params.container
            )));
        }
        Ok(())
    }

    fn prepare(
        &mut self,
        output_path: &Path,
        surface: VideoSurface,
        params: &EncodingParams,
    ) -> EncoderResult<()> {
        self.check_params(params)?;
        if surface.width() != params.width || surface.height() != params.height {
            return Err(EncoderError::Configuration(format!(
                "surface is {}x{}, encoder expects {}x{}",
                surface.width(),
                surface.height(),
                params.width,
                params.height
            )));
        }

        info!(
            "Initializing OpenH264 encoder: {}x{} @ {} bps, {} fps",
            params.width, params.height, params.bitrate_bps, params.fps
        );

        let openh264_config = OpenH264Config::new()
            .set_bitrate_bps(params.bitrate_bps)
            .max_frame_rate(params.fps as f32)
            .usage_type(openh264::encoder::UsageType::ScreenContentRealTime)
            .enable_skip_frame(false);

        let encoder =
            H264Encoder::with_api_config(openh264::OpenH264API::from_source(), openh264_config)
                .map_err(|e: OpenH264Error| EncoderError::Configuration(e.to_string()))?;

        let file = File::create(output_path).map_err(|e| {
            EncoderError::Configuration(format!("cannot open {}: {}", output_path.display(), e))
        })?;

        self.job = Some(EncodeJob {
            encoder,
            surface,
            params: params.clone(),
            output: BufWriter::new(file),
            stats: EncoderStats::default(),
            frame_counter: 0,
            yuv_buffer: Vec::new(),
        });
        Ok(())
    }

    fn start(&mut self) -> EncoderResult<()> {
        let job = self
            .job
            .take()
            .ok_or_else(|| EncoderError::Start("encoder not prepared".to_string()))?;
        if !job.surface.is_live() {
            return Err(EncoderError::Start("capture surface is gone".to_string()));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let worker = std::thread::Builder::new()
            .name("openh264-encoder".to_string())
            .spawn(move || job.run(running))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                EncoderError::Start(e.to_string())
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> EncoderResult<EncoderStats> {
        self.running.store(false, Ordering::SeqCst);
        let worker = self
            .worker
            .take()
            .ok_or_else(|| EncoderError::Stop("encoder not running".to_string()))?;
        match worker.join() {
            Ok(result) => result,
            Err(_) => Err(EncoderError::Stop("encoder thread panicked".to_string())),
        }
    }

    fn release(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if let Ok(Err(e)) = worker.join() {
                debug!("Discarding encoder result on release: {}", e);
            }
        }
        // Dropping an unstarted job closes the output file and frees the encoder
        self.job = None;
    }
}
