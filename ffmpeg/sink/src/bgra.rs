/*!
    Display-ready BGRA output.
*/

use ffmpeg_next::{
    format::Pixel,
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::debug;

use ffmpeg_decode::DecodedFrame;
use ffmpeg_types::{Error, Result};

use crate::buffer::{FrameSink, OutputBuffer, to_output_buffer};

/**
    Sink converting frames to packed BGRA at their own size.

    The scaler is created on the first frame and reused while the source
    size and pixel format stay the same; a change recreates it.
*/
#[derive(Default)]
pub struct BgraSink {
    scaler: Option<ScalerState>,
}

struct ScalerState {
    context: ScalerContext,
    src_width: u32,
    src_height: u32,
    src_format: Pixel,
}

impl BgraSink {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Convert one frame to BGRA.
    */
    pub fn convert(&mut self, frame: &DecodedFrame) -> Result<OutputBuffer> {
        let (width, height, format) = (frame.width(), frame.height(), frame.ffmpeg_format());
        if width == 0 || height == 0 || format == Pixel::None {
            return Err(Error::conversion(format!(
                "cannot convert {}x{} {:?} frame",
                width, height, format
            )));
        }

        let needs_init = match &self.scaler {
            None => true,
            Some(state) => {
                state.src_width != width || state.src_height != height || state.src_format != format
            }
        };
        if needs_init {
            self.init_scaler(width, height, format)?;
        }

        let Some(state) = self.scaler.as_mut() else {
            return Err(Error::conversion("scaler unavailable"));
        };

        let mut bgra = VideoFrameFFmpeg::empty();
        state
            .context
            .run(frame.as_ffmpeg(), &mut bgra)
            .map_err(|e| Error::conversion(format!("scaling failed: {}", e)))?;
        bgra.set_pts(frame.pts().map(|pts| pts.0));

        to_output_buffer(&DecodedFrame::from_ffmpeg(bgra, frame.time_base()))
    }

    fn init_scaler(&mut self, width: u32, height: u32, format: Pixel) -> Result<()> {
        let context = ScalerContext::get(
            format,
            width,
            height,
            Pixel::BGRA,
            width,
            height,
            ScalerFlags::BILINEAR,
        )
        .map_err(|e| Error::conversion(format!("failed to create scaler for {:?}: {}", format, e)))?;

        debug!(width, height, ?format, "created BGRA scaler");

        self.scaler = Some(ScalerState {
            context,
            src_width: width,
            src_height: height,
            src_format: format,
        });
        Ok(())
    }
}

impl FrameSink for BgraSink {
    type Output = OutputBuffer;

    fn accept(&mut self, frame: &DecodedFrame) -> Result<OutputBuffer> {
        self.convert(frame)
    }
}

impl std::fmt::Debug for BgraSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = self
            .scaler
            .as_ref()
            .map(|state| (state.src_width, state.src_height, state.src_format));
        f.debug_struct("BgraSink").field("source", &source).finish()
    }
}
