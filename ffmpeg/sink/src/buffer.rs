/*!
    Caller-owned copies of decoded frames.
*/

use std::time::Duration;

use tracing::trace;

use ffmpeg_decode::DecodedFrame;
use ffmpeg_types::{Error, PixelFormat, Pts, Rational, Result};

/**
    Receives decoded frames and turns them into the caller's output type.

    The frame is only borrowed for the call; whatever the sink returns is
    owned by the caller.
*/
pub trait FrameSink {
    type Output;

    fn accept(&mut self, frame: &DecodedFrame) -> Result<Self::Output>;
}

/**
    One tightly packed plane of an [`OutputBuffer`].
*/
#[derive(Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    /// Bytes per row. Equal to the row width; rows carry no padding.
    pub stride: usize,
}

impl Plane {
    pub fn rows(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    /**
        One row of the plane.
    */
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.stride)?;
        self.data.get(start..start + self.stride)
    }
}

impl std::fmt::Debug for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plane")
            .field("len", &self.data.len())
            .field("stride", &self.stride)
            .finish()
    }
}

/**
    A decoded frame copied out of the decoder.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Presentation timestamp in `time_base` units.
    pub pts: Option<Pts>,
    pub time_base: Rational,
    pub planes: Vec<Plane>,
}

impl OutputBuffer {
    /**
        Presentation time as a duration from the stream origin.
    */
    pub fn presentation_time(&self) -> Option<Duration> {
        self.pts?.to_duration(self.time_base)
    }

    /**
        Total size in bytes of every plane.
    */
    pub fn len(&self) -> usize {
        self.planes.iter().map(|plane| plane.data.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/**
    Copy a decoded frame into an [`OutputBuffer`].

    Each plane is copied row by row so the output carries no stride padding.
    Width, height, pixel format and timestamp are preserved.

    Bottom-up planes (negative linesize) are copied in display order, so
    row 0 of the output is always the top row of the picture.

    Fails with [`Error::Conversion`] for frames with zero dimensions, pixel
    formats without a [`PixelFormat`] mapping, or planes smaller than their
    format requires.
*/
pub fn to_output_buffer(frame: &DecodedFrame) -> Result<OutputBuffer> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(Error::conversion(format!(
            "frame has zero dimensions ({}x{})",
            width, height
        )));
    }

    let format = frame.pixel_format().ok_or_else(|| {
        Error::conversion(format!(
            "no output mapping for pixel format {:?}",
            frame.ffmpeg_format()
        ))
    })?;

    let layout = format.plane_layout(width, height);
    if frame.plane_count() < layout.len() {
        return Err(Error::conversion(format!(
            "{:?} needs {} planes, frame has {}",
            format,
            layout.len(),
            frame.plane_count()
        )));
    }

    let mut planes = Vec::with_capacity(layout.len());
    for (index, plane) in layout.iter().enumerate() {
        let mut data = Vec::with_capacity(plane.len());
        for row in 0..plane.rows {
            let src = frame.row(index, row, plane.row_bytes).ok_or_else(|| {
                Error::conversion(format!(
                    "plane {} row {} is missing or shorter than {} bytes (linesize {})",
                    index,
                    row,
                    plane.row_bytes,
                    frame.linesize(index)
                ))
            })?;
            data.extend_from_slice(src);
        }

        planes.push(Plane {
            data,
            stride: plane.row_bytes,
        });
    }

    trace!(width, height, ?format, pts = ?frame.pts(), "copied frame");

    Ok(OutputBuffer {
        width,
        height,
        format,
        pts: frame.pts(),
        time_base: frame.time_base(),
        planes,
    })
}

/**
    Sink producing an [`OutputBuffer`] in the frame's own pixel format.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaneCopySink;

impl FrameSink for PlaneCopySink {
    type Output = OutputBuffer;

    fn accept(&mut self, frame: &DecodedFrame) -> Result<OutputBuffer> {
        to_output_buffer(frame)
    }
}
