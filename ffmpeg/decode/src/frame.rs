/*!
    Decoded video frame.
*/

use std::time::Duration;

use ffmpeg_next::{format::Pixel, util::frame::video::Video as VideoFrameFFmpeg};

use ffmpeg_source::pixel_format_from_ffmpeg;
use ffmpeg_types::{PixelFormat, Pts, Rational};

/**
    A decoded video frame.

    Owns the decoder's output buffers until dropped. Plane data is exposed
    as-is, including any stride padding.
*/
pub struct DecodedFrame {
    frame: VideoFrameFFmpeg,
    time_base: Rational,
}

impl DecodedFrame {
    /**
        Wrap an FFmpeg frame produced by a stream with the given time base.
    */
    pub fn from_ffmpeg(frame: VideoFrameFFmpeg, time_base: Rational) -> Self {
        Self { frame, time_base }
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /**
        Pixel format, if it is one we name.
    */
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        pixel_format_from_ffmpeg(self.frame.format())
    }

    /**
        Pixel format as reported by FFmpeg.
    */
    pub fn ffmpeg_format(&self) -> Pixel {
        self.frame.format()
    }

    /**
        Presentation timestamp in stream time base units.

        Prefers FFmpeg's best-effort timestamp and falls back to the raw pts.
    */
    pub fn pts(&self) -> Option<Pts> {
        self.frame.timestamp().or_else(|| self.frame.pts()).map(Pts)
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Presentation time as a duration from the stream origin.
    */
    pub fn presentation_time(&self) -> Option<Duration> {
        self.pts()?.to_duration(self.time_base)
    }

    pub fn plane_count(&self) -> usize {
        self.frame.planes()
    }

    /**
        Signed bytes between the starts of consecutive rows of one plane.

        Negative for bottom-up images, where row 0 sits at the highest
        address. Returns 0 for a plane the frame does not have.
    */
    pub fn linesize(&self, index: usize) -> i32 {
        if index >= self.frame.planes() {
            return 0;
        }
        // SAFETY: the pointer comes from a live frame we own.
        unsafe { (*self.frame.as_ptr()).linesize[index] }
    }

    /**
        Bytes per row of one plane, including padding.

        `None` for bottom-up planes; use [`row`](Self::row) to read those.
    */
    pub fn stride(&self, index: usize) -> Option<usize> {
        usize::try_from(self.linesize(index)).ok().filter(|&stride| stride > 0)
    }

    /**
        Raw bytes of one top-down plane, `stride(index)` bytes per row.
    */
    pub fn plane_data(&self, index: usize) -> Option<&[u8]> {
        self.stride(index)?;
        Some(self.frame.data(index))
    }

    /**
        The first `row_bytes` bytes of row `row` of one plane, in display
        order. Works for top-down and bottom-up planes alike.

        `None` if the plane or row does not exist or is narrower than
        `row_bytes`.
    */
    pub fn row(&self, index: usize, row: usize, row_bytes: usize) -> Option<&[u8]> {
        let linesize = self.linesize(index);
        if linesize == 0 || linesize.unsigned_abs() as usize < row_bytes {
            return None;
        }
        if row >= self.frame.plane_height(index) as usize {
            return None;
        }

        let offset = isize::try_from(row).ok()?.checked_mul(linesize as isize)?;
        // SAFETY: FFmpeg lays out `plane_height` rows of `|linesize|` bytes
        // each, starting at `data[index]` and stepping by `linesize`. `row` is
        // within that height and `row_bytes` within one row.
        unsafe {
            let base = (*self.frame.as_ptr()).data[index];
            if base.is_null() {
                return None;
            }
            Some(std::slice::from_raw_parts(base.offset(offset), row_bytes))
        }
    }

    /**
        The underlying FFmpeg frame.
    */
    pub fn as_ffmpeg(&self) -> &VideoFrameFFmpeg {
        &self.frame
    }
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.ffmpeg_format())
            .field("pts", &self.pts())
            .finish()
    }
}
