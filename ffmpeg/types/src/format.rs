/*!
    Pixel format types.
*/

/**
    Video pixel formats.

    This is a subset of formats commonly encountered in decoded video.
    Not all FFmpeg pixel formats are represented.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (most common video format)
    Yuv420p,
    /// Planar YUV 4:2:0, full range (MJPEG and many IP cameras)
    Yuvj420p,
    /// Semi-planar YUV 4:2:0, 12bpp (common hardware decoder output)
    Nv12,
    /// Packed BGRA, 32bpp (common for display on macOS/Windows)
    Bgra,
    /// Packed RGBA, 32bpp (common for display)
    Rgba,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit little-endian (HDR content)
    Yuv420p10,
    /// Semi-planar YUV 4:2:0, 10-bit little-endian (HDR hardware decoder output)
    P010le,
    /// Single-plane luma, 8bpp
    Gray8,
}

/**
    Geometry of one tightly packed plane.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Bytes of pixel data in one row, without padding.
    pub row_bytes: usize,
    /// Number of rows in the plane.
    pub rows: usize,
}

impl PlaneLayout {
    /**
        Total size of the plane when rows are packed back to back.
    */
    pub const fn len(&self) -> usize {
        self.row_bytes * self.rows
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PixelFormat {
    /**
        Returns the number of planes a frame of this format carries.
    */
    pub const fn plane_count(self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuvj420p | Self::Yuv422p | Self::Yuv444p | Self::Yuv420p10 => 3,
            Self::Nv12 | Self::P010le => 2,
            Self::Bgra | Self::Rgba | Self::Rgb24 | Self::Bgr24 | Self::Gray8 => 1,
        }
    }

    /**
        Returns the packed layout of every plane for a frame of the given size.

        Chroma dimensions round up for odd sizes, matching FFmpeg.
    */
    pub fn plane_layout(self, width: u32, height: u32) -> Vec<PlaneLayout> {
        let w = width as usize;
        let h = height as usize;
        let half_w = w.div_ceil(2);
        let half_h = h.div_ceil(2);

        let plane = |row_bytes, rows| PlaneLayout { row_bytes, rows };

        match self {
            Self::Yuv420p | Self::Yuvj420p => {
                vec![plane(w, h), plane(half_w, half_h), plane(half_w, half_h)]
            }
            Self::Yuv420p10 => vec![
                plane(w * 2, h),
                plane(half_w * 2, half_h),
                plane(half_w * 2, half_h),
            ],
            Self::Yuv422p => vec![plane(w, h), plane(half_w, h), plane(half_w, h)],
            Self::Yuv444p => vec![plane(w, h), plane(w, h), plane(w, h)],
            Self::Nv12 => vec![plane(w, h), plane(half_w * 2, half_h)],
            Self::P010le => vec![plane(w * 2, h), plane(half_w * 4, half_h)],
            Self::Bgra | Self::Rgba => vec![plane(w * 4, h)],
            Self::Rgb24 | Self::Bgr24 => vec![plane(w * 3, h)],
            Self::Gray8 => vec![plane(w, h)],
        }
    }
}
