/*!
    Conversion utilities between ffmpeg-next types and ffmpeg-types.
*/

use ffmpeg_next::{codec::Id, format::Pixel, media::Type};

use ffmpeg_types::{CodecId, MediaKind, PixelFormat, Rational};

/**
    Convert ffmpeg_next::Rational to our Rational.
*/
pub fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

/**
    Convert ffmpeg_next pixel format to our PixelFormat.
*/
pub fn pixel_format_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
    match format {
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::YUVJ420P => Some(PixelFormat::Yuvj420p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        Pixel::YUV420P10LE => Some(PixelFormat::Yuv420p10),
        Pixel::P010LE => Some(PixelFormat::P010le),
        Pixel::GRAY8 => Some(PixelFormat::Gray8),
        _ => None,
    }
}

/**
    Convert our PixelFormat to FFmpeg's Pixel format.
*/
pub fn pixel_format_to_ffmpeg(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Yuvj420p => Pixel::YUVJ420P,
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Bgra => Pixel::BGRA,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Yuv420p10 => Pixel::YUV420P10LE,
        PixelFormat::P010le => Pixel::P010LE,
        PixelFormat::Gray8 => Pixel::GRAY8,
        _ => Pixel::None,
    }
}

/**
    Convert an ffmpeg_next media type to our MediaKind.
*/
pub(crate) fn media_kind_from_ffmpeg(medium: Type) -> MediaKind {
    match medium {
        Type::Video => MediaKind::Video,
        Type::Audio => MediaKind::Audio,
        Type::Subtitle => MediaKind::Subtitle,
        Type::Data => MediaKind::Data,
        Type::Attachment => MediaKind::Attachment,
        Type::Unknown => MediaKind::Unknown,
    }
}

/**
    Convert ffmpeg_next codec ID to our CodecId.
*/
pub(crate) fn codec_id_from_ffmpeg(id: Id) -> Option<CodecId> {
    match id {
        // Video
        Id::H264 => Some(CodecId::H264),
        Id::HEVC => Some(CodecId::H265),
        Id::VP8 => Some(CodecId::Vp8),
        Id::VP9 => Some(CodecId::Vp9),
        Id::AV1 => Some(CodecId::Av1),
        Id::MPEG4 => Some(CodecId::Mpeg4),
        Id::MPEG2VIDEO => Some(CodecId::Mpeg2Video),
        Id::MJPEG => Some(CodecId::Mjpeg),
        Id::RAWVIDEO => Some(CodecId::RawVideo),
        // Audio
        Id::AAC => Some(CodecId::Aac),
        Id::OPUS => Some(CodecId::Opus),
        Id::MP3 => Some(CodecId::Mp3),
        Id::AC3 => Some(CodecId::Ac3),
        _ => None,
    }
}
