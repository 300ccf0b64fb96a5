/*!
    Stream information types.
*/

use crate::Rational;

/**
    Kind of media carried by a stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Attachment,
    Unknown,
}

/**
    Codec identifiers.

    Codecs outside this list are still described by their library name in
    [`StreamDescriptor::codec_name`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    // Video
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
    Mpeg4,
    Mpeg2Video,
    Mjpeg,
    RawVideo,
    // Audio
    Aac,
    Opus,
    Mp3,
    Ac3,
}

/**
    One entry of a container's stream table.

    Immutable for the lifetime of the source it was read from.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct StreamDescriptor {
    /// Index in the container, stable for the session.
    pub index: usize,
    /// Media kind.
    pub kind: MediaKind,
    /// Codec, if it is one we name.
    pub codec_id: Option<CodecId>,
    /// Codec name as reported by the demuxer (e.g. "h264").
    pub codec_name: String,
    /// Frame width in pixels (0 for non-video streams).
    pub width: u32,
    /// Frame height in pixels (0 for non-video streams).
    pub height: u32,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Average frame rate, if known.
    pub frame_rate: Option<Rational>,
}

impl StreamDescriptor {
    /**
        Returns true if this is a video stream.
    */
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}
