/*!
    Media source and demuxing for the ffmpeg crate ecosystem.

    This crate handles the input side of the media pipeline. It opens a container
    from a file path or network URL, describes its streams, and produces encoded
    packets that downstream crates can decode.
*/

mod codec_config;
mod convert;
mod network;
mod source;
mod version;

pub use codec_config::CodecConfig;
pub use convert::{pixel_format_from_ffmpeg, pixel_format_to_ffmpeg, rational_from_ffmpeg};
pub use source::{Source, SourcePacket, open};
pub use version::library_version;

pub use ffmpeg_types::{Error, MediaKind, Result, StreamDescriptor};
