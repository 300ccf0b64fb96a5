/*!
    Shared types for the ffmpeg crate ecosystem.

    This crate defines the vocabulary of the ecosystem: the types that cross crate
    boundaries. It has no dependency on FFmpeg, making it lightweight and enabling
    consumers to depend on it without pulling in FFmpeg bindings.

    The [`PacketReader`] and [`FrameDecoder`] traits describe the two halves of the
    decode loop so that the loop itself can be driven by FFmpeg-backed sources and
    decoders as well as by in-memory doubles.
*/

mod error;
mod format;
mod stream;
mod time;
mod traits;

pub use error::{Error, Result};
pub use format::{PixelFormat, PlaneLayout};
pub use stream::{CodecId, MediaKind, StreamDescriptor};
pub use time::{Pts, Rational};
pub use traits::{FrameDecoder, PacketReader, StreamPacket};
