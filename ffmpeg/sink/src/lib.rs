/*!
    Frame output for the ffmpeg crate ecosystem.

    This crate is the last stage of the pipeline. It takes the frames produced
    by `ffmpeg-decode` and hands them to the caller in a form the caller owns:
    a tightly packed copy of the decoded planes, or a packed BGRA image ready
    for display.

    Any other output target plugs in by implementing [`FrameSink`].
*/

mod bgra;
mod buffer;

pub use bgra::BgraSink;
pub use buffer::{FrameSink, OutputBuffer, Plane, PlaneCopySink, to_output_buffer};

pub use ffmpeg_decode::DecodedFrame;
pub use ffmpeg_types::{Error, PixelFormat, Result};
