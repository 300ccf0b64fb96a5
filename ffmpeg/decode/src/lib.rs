/*!
    Media decoding for the ffmpeg crate ecosystem.

    This crate turns the packets produced by `ffmpeg-source` into raw video
    frames. It picks the stream to decode, opens a decoder bound to it, and
    runs the pull-model decode loop that yields one frame per call.

    ```ignore
    use ffmpeg_decode::{DecodeLoop, VideoDecoderConfig, open_decoder, select_video_stream};

    let mut source = ffmpeg_source::open("clip.mp4")?;
    let config = VideoDecoderConfig::default();
    let stream = select_video_stream(source.streams())?.clone();
    let mut decoder = open_decoder(&source, &stream, &config)?;
    let mut decode_loop = DecodeLoop::new(stream.index, &config);

    while let Some(frame) = decode_loop.next_frame(&mut source, &mut decoder)? {
        println!("{}x{} pts={:?}", frame.width(), frame.height(), frame.pts());
    }
    ```
*/

mod config;
mod decode_loop;
mod frame;
mod select;
mod video;

pub use config::VideoDecoderConfig;
pub use decode_loop::{DecodeLoop, DecodeStats};
pub use frame::DecodedFrame;
pub use select::{open_decoder, select_video_stream};
pub use video::VideoDecoder;

pub use ffmpeg_types::{Error, PixelFormat, Pts, Rational, Result, StreamDescriptor};
