/*!
    Single-stream video decode pipeline.

    A [`Player`] opens one media locator (file path or network URL), picks its
    first video stream, and decodes it one frame per call. Each frame is handed
    to a [`FrameSink`] and the sink's output is kept as the latest frame until
    the next call replaces it.

    ```ignore
    use iptvplayer::Player;

    let mut player = Player::default();
    player.open("http://example.com/live/channel.ts")?;
    while let Some(frame) = player.decode_next_frame()? {
        println!("{}x{} pts={:?}", frame.width, frame.height, frame.pts);
    }
    player.close();
    ```
*/

mod player;

pub use player::{Player, PlayerConfig, PlayerState};

pub use ffmpeg_decode::{DecodeStats, DecodedFrame, VideoDecoderConfig};
pub use ffmpeg_sink::{BgraSink, FrameSink, OutputBuffer, Plane, PlaneCopySink, to_output_buffer};
pub use ffmpeg_source::library_version;
pub use ffmpeg_types::{Error, MediaKind, PixelFormat, Pts, Rational, Result, StreamDescriptor};
