/*!
    Video decoder implementation.
*/

use ffmpeg_next::{
    codec::{self, decoder::Video as VideoDecoderFFmpeg, threading},
    ffi,
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::{debug, info, trace};

use ffmpeg_source::{CodecConfig, SourcePacket};
use ffmpeg_types::{Error, FrameDecoder, Rational, Result};

use crate::config::VideoDecoderConfig;
use crate::frame::DecodedFrame;

/**
    Video decoder.

    Decodes the packets of one video stream into frames. Created by
    [`open_decoder`](crate::open_decoder) or [`VideoDecoder::open`].
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    time_base: Rational,
    codec_name: String,
}

impl VideoDecoder {
    /**
        Create and open a decoder from codec configuration.

        # Arguments

        * `codec_config` - Codec configuration from the source
        * `time_base` - Time base for the video stream
        * `config` - Decoder configuration
    */
    pub fn open(
        codec_config: CodecConfig,
        time_base: Rational,
        config: &VideoDecoderConfig,
    ) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::DecoderOpen(e.to_string()))?;

        let codec_id = codec_config.codec_id();
        let codec = ffmpeg_next::decoder::find(codec_id)
            .ok_or_else(|| Error::UnsupportedCodec(codec_id.name().to_string()))?;

        let mut context = codec::context::Context::new_with_codec(codec);
        context
            .set_parameters(codec_config.into_parameters())
            .map_err(|e| Error::CodecConfig(e.to_string()))?;

        if let Some(count) = config.threads {
            context.set_threading(threading::Config {
                kind: threading::Type::Frame,
                count,
                ..Default::default()
            });
        }

        let decoder = context
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.video())
            .map_err(|e| Error::DecoderOpen(e.to_string()))?;

        info!(
            codec = codec_id.name(),
            "stream opened: resolution {}x{}",
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            decoder,
            time_base,
            codec_name: codec_id.name().to_string(),
        })
    }

    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /**
        Get the time base for this decoder.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn codec_name(&self) -> &str {
        &self.codec_name
    }

    /**
        Submit one compressed packet.
    */
    pub fn send(&mut self, packet: &ffmpeg_next::Packet) -> Result<()> {
        self.decoder
            .send_packet(packet)
            .map_err(|e| Error::decode(format!("send_packet: {}", e)))
    }

    /**
        Pull one decoded frame, if the codec has one ready.

        Returns `Ok(None)` when the codec needs more input or has been fully
        drained.
    */
    pub fn receive(&mut self) -> Result<Option<DecodedFrame>> {
        let mut frame = VideoFrameFFmpeg::empty();

        match self.decoder.receive_frame(&mut frame) {
            Ok(()) => {
                trace!(
                    width = frame.width(),
                    height = frame.height(),
                    pts = ?frame.pts(),
                    "decoded frame"
                );
                Ok(Some(DecodedFrame::from_ffmpeg(frame, self.time_base)))
            }
            // Need more input
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => Ok(None),
            // No more frames
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(e) => Err(Error::decode(format!("receive_frame: {}", e))),
        }
    }

    /**
        Enter draining mode so the codec releases the frames it buffers.
    */
    pub fn flush(&mut self) -> Result<()> {
        match self.decoder.send_eof() {
            Ok(()) => {
                debug!(codec = %self.codec_name, "decoder draining");
                Ok(())
            }
            // Already draining
            Err(ffmpeg_next::Error::Eof) => Ok(()),
            Err(e) => Err(Error::decode(format!("send_eof: {}", e))),
        }
    }
}

impl FrameDecoder for VideoDecoder {
    type Packet = SourcePacket;
    type Frame = DecodedFrame;

    fn send_packet(&mut self, packet: &SourcePacket) -> Result<()> {
        self.send(packet.as_ffmpeg())
    }

    fn receive_frame(&mut self) -> Result<Option<DecodedFrame>> {
        self.receive()
    }

    fn send_eof(&mut self) -> Result<()> {
        self.flush()
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("codec", &self.codec_name)
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}
