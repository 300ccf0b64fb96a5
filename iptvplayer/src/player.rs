/*!
    Pipeline instance and its lifecycle.
*/

use tracing::{debug, trace, warn};

use ffmpeg_decode::{
    DecodeLoop, DecodeStats, VideoDecoder, VideoDecoderConfig, open_decoder, select_video_stream,
};
use ffmpeg_sink::{FrameSink, PlaneCopySink};
use ffmpeg_source::Source;
use ffmpeg_types::{Error, Result, StreamDescriptor};

/**
    Lifecycle state of a [`Player`].
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing is open.
    #[default]
    Closed,
    /// Source, stream and decoder are being acquired.
    Opening,
    /// Open and waiting for the next decode call.
    Ready,
    /// A decode call is in progress.
    Decoding,
    /// The stream is exhausted. Stays open until closed.
    Ended,
}

/**
    Configuration for a [`Player`].
*/
#[derive(Clone, Debug, Default)]
pub struct PlayerConfig {
    pub decoder: VideoDecoderConfig,
}

impl PlayerConfig {
    pub fn with_decoder(mut self, decoder: VideoDecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }
}

/// Everything acquired by a successful open. Fields drop in declaration order.
struct Session {
    decoder: VideoDecoder,
    decode_loop: DecodeLoop,
    stream: StreamDescriptor,
    source: Source,
}

impl Session {
    fn start(locator: &str, config: &VideoDecoderConfig) -> Result<Self> {
        let source = Source::open(locator)?;
        let stream = select_video_stream(source.streams())?.clone();
        let decoder = open_decoder(&source, &stream, config)?;
        let decode_loop = DecodeLoop::new(stream.index, config);

        Ok(Self {
            decoder,
            decode_loop,
            stream,
            source,
        })
    }

    fn close(self) {
        let Self {
            decoder,
            decode_loop,
            stream,
            mut source,
        } = self;

        drop(decoder);
        trace!(stats = ?decode_loop.stats(), "released decoder");
        drop(decode_loop);
        drop(stream);
        source.close();
    }
}

/**
    Decodes the first video stream of one locator, one frame per call.

    At most one source, one selected stream and one decoder are alive at a
    time. They are acquired together by [`open`](Self::open) and released
    together, in reverse order, by [`close`](Self::close) or drop.

    Every decoded frame goes through the sink `S`; the sink's output becomes
    the latest frame.
*/
pub struct Player<S: FrameSink = PlaneCopySink> {
    sink: S,
    config: PlayerConfig,
    session: Option<Session>,
    state: PlayerState,
    latest: Option<S::Output>,
}

impl<S: FrameSink> Player<S> {
    pub fn new(sink: S, config: PlayerConfig) -> Self {
        Self {
            sink,
            config,
            session: None,
            state: PlayerState::Closed,
            latest: None,
        }
    }

    /**
        Open a locator and prepare its first video stream for decoding.

        An already open player is closed first. On failure nothing stays
        open and the player is [`PlayerState::Closed`].
    */
    pub fn open(&mut self, locator: &str) -> Result<()> {
        if self.is_open() {
            debug!("closing previous session");
            self.close();
        }

        self.state = PlayerState::Opening;
        match Session::start(locator, &self.config.decoder) {
            Ok(session) => {
                debug!(
                    locator,
                    stream = session.stream.index,
                    codec = %session.stream.codec_name,
                    "player ready"
                );
                self.session = Some(session);
                self.state = PlayerState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!(locator, error = %e, "failed to open");
                self.state = PlayerState::Closed;
                Err(e)
            }
        }
    }

    /**
        Decode the next frame of the selected stream.

        Returns the sink's output for the frame, which also becomes the
        latest frame. Returns `Ok(None)` once the stream is exhausted, on
        that call and every later one, and clears the latest frame.

        Fails with [`Error::NotOpen`] when nothing is open. Any other error
        leaves the player ready for another call.
    */
    pub fn decode_next_frame(&mut self) -> Result<Option<&S::Output>> {
        let Some(session) = self.session.as_mut() else {
            return Err(Error::NotOpen);
        };
        if self.state == PlayerState::Ended {
            return Ok(None);
        }

        self.state = PlayerState::Decoding;
        let result = session
            .decode_loop
            .next_frame(&mut session.source, &mut session.decoder)
            .and_then(|frame| frame.map(|frame| self.sink.accept(&frame)).transpose());

        match result {
            Ok(Some(output)) => {
                self.state = PlayerState::Ready;
                self.latest = Some(output);
                Ok(self.latest.as_ref())
            }
            Ok(None) => {
                debug!(stats = ?session.decode_loop.stats(), "end of stream");
                self.state = PlayerState::Ended;
                self.latest = None;
                Ok(None)
            }
            Err(e) => {
                self.state = PlayerState::Ready;
                Err(e)
            }
        }
    }

    /**
        Output of the most recent successful decode call.
    */
    pub fn latest_frame(&self) -> Option<&S::Output> {
        self.latest.as_ref()
    }

    /**
        Take ownership of the latest frame, leaving none behind.
    */
    pub fn take_latest_frame(&mut self) -> Option<S::Output> {
        self.latest.take()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /**
        The selected video stream, while open.
    */
    pub fn active_stream(&self) -> Option<&StreamDescriptor> {
        self.session.as_ref().map(|session| &session.stream)
    }

    /**
        Every stream of the open source. Empty when closed.
    */
    pub fn streams(&self) -> &[StreamDescriptor] {
        self.session
            .as_ref()
            .map(|session| session.source.streams())
            .unwrap_or_default()
    }

    pub fn locator(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.source.locator())
    }

    pub fn stats(&self) -> Option<DecodeStats> {
        self.session
            .as_ref()
            .map(|session| session.decode_loop.stats())
    }

    /**
        Release the decoder, the stream selection and the source, in that
        order. Does nothing if already closed.
    */
    pub fn close(&mut self) {
        self.latest = None;
        if let Some(session) = self.session.take() {
            let locator = session.source.locator().to_string();
            session.close();
            debug!(locator = %locator, "player closed");
        }
        self.state = PlayerState::Closed;
    }
}

impl Default for Player<PlaneCopySink> {
    fn default() -> Self {
        Self::new(PlaneCopySink, PlayerConfig::default())
    }
}

impl<S: FrameSink> Drop for Player<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: FrameSink> std::fmt::Debug for Player<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("state", &self.state)
            .field("locator", &self.locator())
            .field("active_stream", &self.active_stream().map(|stream| stream.index))
            .field("has_latest_frame", &self.latest.is_some())
            .finish_non_exhaustive()
    }
}
