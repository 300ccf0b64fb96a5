/*!
    Media source implementation.
*/

use std::time::Duration;

use ffmpeg_next::{codec, format::context::Input as InputContext, format::stream::Stream};
use tracing::{debug, trace, warn};

use ffmpeg_types::{Error, PacketReader, Result, StreamDescriptor, StreamPacket};

use crate::codec_config::CodecConfig;
use crate::convert::{codec_id_from_ffmpeg, media_kind_from_ffmpeg, rational_from_ffmpeg};
use crate::network::NetworkGuard;

/**
    An open container session.

    Created by [`open`] or [`Source::open`]. Describes every stream of the
    container and produces packets of all of them in container order.
    Closing (explicitly or by drop) releases the demuxer before the network
    subsystem.
*/
pub struct Source {
    locator: String,
    /// The FFmpeg input context. `None` once closed.
    input: Option<InputContext>,
    /// Dropped after `input`; field order is release order.
    network: Option<NetworkGuard>,
    streams: Vec<StreamDescriptor>,
    /// Detached codec parameters, parallel to `streams`.
    parameters: Vec<codec::Parameters>,
    duration: Option<Duration>,
    exhausted: bool,
}

impl Source {
    /**
        Open a container from a file path or URL.

        # Example

        ```ignore
        let source = Source::open("https://example.com/live/playlist.m3u8")?;
        for stream in source.streams() {
            println!("#{} {:?} {}", stream.index, stream.kind, stream.codec_name);
        }
        ```
    */
    pub fn open(locator: &str) -> Result<Self> {
        if locator.trim().is_empty() {
            return Err(Error::open(locator, "locator is empty"));
        }
        if locator.contains('\0') {
            return Err(Error::open(locator, "locator contains a NUL byte"));
        }

        ffmpeg_next::init().map_err(|e| Error::open(locator, e))?;

        // Released automatically if anything below fails.
        let network = NetworkGuard::acquire();

        let input = ffmpeg_next::format::input(&locator).map_err(|e| Error::open(locator, e))?;

        let mut streams = Vec::with_capacity(input.streams().count());
        let mut parameters = Vec::with_capacity(streams.capacity());
        for stream in input.streams() {
            let descriptor = describe_stream(&stream);
            trace!(
                index = descriptor.index,
                kind = ?descriptor.kind,
                codec = %descriptor.codec_name,
                "found stream"
            );
            streams.push(descriptor);
            parameters.push(stream.parameters().clone());
        }

        if streams.is_empty() {
            return Err(Error::open(locator, "no streams found"));
        }

        let duration = (input.duration() > 0).then(|| Duration::from_micros(input.duration() as u64));

        debug!(locator, streams = streams.len(), ?duration, "opened source");

        Ok(Self {
            locator: locator.to_string(),
            input: Some(input),
            network: Some(network),
            streams,
            parameters,
            duration,
            exhausted: false,
        })
    }

    /**
        The locator this source was opened from.
    */
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /**
        Every stream of the container, in container order.
    */
    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    /**
        Codec configuration of the stream at `index`.

        Pass this to `ffmpeg-decode` to create a decoder.
    */
    pub fn codec_config(&self, index: usize) -> Option<CodecConfig> {
        self.parameters
            .get(index)
            .map(|parameters| CodecConfig::new(parameters.clone()))
    }

    /**
        Container duration, if known. Live streams usually have none.
    */
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /**
        Check if the demuxer is still open.
    */
    pub fn is_open(&self) -> bool {
        self.input.is_some()
    }

    /**
        Read the next packet from the source.

        Returns `Ok(Some(packet))` for each packet and `Ok(None)` at end of
        stream. Packets of all streams are returned in container order; use
        [`SourcePacket::stream_index`] to tell them apart.

        A read failure ends the stream just like end of file does. Once ended
        or closed, the source keeps returning `Ok(None)`.
    */
    pub fn next_packet(&mut self) -> Result<Option<SourcePacket>> {
        if self.exhausted {
            return Ok(None);
        }
        let Some(input) = self.input.as_mut() else {
            return Ok(None);
        };

        let mut packet = ffmpeg_next::Packet::empty();
        match packet.read(input) {
            Ok(()) => Ok(Some(SourcePacket { packet })),
            Err(ffmpeg_next::Error::Eof) => {
                debug!(locator = %self.locator, "end of container");
                self.exhausted = true;
                Ok(None)
            }
            Err(e) => {
                warn!(locator = %self.locator, error = %e, "packet read failed, ending stream");
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /**
        Release the demuxer and the network subsystem.

        Safe to call any number of times.
    */
    pub fn close(&mut self) {
        if self.input.take().is_some() {
            debug!(locator = %self.locator, "closed source");
        }
        self.network = None;
        self.exhausted = true;
    }
}

impl PacketReader for Source {
    type Packet = SourcePacket;

    fn read_packet(&mut self) -> Result<Option<SourcePacket>> {
        self.next_packet()
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("locator", &self.locator)
            .field("streams", &self.streams)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

/**
    One compressed packet read from a [`Source`].

    Owns its data; dropping it releases the packet.
*/
pub struct SourcePacket {
    packet: ffmpeg_next::Packet,
}

impl SourcePacket {
    pub fn pts(&self) -> Option<i64> {
        self.packet.pts()
    }

    pub fn is_key(&self) -> bool {
        self.packet.is_key()
    }

    pub fn size(&self) -> usize {
        self.packet.size()
    }

    /**
        The underlying FFmpeg packet, for submitting to a decoder.
    */
    pub fn as_ffmpeg(&self) -> &ffmpeg_next::Packet {
        &self.packet
    }
}

impl StreamPacket for SourcePacket {
    fn stream_index(&self) -> usize {
        self.packet.stream()
    }
}

impl std::fmt::Debug for SourcePacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcePacket")
            .field("stream_index", &self.stream_index())
            .field("pts", &self.pts())
            .field("size", &self.size())
            .finish()
    }
}

/**
    Open a media source.

    Convenience function equivalent to [`Source::open`].
*/
pub fn open(locator: &str) -> Result<Source> {
    Source::open(locator)
}

/**
    Build the descriptor for one container stream.
*/
fn describe_stream(stream: &Stream) -> StreamDescriptor {
    let parameters = stream.parameters();
    let codec_id = parameters.id();

    // SAFETY: We're reading from a valid AVCodecParameters pointer that FFmpeg owns
    let (width, height) = unsafe {
        let ptr = parameters.as_ptr();
        ((*ptr).width.max(0) as u32, (*ptr).height.max(0) as u32)
    };

    let frame_rate = rational_from_ffmpeg(stream.avg_frame_rate());

    StreamDescriptor {
        index: stream.index(),
        kind: media_kind_from_ffmpeg(parameters.medium()),
        codec_id: codec_id_from_ffmpeg(codec_id),
        codec_name: codec_id.name().to_string(),
        width,
        height,
        time_base: rational_from_ffmpeg(stream.time_base()),
        frame_rate: frame_rate.is_valid().then_some(frame_rate),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use ffmpeg_types::MediaKind;

    use super::*;

    /// Write a YUV4MPEG2 file whose frame `i` is filled with the byte `i`.
    fn write_y4m(dir: &Path, width: usize, height: usize, frames: usize) -> PathBuf {
        let path = dir.join("clip.y4m");
        let mut data = format!("YUV4MPEG2 W{width} H{height} F25:1 Ip A1:1 C420jpeg\n").into_bytes();
        let frame_size = width * height * 3 / 2;
        for i in 0..frames {
            data.extend_from_slice(b"FRAME\n");
            data.extend(vec![i as u8; frame_size]);
        }
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn empty_locator_is_rejected() {
        let err = Source::open("  ").unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.mp4");
        let err = Source::open(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::Open { .. }), "{err:?}");
    }

    #[test]
    fn empty_file_is_not_a_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();
        let err = Source::open(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::Open { .. }), "{err:?}");
    }

    #[test]
    fn y4m_exposes_one_video_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_y4m(dir.path(), 16, 8, 2);
        let source = Source::open(path.to_str().unwrap()).unwrap();

        let streams = source.streams();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].index, 0);
        assert_eq!(streams[0].kind, MediaKind::Video);
        assert_eq!((streams[0].width, streams[0].height), (16, 8));
        assert!(source.codec_config(0).is_some());
        assert!(source.codec_config(1).is_none());
    }

    #[test]
    fn reads_every_packet_then_stays_at_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_y4m(dir.path(), 16, 16, 3);
        let mut source = Source::open(path.to_str().unwrap()).unwrap();

        let mut count = 0;
        while let Some(packet) = source.next_packet().unwrap() {
            assert_eq!(packet.stream_index(), 0);
            count += 1;
        }
        assert_eq!(count, 3);
        assert!(source.next_packet().unwrap().is_none());
        assert!(source.next_packet().unwrap().is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_y4m(dir.path(), 16, 16, 1);
        let mut source = Source::open(path.to_str().unwrap()).unwrap();

        source.close();
        source.close();
        assert!(!source.is_open());
        assert!(source.next_packet().unwrap().is_none());
        assert_eq!(source.streams().len(), 1);
    }
}
