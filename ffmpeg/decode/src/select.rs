/*!
    Stream selection and decoder setup.
*/

use tracing::debug;

use ffmpeg_source::Source;
use ffmpeg_types::{Error, Result, StreamDescriptor};

use crate::config::VideoDecoderConfig;
use crate::video::VideoDecoder;

/**
    Pick the first video stream in container order.

    Strictly first-in-order; resolution, codec and bitrate play no part.
*/
pub fn select_video_stream(streams: &[StreamDescriptor]) -> Result<&StreamDescriptor> {
    let stream = streams
        .iter()
        .find(|stream| stream.is_video())
        .ok_or(Error::NoVideoStream)?;

    debug!(
        index = stream.index,
        codec = %stream.codec_name,
        width = stream.width,
        height = stream.height,
        "selected video stream"
    );

    Ok(stream)
}

/**
    Open a decoder bound to `stream` of `source`.

    Fails with [`Error::UnsupportedCodec`] when no decoder is registered for
    the stream's codec, [`Error::CodecConfig`] when its parameters cannot be
    copied, and [`Error::DecoderOpen`] when the codec rejects them.
*/
pub fn open_decoder(
    source: &Source,
    stream: &StreamDescriptor,
    config: &VideoDecoderConfig,
) -> Result<VideoDecoder> {
    let codec_config = source.codec_config(stream.index).ok_or_else(|| {
        Error::CodecConfig(format!("no codec parameters for stream {}", stream.index))
    })?;

    VideoDecoder::open(codec_config, stream.time_base, config)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use ffmpeg_types::{MediaKind, Rational};

    use super::*;

    fn stream(index: usize, kind: MediaKind) -> StreamDescriptor {
        let is_video = kind == MediaKind::Video;
        StreamDescriptor {
            index,
            kind,
            codec_id: None,
            codec_name: if is_video { "h264" } else { "aac" }.to_string(),
            width: if is_video { 1280 } else { 0 },
            height: if is_video { 720 } else { 0 },
            time_base: Rational::new(1, 90000),
            frame_rate: None,
        }
    }

    fn write_y4m(dir: &Path, frames: usize) -> PathBuf {
        let path = dir.join("clip.y4m");
        let mut data = b"YUV4MPEG2 W16 H16 F25:1 Ip A1:1 C420jpeg\n".to_vec();
        for _ in 0..frames {
            data.extend_from_slice(b"FRAME\n");
            data.extend(vec![128u8; 16 * 16 * 3 / 2]);
        }
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Write an IVF file whose single video stream uses a fourcc no decoder knows.
    fn write_unknown_ivf(dir: &Path) -> PathBuf {
        let path = dir.join("unknown.ivf");
        let mut data = Vec::new();
        data.extend_from_slice(b"DKIF");
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&32u16.to_le_bytes());
        data.extend_from_slice(b"ZZZZ");
        data.extend_from_slice(&16u16.to_le_bytes());
        data.extend_from_slice(&16u16.to_le_bytes());
        data.extend_from_slice(&25u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        let payload = [0u8; 64];
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(&payload);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn selects_video_between_audio_streams() {
        let streams = [
            stream(0, MediaKind::Audio),
            stream(1, MediaKind::Video),
            stream(2, MediaKind::Audio),
        ];
        assert_eq!(select_video_stream(&streams).unwrap().index, 1);
    }

    #[test]
    fn first_video_stream_wins() {
        let mut second = stream(2, MediaKind::Video);
        second.width = 3840;
        second.height = 2160;
        let streams = [
            stream(0, MediaKind::Data),
            stream(1, MediaKind::Video),
            second,
        ];
        assert_eq!(select_video_stream(&streams).unwrap().index, 1);
    }

    #[test]
    fn no_video_stream_is_an_error() {
        let streams = [stream(0, MediaKind::Audio), stream(1, MediaKind::Subtitle)];
        assert_eq!(select_video_stream(&streams), Err(Error::NoVideoStream));
        assert_eq!(select_video_stream(&[]), Err(Error::NoVideoStream));
    }

    #[test]
    fn opens_decoder_for_raw_video() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_y4m(dir.path(), 1);
        let source = Source::open(path.to_str().unwrap()).unwrap();

        let stream = select_video_stream(source.streams()).unwrap().clone();
        let decoder = open_decoder(&source, &stream, &VideoDecoderConfig::default()).unwrap();

        assert_eq!((decoder.width(), decoder.height()), (16, 16));
        assert_eq!(decoder.codec_name(), "rawvideo");
    }

    #[test]
    fn missing_stream_parameters_are_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_y4m(dir.path(), 1);
        let source = Source::open(path.to_str().unwrap()).unwrap();

        let bogus = stream(7, MediaKind::Video);
        let err = open_decoder(&source, &bogus, &VideoDecoderConfig::default()).unwrap_err();
        assert!(matches!(err, Error::CodecConfig(_)), "{err:?}");
    }

    #[test]
    fn video_stream_without_decoder_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::open(write_unknown_ivf(dir.path()).to_str().unwrap()).unwrap();

        let stream = select_video_stream(source.streams()).unwrap().clone();
        let err = open_decoder(&source, &stream, &VideoDecoderConfig::default()).unwrap_err();

        assert!(matches!(err, Error::UnsupportedCodec(_)), "{err:?}");
    }
}
