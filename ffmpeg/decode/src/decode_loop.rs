/*!
    Pull-model decode loop.
*/

use tracing::{debug, trace, warn};

use ffmpeg_types::{Error, FrameDecoder, PacketReader, Result, StreamPacket};

use crate::config::VideoDecoderConfig;

/**
    Counters describing the work done by a [`DecodeLoop`].
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Packets read from the source, any stream.
    pub packets_read: u64,
    /// Packets dropped because they belong to another stream.
    pub packets_skipped: u64,
    /// Packets accepted by the decoder.
    pub packets_submitted: u64,
    /// Packets the decoder rejected.
    pub submission_failures: u64,
    /// Frames handed out.
    pub frames_decoded: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Reading,
    Draining,
    Finished,
}

/**
    Decodes one stream of a source, one frame per call.

    Each call to [`next_frame`](Self::next_frame) reads packets until the
    decoder yields a frame or the source ends. Packets of other streams are
    dropped without reaching the decoder. Packets the decoder rejects are
    dropped and reading continues.
*/
#[derive(Debug)]
pub struct DecodeLoop {
    active_index: usize,
    max_consecutive_failures: Option<u32>,
    consecutive_failures: u32,
    phase: Phase,
    stats: DecodeStats,
}

impl DecodeLoop {
    /**
        Create a loop decoding the stream at `active_index`.
    */
    pub fn new(active_index: usize, config: &VideoDecoderConfig) -> Self {
        Self {
            active_index,
            max_consecutive_failures: config.max_consecutive_send_failures,
            consecutive_failures: 0,
            phase: Phase::Reading,
            stats: DecodeStats::default(),
        }
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /**
        Returns true once the stream is exhausted and the decoder drained.
    */
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /**
        Decode the next frame.

        Returns `Ok(Some(frame))` for each frame and `Ok(None)` at end of
        stream, on this and every later call. Blocks for as many packet reads
        as it takes.

        At end of source the decoder is drained, so frames it still buffers
        are returned before `Ok(None)`.
    */
    pub fn next_frame<R, D>(&mut self, reader: &mut R, decoder: &mut D) -> Result<Option<D::Frame>>
    where
        R: PacketReader,
        D: FrameDecoder<Packet = R::Packet>,
    {
        match self.phase {
            Phase::Finished => return Ok(None),
            Phase::Draining => return Ok(self.drain_one(decoder)),
            Phase::Reading => {}
        }

        // A packet can leave more than one frame in the codec; hand those out first.
        if self.stats.packets_submitted > 0 {
            if let Some(frame) = self.receive(decoder) {
                return Ok(Some(frame));
            }
        }

        while let Some(packet) = reader.read_packet()? {
            self.stats.packets_read += 1;

            if packet.stream_index() != self.active_index {
                self.stats.packets_skipped += 1;
                continue;
            }

            if let Err(e) = decoder.send_packet(&packet) {
                self.stats.submission_failures += 1;
                self.consecutive_failures += 1;
                warn!(
                    stream = self.active_index,
                    consecutive = self.consecutive_failures,
                    error = %e,
                    "decoder rejected packet, skipping"
                );

                if let Some(limit) = self.max_consecutive_failures {
                    if self.consecutive_failures >= limit.max(1) {
                        return Err(Error::SubmissionFailed {
                            consecutive: self.consecutive_failures,
                        });
                    }
                }
                continue;
            }

            self.consecutive_failures = 0;
            self.stats.packets_submitted += 1;

            if let Some(frame) = self.receive(decoder) {
                return Ok(Some(frame));
            }
            trace!(stream = self.active_index, "decoder buffering");
        }

        debug!(stream = self.active_index, stats = ?self.stats, "end of source");

        if let Err(e) = decoder.send_eof() {
            warn!(error = %e, "failed to drain decoder");
            self.phase = Phase::Finished;
            return Ok(None);
        }

        self.phase = Phase::Draining;
        Ok(self.drain_one(decoder))
    }

    fn receive<D: FrameDecoder>(&mut self, decoder: &mut D) -> Option<D::Frame> {
        match decoder.receive_frame() {
            Ok(Some(frame)) => {
                self.stats.frames_decoded += 1;
                Some(frame)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(stream = self.active_index, error = %e, "frame retrieval failed");
                None
            }
        }
    }

    fn drain_one<D: FrameDecoder>(&mut self, decoder: &mut D) -> Option<D::Frame> {
        let frame = self.receive(decoder);
        if frame.is_none() {
            debug!(stream = self.active_index, "decoder drained");
            self.phase = Phase::Finished;
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    struct TestPacket {
        stream: usize,
        id: usize,
        dropped: Rc<Cell<usize>>,
    }

    impl StreamPacket for TestPacket {
        fn stream_index(&self) -> usize {
            self.stream
        }
    }

    impl Drop for TestPacket {
        fn drop(&mut self) {
            self.dropped.set(self.dropped.get() + 1);
        }
    }

    struct TestReader {
        packets: VecDeque<TestPacket>,
        dropped: Rc<Cell<usize>>,
    }

    impl TestReader {
        fn new(streams: &[usize]) -> Self {
            let dropped = Rc::new(Cell::new(0));
            let packets = streams
                .iter()
                .enumerate()
                .map(|(id, &stream)| TestPacket {
                    stream,
                    id,
                    dropped: Rc::clone(&dropped),
                })
                .collect();
            Self { packets, dropped }
        }
    }

    impl PacketReader for TestReader {
        type Packet = TestPacket;

        fn read_packet(&mut self) -> Result<Option<TestPacket>> {
            Ok(self.packets.pop_front())
        }
    }

    /// Emits `frames_per_packet` frames per accepted packet, holding back
    /// `delay` frames until end of input.
    #[derive(Default)]
    struct TestDecoder {
        delay: usize,
        frames_per_packet: usize,
        reject: Vec<usize>,
        reject_all: bool,
        submitted: Vec<usize>,
        pending: VecDeque<usize>,
        eof: bool,
    }

    impl TestDecoder {
        fn new() -> Self {
            Self {
                frames_per_packet: 1,
                ..Default::default()
            }
        }
    }

    impl FrameDecoder for TestDecoder {
        type Packet = TestPacket;
        type Frame = usize;

        fn send_packet(&mut self, packet: &TestPacket) -> Result<()> {
            if self.reject_all || self.reject.contains(&packet.id) {
                return Err(Error::decode("invalid data"));
            }
            self.submitted.push(packet.id);
            for _ in 0..self.frames_per_packet {
                self.pending.push_back(packet.id);
            }
            Ok(())
        }

        fn receive_frame(&mut self) -> Result<Option<usize>> {
            if self.eof || self.pending.len() > self.delay {
                Ok(self.pending.pop_front())
            } else {
                Ok(None)
            }
        }

        fn send_eof(&mut self) -> Result<()> {
            self.eof = true;
            Ok(())
        }
    }

    fn drain(
        decode_loop: &mut DecodeLoop,
        reader: &mut TestReader,
        decoder: &mut TestDecoder,
    ) -> Vec<usize> {
        let mut frames = Vec::new();
        while let Some(frame) = decode_loop.next_frame(reader, decoder).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn other_streams_never_reach_the_decoder() {
        let streams = [0, 1, 0, 2, 1, 0, 1];
        let mut reader = TestReader::new(&streams);
        let mut decoder = TestDecoder::new();
        let mut decode_loop = DecodeLoop::new(1, &VideoDecoderConfig::default());

        let frames = drain(&mut decode_loop, &mut reader, &mut decoder);

        assert_eq!(decoder.submitted, vec![1, 4, 6]);
        assert_eq!(frames, vec![1, 4, 6]);
        let stats = decode_loop.stats();
        assert_eq!(stats.packets_read, 7);
        assert_eq!(stats.packets_skipped, 4);
        assert_eq!(stats.packets_submitted, 3);
    }

    #[test]
    fn n_frames_then_end_of_stream_forever() {
        let mut reader = TestReader::new(&[0; 5]);
        let mut decoder = TestDecoder::new();
        let mut decode_loop = DecodeLoop::new(0, &VideoDecoderConfig::default());

        for expected in 0..5 {
            let frame = decode_loop.next_frame(&mut reader, &mut decoder).unwrap();
            assert_eq!(frame, Some(expected));
        }
        assert_eq!(decode_loop.next_frame(&mut reader, &mut decoder).unwrap(), None);
        assert_eq!(decode_loop.next_frame(&mut reader, &mut decoder).unwrap(), None);
        assert!(decode_loop.is_finished());
    }

    #[test]
    fn stops_at_the_first_frame() {
        let mut reader = TestReader::new(&[0, 0, 0]);
        let mut decoder = TestDecoder::new();
        let mut decode_loop = DecodeLoop::new(0, &VideoDecoderConfig::default());

        decode_loop.next_frame(&mut reader, &mut decoder).unwrap();

        assert_eq!(decode_loop.stats().packets_read, 1);
        assert_eq!(reader.packets.len(), 2);
    }

    #[test]
    fn buffering_codec_reads_ahead_and_drains_at_end() {
        let mut reader = TestReader::new(&[0, 0, 0, 0]);
        let mut decoder = TestDecoder {
            delay: 2,
            ..TestDecoder::new()
        };
        let mut decode_loop = DecodeLoop::new(0, &VideoDecoderConfig::default());

        let first = decode_loop.next_frame(&mut reader, &mut decoder).unwrap();
        assert_eq!(first, Some(0));
        assert_eq!(decode_loop.stats().packets_read, 3);

        let rest = drain(&mut decode_loop, &mut reader, &mut decoder);
        assert_eq!(rest, vec![1, 2, 3]);
    }

    #[test]
    fn several_frames_per_packet_come_out_one_per_call() {
        let mut reader = TestReader::new(&[0, 0]);
        let mut decoder = TestDecoder {
            frames_per_packet: 2,
            ..TestDecoder::new()
        };
        let mut decode_loop = DecodeLoop::new(0, &VideoDecoderConfig::default());

        let frames = drain(&mut decode_loop, &mut reader, &mut decoder);

        assert_eq!(frames, vec![0, 0, 1, 1]);
        assert_eq!(decode_loop.stats().frames_decoded, 4);
    }

    #[test]
    fn rejected_packet_is_skipped() {
        let mut reader = TestReader::new(&[0, 0, 0]);
        let mut decoder = TestDecoder {
            reject: vec![1],
            ..TestDecoder::new()
        };
        let mut decode_loop = DecodeLoop::new(0, &VideoDecoderConfig::default());

        let frames = drain(&mut decode_loop, &mut reader, &mut decoder);

        assert_eq!(frames, vec![0, 2]);
        assert_eq!(decode_loop.stats().submission_failures, 1);
    }

    #[test]
    fn persistent_rejection_is_unbounded_by_default() {
        let mut reader = TestReader::new(&[0; 50]);
        let mut decoder = TestDecoder {
            reject_all: true,
            ..TestDecoder::new()
        };
        let mut decode_loop = DecodeLoop::new(0, &VideoDecoderConfig::default());

        assert_eq!(decode_loop.next_frame(&mut reader, &mut decoder).unwrap(), None);
        assert_eq!(decode_loop.stats().submission_failures, 50);
    }

    #[test]
    fn rejection_limit_surfaces_an_error() {
        let mut reader = TestReader::new(&[0, 1, 0, 0, 0, 0]);
        let mut decoder = TestDecoder {
            reject_all: true,
            ..TestDecoder::new()
        };
        let config = VideoDecoderConfig::default().with_max_consecutive_send_failures(3);
        let mut decode_loop = DecodeLoop::new(0, &config);

        let err = decode_loop.next_frame(&mut reader, &mut decoder).unwrap_err();

        assert_eq!(err, Error::SubmissionFailed { consecutive: 3 });
        assert_eq!(reader.packets.len(), 2);
    }

    #[test]
    fn accepted_packet_resets_the_rejection_count() {
        let mut reader = TestReader::new(&[0, 0, 0, 0, 0]);
        let mut decoder = TestDecoder {
            reject: vec![0, 1, 3, 4],
            ..TestDecoder::new()
        };
        let config = VideoDecoderConfig::default().with_max_consecutive_send_failures(3);
        let mut decode_loop = DecodeLoop::new(0, &config);

        let frames = drain(&mut decode_loop, &mut reader, &mut decoder);

        assert_eq!(frames, vec![2]);
    }

    #[test]
    fn every_packet_is_released() {
        let streams = [0, 1, 0, 1, 0];
        let mut reader = TestReader::new(&streams);
        let dropped = Rc::clone(&reader.dropped);
        let mut decoder = TestDecoder {
            reject: vec![2],
            ..TestDecoder::new()
        };
        let mut decode_loop = DecodeLoop::new(0, &VideoDecoderConfig::default());

        let first = decode_loop.next_frame(&mut reader, &mut decoder).unwrap();
        assert_eq!(first, Some(0));
        assert_eq!(dropped.get(), 1);

        drain(&mut decode_loop, &mut reader, &mut decoder);
        assert_eq!(dropped.get(), streams.len());
    }
}
