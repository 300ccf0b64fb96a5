/*!
    Traits for the two halves of the decode loop.
*/

use crate::Result;

/**
    A compressed packet tagged with the stream it belongs to.

    Packets are single-use; dropping one releases its storage.
*/
pub trait StreamPacket {
    /// Index of the stream this packet belongs to.
    fn stream_index(&self) -> usize;
}

/**
    Produces compressed packets in container order.
*/
pub trait PacketReader {
    type Packet: StreamPacket;

    /**
        Read the next packet of any stream.

        Returns `Ok(None)` once the container is exhausted, and keeps doing so
        on every later call.
    */
    fn read_packet(&mut self) -> Result<Option<Self::Packet>>;
}

/**
    Turns compressed packets into decoded frames.

    Mirrors the send/receive model: packets are submitted one at a time and
    frames are pulled out when the codec has them ready.
*/
pub trait FrameDecoder {
    type Packet;
    type Frame;

    /// Submit one packet.
    fn send_packet(&mut self, packet: &Self::Packet) -> Result<()>;

    /**
        Pull one decoded frame.

        Returns `Ok(None)` when the codec needs more input, or, after
        [`send_eof`](Self::send_eof), when it has nothing left.
    */
    fn receive_frame(&mut self) -> Result<Option<Self::Frame>>;

    /// Signal end of input so the codec releases frames it still holds.
    fn send_eof(&mut self) -> Result<()>;
}
