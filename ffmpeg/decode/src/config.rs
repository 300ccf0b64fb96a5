/*!
    Decoder configuration.
*/

/**
    Configuration for opening a video decoder and running its decode loop.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoDecoderConfig {
    /// Frame-threading worker count. `None` keeps the codec default.
    pub threads: Option<usize>,
    /**
        Fail a decode call after this many packets in a row were rejected by
        the decoder. `None` skips rejected packets forever.
    */
    pub max_consecutive_send_failures: Option<u32>,
}

impl VideoDecoderConfig {
    /**
        Set the frame-threading worker count.
    */
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /**
        Limit how many packets in a row the decoder may reject.
    */
    pub fn with_max_consecutive_send_failures(mut self, limit: u32) -> Self {
        self.max_consecutive_send_failures = Some(limit);
        self
    }
}
