/*!
    Error type shared by every crate in the pipeline.
*/

use thiserror::Error;

/**
    Errors produced while opening, decoding or converting media.

    End of stream is not an error: decode calls report it as `Ok(None)`.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("failed to open '{locator}': {reason}")]
    Open { locator: String, reason: String },

    #[error("no video stream found")]
    NoVideoStream,

    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("failed to copy codec parameters: {0}")]
    CodecConfig(String),

    #[error("failed to open decoder: {0}")]
    DecoderOpen(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("decoder rejected {consecutive} packets in a row")]
    SubmissionFailed { consecutive: u32 },

    #[error("frame conversion failed: {0}")]
    Conversion(String),

    #[error("pipeline is not open")]
    NotOpen,
}

impl Error {
    /**
        Create an open error for the given locator.
    */
    pub fn open(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self::Open {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /**
        Create a decode error.
    */
    pub fn decode(reason: impl ToString) -> Self {
        Self::Decode(reason.to_string())
    }

    /**
        Create a conversion error.
    */
    pub fn conversion(reason: impl ToString) -> Self {
        Self::Conversion(reason.to_string())
    }
}

/// Type alias for results that may return an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
