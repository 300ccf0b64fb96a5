/*!
    Opaque codec configuration for passing to decoders.
*/

use ffmpeg_next::codec;

/**
    Opaque codec configuration extracted from a source stream.

    Holds a detached copy of the stream's codec parameters, so it stays valid
    after the source that produced it is closed. Pass this to `ffmpeg-decode`
    to create a decoder for the stream.
*/
pub struct CodecConfig {
    parameters: codec::Parameters,
}

impl CodecConfig {
    pub(crate) fn new(parameters: codec::Parameters) -> Self {
        Self { parameters }
    }

    /**
        Codec identifier of the stream.
    */
    pub fn codec_id(&self) -> codec::Id {
        self.parameters.id()
    }

    /**
        Consume the config, returning the raw codec parameters.
    */
    pub fn into_parameters(self) -> codec::Parameters {
        self.parameters
    }
}

impl From<codec::Parameters> for CodecConfig {
    fn from(parameters: codec::Parameters) -> Self {
        Self::new(parameters)
    }
}

impl Clone for CodecConfig {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
        }
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("codec_id", &self.parameters.id())
            .finish_non_exhaustive()
    }
}
