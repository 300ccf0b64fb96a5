/*!
    Network subsystem lifetime.
*/

use tracing::trace;

/**
    Holds one reference on FFmpeg's network subsystem.

    FFmpeg counts init/deinit calls, so every open source owns its own guard
    and the subsystem is torn down when the last one is dropped.
*/
pub(crate) struct NetworkGuard {
    _private: (),
}

impl NetworkGuard {
    pub(crate) fn acquire() -> Self {
        ffmpeg_next::format::network::init();
        trace!("network subsystem acquired");
        Self { _private: () }
    }
}

impl Drop for NetworkGuard {
    fn drop(&mut self) {
        ffmpeg_next::format::network::deinit();
        trace!("network subsystem released");
    }
}
