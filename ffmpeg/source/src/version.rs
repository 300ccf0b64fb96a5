/*!
    Library version query.
*/

use std::ffi::CStr;

use ffmpeg_next::ffi;

/**
    Version string of the linked FFmpeg libraries (e.g. "7.1.1").

    Needs no open source; intended for diagnostics.
*/
pub fn library_version() -> String {
    // SAFETY: av_version_info returns a pointer to a static NUL-terminated string.
    let version = unsafe { CStr::from_ptr(ffi::av_version_info()) };
    version.to_string_lossy().into_owned()
}
