/*!
    Container formats and protocols available in the linked FFmpeg.
*/

use std::ffi::{CStr, c_char, c_void};
use std::ptr;

use ffmpeg_next::ffi;

/**
    Names of all input container formats, sorted and deduplicated.

    Demuxers registering several names ("mov,mp4,m4a,...") contribute
    each name separately.
*/
pub fn supported_formats() -> Vec<String> {
    let mut names = Vec::new();
    let mut opaque: *mut c_void = ptr::null_mut();

    loop {
        let format = unsafe { ffi::av_demuxer_iterate(&mut opaque) };
        if format.is_null() {
            break;
        }
        let Some(name) = (unsafe { c_string((*format).name) }) else {
            continue;
        };
        names.extend(
            name.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        );
    }

    names.sort();
    names.dedup();
    names
}

/**
    Names of all input protocols, sorted and deduplicated.
*/
pub fn supported_protocols() -> Vec<String> {
    let mut names = Vec::new();
    let mut opaque: *mut c_void = ptr::null_mut();

    loop {
        let name = unsafe { ffi::avio_enum_protocols(&mut opaque, 0) };
        if name.is_null() {
            break;
        }
        if let Some(name) = unsafe { c_string(name) } {
            names.push(name);
        }
    }

    names.sort();
    names.dedup();
    names
}

unsafe fn c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .ok()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_common_formats() {
        let formats = supported_formats();
        assert!(formats.iter().any(|name| name == "wav"));
        assert!(formats.iter().any(|name| name == "mp4"));
        assert!(formats.iter().all(|name| !name.contains(',')));
        assert!(formats.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn lists_file_protocol() {
        let protocols = supported_protocols();
        assert!(protocols.iter().any(|name| name == "file"));
        assert!(protocols.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
