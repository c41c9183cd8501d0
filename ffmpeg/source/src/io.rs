/*!
    Caller-supplied byte streams as demuxer input.
*/

use std::ffi::{c_int, c_void};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::time::Duration;
use std::{slice, thread};

use ffmpeg_next::ffi;
use log::warn;

use ffmpeg_types::{Error, Result};

use crate::abort::AbortHandle;

/// Sleep between retries when a byte stream or device has no data yet.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(10);

const BUFFER_SIZE: usize = 32 * 1024;

// libavformat/avio.h
const AVSEEK_SIZE: c_int = 0x10000;
const AVSEEK_FORCE: c_int = 0x20000;

/**
    A byte stream the demuxer can read a container from.

    `read` may return [`io::ErrorKind::WouldBlock`] while no data is
    available yet. The demuxer then polls again until data arrives or the
    read is aborted. A read of 0 bytes marks the end of the stream.
*/
pub trait MediaIo: Send {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /**
        Reposition the stream. Only called when [`MediaIo::is_seekable`]
        returns true.
    */
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /**
        Total size in bytes, if known.
    */
    fn size(&mut self) -> Option<u64> {
        None
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

impl MediaIo for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }

    fn size(&mut self) -> Option<u64> {
        self.metadata().ok().map(|metadata| metadata.len())
    }
}

impl<T: AsRef<[u8]> + Send> MediaIo for Cursor<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }

    fn size(&mut self) -> Option<u64> {
        Some(self.get_ref().as_ref().len() as u64)
    }
}

struct IoOpaque {
    io: Box<dyn MediaIo>,
    abort: AbortHandle,
}

/**
    AVIOContext driving a [`MediaIo`].

    Must outlive the format context it is attached to.
*/
pub(crate) struct IoContext {
    ptr: *mut ffi::AVIOContext,
    opaque: *mut IoOpaque,
}

// SAFETY: The AVIOContext and the boxed MediaIo (which is Send) are only
// used by the session that owns this context.
unsafe impl Send for IoContext {}

impl IoContext {
    pub(crate) fn new(io: Box<dyn MediaIo>, abort: AbortHandle) -> Result<Self> {
        let seekable = io.is_seekable();
        let opaque = Box::into_raw(Box::new(IoOpaque { io, abort }));

        unsafe {
            let buffer = ffi::av_malloc(BUFFER_SIZE) as *mut u8;
            if buffer.is_null() {
                drop(Box::from_raw(opaque));
                return Err(Error::invalid_input("failed to allocate I/O buffer"));
            }

            let ptr = ffi::avio_alloc_context(
                buffer,
                BUFFER_SIZE as c_int,
                0,
                opaque as *mut c_void,
                Some(read_packet),
                None,
                if seekable { Some(seek) } else { None },
            );
            if ptr.is_null() {
                ffi::av_free(buffer as *mut c_void);
                drop(Box::from_raw(opaque));
                return Err(Error::invalid_input("failed to allocate I/O context"));
            }

            Ok(Self { ptr, opaque })
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut ffi::AVIOContext {
        self.ptr
    }
}

impl Drop for IoContext {
    fn drop(&mut self) {
        unsafe {
            // The buffer may have been replaced by FFmpeg, free the current one
            ffi::av_freep(&mut (*self.ptr).buffer as *mut *mut u8 as *mut c_void);
            ffi::avio_context_free(&mut self.ptr);
            drop(Box::from_raw(self.opaque));
        }
    }
}

unsafe extern "C" fn read_packet(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
    // SAFETY: `opaque` is the IoOpaque owned by the IoContext, which
    // outlives every call made through the AVIOContext.
    let opaque = unsafe { &mut *(opaque as *mut IoOpaque) };
    if buf.is_null() || buf_size <= 0 {
        return 0;
    }
    let buf = unsafe { slice::from_raw_parts_mut(buf, buf_size as usize) };

    loop {
        if opaque.abort.is_aborted() {
            return ffmpeg_next::Error::Exit.into();
        }

        match opaque.io.read(buf) {
            Ok(0) => return ffmpeg_next::Error::Eof.into(),
            Ok(n) => return n.min(buf.len()) as c_int,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                warn!("media I/O read failed: {e}");
                return ffmpeg_next::Error::External.into();
            }
        }
    }
}

unsafe extern "C" fn seek(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
    // SAFETY: see `read_packet`
    let opaque = unsafe { &mut *(opaque as *mut IoOpaque) };

    if whence & AVSEEK_SIZE != 0 {
        return opaque
            .io
            .size()
            .and_then(|size| i64::try_from(size).ok())
            .unwrap_or(-1);
    }

    let pos = match whence & !AVSEEK_FORCE {
        0 => match u64::try_from(offset) {
            Ok(offset) => SeekFrom::Start(offset),
            Err(_) => return -1,
        },
        1 => SeekFrom::Current(offset),
        2 => SeekFrom::End(offset),
        _ => return -1,
    };

    match opaque.io.seek(pos) {
        Ok(position) => i64::try_from(position).unwrap_or(-1),
        Err(e) => {
            warn!("media I/O seek failed: {e}");
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(data: &'static [u8], abort: AbortHandle) -> IoContext {
        IoContext::new(Box::new(Cursor::new(data)), abort).unwrap()
    }

    fn read(context: &IoContext, len: usize) -> (c_int, Vec<u8>) {
        let mut buf = vec![0u8; len];
        let ret = unsafe {
            read_packet(context.opaque as *mut c_void, buf.as_mut_ptr(), len as c_int)
        };
        (ret, buf)
    }

    #[test]
    fn reads_until_end_of_stream() {
        let context = context(b"abcdef", AbortHandle::default());

        let (ret, buf) = read(&context, 4);
        assert_eq!(ret, 4);
        assert_eq!(&buf, b"abcd");

        let (ret, buf) = read(&context, 4);
        assert_eq!(ret, 2);
        assert_eq!(&buf[..2], b"ef");

        let (ret, _) = read(&context, 4);
        assert_eq!(ret, c_int::from(ffmpeg_next::Error::Eof));
    }

    #[test]
    fn aborted_read_exits() {
        let abort = AbortHandle::default();
        let context = context(b"abcdef", abort.clone());
        abort.abort(true);

        let (ret, _) = read(&context, 4);
        assert_eq!(ret, c_int::from(ffmpeg_next::Error::Exit));
    }

    #[test]
    fn seek_and_size() {
        let context = context(b"0123456789", AbortHandle::default());
        let opaque = context.opaque as *mut c_void;

        assert_eq!(unsafe { seek(opaque, 0, AVSEEK_SIZE) }, 10);
        assert_eq!(unsafe { seek(opaque, 4, 0) }, 4);
        assert_eq!(unsafe { seek(opaque, 2, 1) }, 6);
        assert_eq!(unsafe { seek(opaque, -3, 2 | AVSEEK_FORCE) }, 7);
        assert_eq!(unsafe { seek(opaque, -1, 0) }, -1);

        let (ret, buf) = read(&context, 3);
        assert_eq!(ret, 3);
        assert_eq!(&buf, b"789");
    }

    #[test]
    fn unseekable_io_has_no_seek_callback() {
        struct Pipe;

        impl MediaIo for Pipe {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Ok(0)
            }

            fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
                Err(io::ErrorKind::Unsupported.into())
            }

            fn is_seekable(&self) -> bool {
                false
            }
        }

        let context = IoContext::new(Box::new(Pipe), AbortHandle::default()).unwrap();
        unsafe {
            assert!((*context.as_ptr()).seek.is_none());
            assert_eq!((*context.as_ptr()).seekable, 0);
        }
    }
}
