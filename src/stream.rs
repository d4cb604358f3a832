//! Byte-source abstraction bridged to the engine's pull-based reads.
//!
//! The engine never sees the whole file: at load time it receives a length
//! and a read callback, then pulls byte ranges on demand during both
//! parsing and rendering. Requests are random access, not sequential,
//! possibly overlapping, but never concurrent for the same document.

use std::io::{self, Read, Seek, SeekFrom};
use std::panic::{AssertUnwindSafe, catch_unwind};

use libc::{c_int, c_uchar, c_ulong, c_void};

use crate::ffi::FPDF_FILEACCESS;
use crate::registry;

/// Random-access byte source backing an open document.
///
/// The source must outlive the document built from it: the document takes
/// ownership at load time and releases it during teardown. A read that
/// cannot deliver the full requested range must fail rather than return a
/// short count.
pub trait ByteSource: Send {
    /// Total length of the source in bytes.
    fn len(&mut self) -> io::Result<u64>;

    /// Fill `buf` with bytes starting at `offset`, failing if the range
    /// extends past the end of the source.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

/// Adapter for readers with native seeking. Length is queried once via a
/// seek to the end and cached.
pub struct SeekSource<R> {
    inner: R,
    total: Option<u64>,
}

impl<R: Read + Seek + Send> SeekSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, total: None }
    }
}

impl<R: Read + Seek + Send> ByteSource for SeekSource<R> {
    fn len(&mut self) -> io::Result<u64> {
        if let Some(total) = self.total {
            return Ok(total);
        }
        let position = self.inner.stream_position()?;
        let total = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(position))?;
        self.total = Some(total);
        Ok(total)
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(buf)
    }
}

/// Source for readers without seeking: the data is buffered fully into
/// memory up front, the first time the total length is needed.
pub struct BufferedSource {
    data: Vec<u8>,
}

impl BufferedSource {
    /// Drain `reader` to the end and keep the bytes in memory.
    pub fn from_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self { data })
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl ByteSource for BufferedSource {
    fn len(&mut self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "offset past end of source"))?;
        let end = start
            .checked_add(buf.len())
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of source")
            })?;
        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }
}

/// Build the engine-facing access block for a registered source. The block
/// must stay pinned for as long as the document handle is open; the engine
/// keeps the pointer and pulls through it lazily.
pub(crate) fn file_access(id: u32, len: u64) -> FPDF_FILEACCESS {
    FPDF_FILEACCESS {
        m_FileLen: len as c_ulong,
        m_GetBlock: Some(get_block),
        m_Param: id as usize as *mut c_void,
    }
}

/// Process-wide pull-read trampoline. The engine identifies the document
/// only by the id smuggled through `param`; the backing source comes from
/// the registry. Returns 0 on any failure so the engine reports the error
/// itself, and never unwinds across the FFI boundary.
unsafe extern "C" fn get_block(
    param: *mut c_void,
    position: c_ulong,
    buf: *mut c_uchar,
    size: c_ulong,
) -> c_int {
    if buf.is_null() {
        return 0;
    }
    let id = param as usize as u32;
    let filled = catch_unwind(AssertUnwindSafe(|| {
        let slice = unsafe { std::slice::from_raw_parts_mut(buf, size as usize) };
        registry::read_into(id, position as u64, slice)
    }));
    match filled {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(_) => {
            log::warn!("panic in source read callback for id {id}");
            0
        }
    }
}
