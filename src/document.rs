//! Document lifecycle: load, form environment, teardown.

use std::ffi::CString;
use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::ptr;

use libc::{c_int, c_uchar, c_ulong, c_void};

use crate::engine::Engine;
use crate::error::{Error, LoadErrorCode, Result};
use crate::ffi::{self, FPDF_FILEACCESS, FPDF_FILEWRITE, FPDF_FORMFILLINFO};
use crate::metadata::{self, Metadata};
use crate::outline::{self, OutlineNode};
use crate::page::Page;
use crate::registry;
use crate::stream::{self, BufferedSource, ByteSource, SeekSource};
use crate::strings;

/// Default highlight for interactive form fields: the engine's conventional
/// pale pink at partial opacity.
const FORM_HIGHLIGHT_COLOR: c_ulong = 0x00FF_E4DD;
const FORM_HIGHLIGHT_ALPHA: c_uchar = 100;

/// An open document.
///
/// Pages borrow the document, so the borrow checker guarantees every page
/// is closed before the document can be disposed. Disposal itself is
/// idempotent: [`Document::close`] may be called explicitly, and also runs
/// on drop.
pub struct Document {
    pub(crate) engine: &'static Engine,
    pub(crate) handle: ffi::FPDF_DOCUMENT,
    pub(crate) form_handle: ffi::FPDF_FORMHANDLE,
    /// Pinned for the whole document lifetime; the engine keeps a pointer
    /// into it while the form environment is open.
    form_info: Box<FPDF_FORMFILLINFO>,
    /// Pinned for the whole document lifetime; the engine pulls bytes
    /// through it lazily.
    _file_access: Box<FPDF_FILEACCESS>,
    registration_id: u32,
    outline: Vec<OutlineNode>,
    disposed: bool,
}

// Raw engine handles are only ever touched under the process-wide engine
// lock, so moving the owning wrapper across threads is sound.
unsafe impl Send for Document {}

impl Document {
    /// Open a document from a seekable reader without buffering it whole;
    /// the engine pulls byte ranges on demand.
    pub fn open_reader<R>(reader: R, password: Option<&str>) -> Result<Self>
    where
        R: Read + Seek + Send + 'static,
    {
        Self::open_source(Box::new(SeekSource::new(reader)), password)
    }

    /// Open a document held fully in memory.
    pub fn open_bytes(data: Vec<u8>, password: Option<&str>) -> Result<Self> {
        Self::open_source(Box::new(BufferedSource::from_bytes(data)), password)
    }

    /// Open a document from a file on disk.
    pub fn open_file(path: impl AsRef<Path>, password: Option<&str>) -> Result<Self> {
        let file = File::open(path)?;
        Self::open_reader(file, password)
    }

    /// Open a document from any byte source. The source is owned by the
    /// document from here on and released during teardown.
    pub fn open_source(mut source: Box<dyn ByteSource>, password: Option<&str>) -> Result<Self> {
        let engine = Engine::get()?;

        let len = source.len()?;
        let id = registry::register(source);

        let password = match password {
            Some(p) => match CString::new(p) {
                Ok(p) => Some(p),
                Err(_) => {
                    registry::unregister(id);
                    return Err(Error::invalid("password contains an interior NUL"));
                }
            },
            None => None,
        };
        let password_ptr = password.as_ref().map_or(ptr::null(), |p| p.as_ptr());

        let mut file_access = Box::new(stream::file_access(id, len));

        // The last-error code is only meaningful immediately after the
        // failing call, so load and error fetch share one lock scope.
        let loaded = engine.run(|b| unsafe {
            let handle = (b.FPDF_LoadCustomDocument)(&mut *file_access, password_ptr);
            if handle.is_null() {
                Err((b.FPDF_GetLastError)())
            } else {
                Ok(handle)
            }
        });
        let handle = match loaded {
            Ok(handle) => handle,
            Err(raw) => {
                registry::unregister(id);
                let code = LoadErrorCode::from_raw(raw);
                log::debug!("document load failed (source {id}): {code}");
                return Err(Error::Load { code });
            }
        };

        let mut document = Document {
            engine,
            handle,
            form_handle: ptr::null_mut(),
            form_info: Box::new(FPDF_FORMFILLINFO::empty()),
            _file_access: file_access,
            registration_id: id,
            outline: Vec::new(),
            disposed: false,
        };

        document.init_form_environment();
        document.outline = engine.run(|b| unsafe { outline::snapshot(b, document.handle) });
        log::debug!("loaded document (source {id})");
        Ok(document)
    }

    /// Probe the form environment, run the document-open actions, and
    /// configure field highlighting. Failure is not an error: without a
    /// form handle, form-aware rendering degrades to plain rendering.
    fn init_form_environment(&mut self) {
        let handle = self.handle;
        let form = self.engine.run(|b| {
            // Whether the engine wants the version 1 or 2 callback shape
            // depends on how it was built; try each exactly once and take
            // the first that yields a handle.
            let mut form = ptr::null_mut();
            for version in [1, 2] {
                self.form_info.version = version;
                form = unsafe { (b.FPDFDOC_InitFormFillEnvironment)(handle, &mut *self.form_info) };
                if !form.is_null() {
                    break;
                }
            }
            if form.is_null() {
                return form;
            }
            unsafe {
                (b.FPDF_SetFormFieldHighlightColor)(form, 0, FORM_HIGHLIGHT_COLOR);
                (b.FPDF_SetFormFieldHighlightAlpha)(form, FORM_HIGHLIGHT_ALPHA);
                // Script-driven actions first, then the document's declared
                // open action, before the document reaches the caller.
                (b.FORM_DoDocumentJSAction)(form);
                (b.FORM_DoDocumentOpenAction)(form);
            }
            form
        });
        if form.is_null() {
            log::warn!("form environment unavailable; rendering without form support");
        }
        self.form_handle = form;
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.disposed {
            Err(Error::usage("document has been disposed"))
        } else {
            Ok(())
        }
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> Result<usize> {
        self.ensure_loaded()?;
        let count = self.engine.run(|b| unsafe { (b.FPDF_GetPageCount)(self.handle) });
        Ok(count.max(0) as usize)
    }

    /// Open the page at `index`. The returned page borrows this document
    /// and must be dropped (or closed) before the document can be disposed.
    pub fn page(&self, index: usize) -> Result<Page<'_>> {
        self.ensure_loaded()?;
        if index >= self.page_count()? {
            return Err(Error::invalid("page index out of range"));
        }
        Page::open(self, index)
    }

    /// Dimensions of the page at `index` in points, without loading it.
    pub fn page_size(&self, index: usize) -> Result<(f64, f64)> {
        self.ensure_loaded()?;
        let size = self.engine.run(|b| unsafe {
            let mut width = 0f64;
            let mut height = 0f64;
            let ok = (b.FPDF_GetPageSizeByIndex)(
                self.handle,
                index as c_int,
                &mut width,
                &mut height,
            );
            (ok != 0).then_some((width, height))
        });
        size.ok_or(Error::invalid("page index out of range"))
    }

    /// Dimensions of every page in document order, without loading any.
    pub fn page_sizes(&self) -> Result<Vec<(f64, f64)>> {
        (0..self.page_count()?)
            .map(|index| self.page_size(index))
            .collect()
    }

    /// Outline snapshot taken at load time.
    #[must_use]
    pub fn outline(&self) -> &[OutlineNode] {
        &self.outline
    }

    /// Information-dictionary fields.
    pub fn metadata(&self) -> Result<Metadata> {
        self.ensure_loaded()?;
        Ok(Metadata {
            title: self.meta_text("Title"),
            author: self.meta_text("Author"),
            subject: self.meta_text("Subject"),
            keywords: self.meta_text("Keywords"),
            creator: self.meta_text("Creator"),
            producer: self.meta_text("Producer"),
            creation_date: self
                .meta_text("CreationDate")
                .and_then(|raw| metadata::parse_pdf_date(&raw)),
            modification_date: self
                .meta_text("ModDate")
                .and_then(|raw| metadata::parse_pdf_date(&raw)),
        })
    }

    fn meta_text(&self, tag: &str) -> Option<String> {
        let tag = CString::new(tag).ok()?;
        self.engine
            .run(|b| unsafe {
                // The reported length counts a trailing UTF-16 terminator;
                // two bytes or less means the field is absent.
                let len = (b.FPDF_GetMetaText)(self.handle, tag.as_ptr(), ptr::null_mut(), 0);
                if len <= 2 {
                    return None;
                }
                let mut buf = vec![0u8; len as usize];
                (b.FPDF_GetMetaText)(self.handle, tag.as_ptr(), buf.as_mut_ptr().cast(), len);
                Some(strings::from_utf16le_bytes(&buf))
            })
            .filter(|text| !text.is_empty())
    }

    /// Write a full copy of the document to `sink` (no incremental
    /// sections). Sink failures surface as [`Error::Io`].
    pub fn save_copy(&self, sink: &mut dyn Write) -> Result<()> {
        self.ensure_loaded()?;
        let mut shim = SinkShim::new(sink);
        // Pointer to the whole shim; the engine sees only the leading
        // FPDF_FILEWRITE and the trampoline casts back.
        let shim_ptr: *mut FPDF_FILEWRITE = (&raw mut shim).cast();
        let ok = self
            .engine
            .run(|b| unsafe { (b.FPDF_SaveAsCopy)(self.handle, shim_ptr, ffi::FPDF_NO_INCREMENTAL) });
        if let Some(e) = shim.failed.take() {
            return Err(Error::Io(e));
        }
        if ok == 0 {
            return Err(Error::Io(io::Error::other("engine rejected the save")));
        }
        Ok(())
    }

    /// Release every engine resource backing this document, in dependency
    /// order: form will-close action, form environment, document handle,
    /// then the registry entry and the backing source. Each step runs even
    /// if an earlier one failed; calling `close` again is a no-op.
    pub fn close(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        log::debug!("disposing document (source {})", self.registration_id);
        self.engine.run(|b| unsafe {
            if !self.form_handle.is_null() {
                (b.FORM_DoDocumentAAction)(self.form_handle, ffi::FPDFDOC_AACTION_WC);
                (b.FPDFDOC_ExitFormFillEnvironment)(self.form_handle);
                self.form_handle = ptr::null_mut();
            }
            if !self.handle.is_null() {
                (b.FPDF_CloseDocument)(self.handle);
                self.handle = ptr::null_mut();
            }
        });
        // The pinned callback blocks drop with the wrapper; the registry
        // entry, and with it the backing source, goes now.
        registry::unregister(self.registration_id);
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.close();
    }
}

/// Byte-sink shim for save-as-copy. `#[repr(C)]`: the engine only sees the
/// leading [`FPDF_FILEWRITE`]; the trailing fields carry the destination
/// writer and the first write error, if any.
#[repr(C)]
struct SinkShim<'a> {
    base: FPDF_FILEWRITE,
    sink: &'a mut dyn Write,
    failed: Option<io::Error>,
}

impl<'a> SinkShim<'a> {
    fn new(sink: &'a mut dyn Write) -> Self {
        Self {
            base: FPDF_FILEWRITE {
                version: 1,
                WriteBlock: Some(write_block),
            },
            sink,
            failed: None,
        }
    }
}

/// Save-copy trampoline: append a block to the destination writer. Returns
/// 0 on failure so the engine aborts the save, and never unwinds across the
/// FFI boundary.
unsafe extern "C" fn write_block(
    this: *mut FPDF_FILEWRITE,
    data: *const c_void,
    size: c_ulong,
) -> c_int {
    let written = catch_unwind(AssertUnwindSafe(|| {
        // `this` points at the first field of a SinkShim, so the cast
        // recovers the whole shim.
        let shim = unsafe { &mut *(this as *mut SinkShim) };
        if shim.failed.is_some() {
            return 0;
        }
        let bytes = unsafe { std::slice::from_raw_parts(data.cast::<u8>(), size as usize) };
        match shim.sink.write_all(bytes) {
            Ok(()) => 1,
            Err(e) => {
                shim.failed = Some(e);
                0
            }
        }
    }));
    written.unwrap_or(0)
}
