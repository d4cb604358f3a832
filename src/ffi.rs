//! Raw ABI of the native PDFium engine.
//!
//! The engine is an opaque shared library bound at runtime; this module
//! declares the call shapes, callback structs and constants the wrapper
//! consumes. Nothing here takes the engine lock; see [`crate::engine`].

#![allow(non_snake_case, non_camel_case_types)]

use libc::{c_char, c_double, c_int, c_uchar, c_ulong, c_ushort, c_void};

pub type FPDF_DOCUMENT = *mut c_void;
pub type FPDF_PAGE = *mut c_void;
pub type FPDF_TEXTPAGE = *mut c_void;
pub type FPDF_FORMHANDLE = *mut c_void;
pub type FPDF_BITMAP = *mut c_void;
pub type FPDF_BOOKMARK = *mut c_void;
pub type FPDF_DEST = *mut c_void;
pub type FPDF_BOOL = c_int;

// Last-error codes reported by FPDF_GetLastError, valid only immediately
// after a failing call.
pub const FPDF_ERR_SUCCESS: c_ulong = 0;
pub const FPDF_ERR_UNKNOWN: c_ulong = 1;
pub const FPDF_ERR_FILE: c_ulong = 2;
pub const FPDF_ERR_FORMAT: c_ulong = 3;
pub const FPDF_ERR_PASSWORD: c_ulong = 4;
pub const FPDF_ERR_SECURITY: c_ulong = 5;
pub const FPDF_ERR_PAGE: c_ulong = 6;

/// BGRA format id for FPDFBitmap_CreateEx.
pub const FPDFBITMAP_BGRA: c_int = 4;

// Page additional-action codes for FORM_DoPageAAction.
pub const FPDFPAGE_AACTION_OPEN: c_int = 0;
pub const FPDFPAGE_AACTION_CLOSE: c_int = 1;

/// Document will-close additional-action code for FORM_DoDocumentAAction.
pub const FPDFDOC_AACTION_WC: c_int = 0x10;

/// Save flag: rewrite the whole document rather than appending increments.
pub const FPDF_NO_INCREMENTAL: c_ulong = 1;

/// Pull-based random-access contract handed to the engine at load time.
///
/// The engine keeps this pointer for the lifetime of the document and calls
/// `m_GetBlock` on demand, so the struct must stay pinned until the document
/// handle is closed. `m_Param` carries only a registry id: the callback is
/// a single process-wide function with no other per-document context.
#[repr(C)]
pub struct FPDF_FILEACCESS {
    pub m_FileLen: c_ulong,
    pub m_GetBlock:
        Option<unsafe extern "C" fn(*mut c_void, c_ulong, *mut c_uchar, c_ulong) -> c_int>,
    pub m_Param: *mut c_void,
}

/// Byte-sink contract for FPDF_SaveAsCopy. `version` must be 1.
#[repr(C)]
pub struct FPDF_FILEWRITE {
    pub version: c_int,
    pub WriteBlock:
        Option<unsafe extern "C" fn(*mut FPDF_FILEWRITE, *const c_void, c_ulong) -> c_int>,
}

/// Interactive-form callback block.
///
/// The wrapper leaves every callback null; the engine only requires the
/// struct to exist, pinned, for the lifetime of the form environment.
/// Whether the engine wants shape 1 or 2 depends on whether XFA support was
/// compiled in, so `version` is probed at init time. The trailing fields are
/// the version-2 extension; on a version-1 engine they are never read.
#[repr(C)]
pub struct FPDF_FORMFILLINFO {
    pub version: c_int,
    pub Release: *mut c_void,
    pub FFI_Invalidate: *mut c_void,
    pub FFI_OutputSelectedRect: *mut c_void,
    pub FFI_SetCursor: *mut c_void,
    pub FFI_SetTimer: *mut c_void,
    pub FFI_KillTimer: *mut c_void,
    pub FFI_GetLocalTime: *mut c_void,
    pub FFI_OnChange: *mut c_void,
    pub FFI_GetPage: *mut c_void,
    pub FFI_GetCurrentPage: *mut c_void,
    pub FFI_GetRotation: *mut c_void,
    pub FFI_ExecuteNamedAction: *mut c_void,
    pub FFI_SetTextFieldFocus: *mut c_void,
    pub FFI_DoURIAction: *mut c_void,
    pub FFI_DoGoToAction: *mut c_void,
    pub m_pJsPlatform: *mut c_void,
    pub FFI_DisplayCaret: *mut c_void,
    pub FFI_GetCurrentPageIndex: *mut c_void,
    pub FFI_SetCurrentPage: *mut c_void,
    pub FFI_GotoURL: *mut c_void,
    pub FFI_GetPageViewRect: *mut c_void,
    pub FFI_PageEvent: *mut c_void,
    pub FFI_PopupMenu: *mut c_void,
    pub FFI_OpenFile: *mut c_void,
    pub FFI_EmailTo: *mut c_void,
    pub FFI_UploadTo: *mut c_void,
    pub FFI_GetPlatform: *mut c_void,
    pub FFI_GetLanguage: *mut c_void,
    pub FFI_DownloadFromURL: *mut c_void,
    pub FFI_PostRequestURL: *mut c_void,
    pub FFI_PutRequestURL: *mut c_void,
}

impl FPDF_FORMFILLINFO {
    pub fn empty() -> Self {
        // All-null callbacks; version is set by the probe.
        unsafe { std::mem::zeroed() }
    }
}

/// Declares the function-pointer table resolved from the engine library and
/// the loader that fills it. Each symbol is looked up once; a missing symbol
/// fails the whole bind.
macro_rules! bindings {
    ($($name:ident: fn($($arg:ty),*) $(-> $ret:ty)?;)+) => {
        pub struct Bindings {
            _lib: libloading::Library,
            $(pub $name: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)+
        }

        impl Bindings {
            pub fn load(lib: libloading::Library) -> std::result::Result<Self, libloading::Error> {
                $(
                    let $name = unsafe {
                        *lib.get::<unsafe extern "C" fn($($arg),*) $(-> $ret)?>(
                            concat!(stringify!($name), "\0").as_bytes(),
                        )?
                    };
                )+
                Ok(Self { _lib: lib, $($name),+ })
            }
        }
    };
}

bindings! {
    FPDF_InitLibrary: fn();
    FPDF_LoadCustomDocument: fn(*mut FPDF_FILEACCESS, *const c_char) -> FPDF_DOCUMENT;
    FPDF_GetLastError: fn() -> c_ulong;
    FPDF_CloseDocument: fn(FPDF_DOCUMENT);
    FPDF_GetPageCount: fn(FPDF_DOCUMENT) -> c_int;
    FPDF_GetPageSizeByIndex: fn(FPDF_DOCUMENT, c_int, *mut c_double, *mut c_double) -> c_int;
    FPDF_SaveAsCopy: fn(FPDF_DOCUMENT, *mut FPDF_FILEWRITE, c_ulong) -> FPDF_BOOL;
    FPDF_GetMetaText: fn(FPDF_DOCUMENT, *const c_char, *mut c_void, c_ulong) -> c_ulong;
    FPDFDOC_InitFormFillEnvironment: fn(FPDF_DOCUMENT, *mut FPDF_FORMFILLINFO) -> FPDF_FORMHANDLE;
    FPDFDOC_ExitFormFillEnvironment: fn(FPDF_FORMHANDLE);
    FPDF_SetFormFieldHighlightColor: fn(FPDF_FORMHANDLE, c_int, c_ulong);
    FPDF_SetFormFieldHighlightAlpha: fn(FPDF_FORMHANDLE, c_uchar);
    FORM_DoDocumentJSAction: fn(FPDF_FORMHANDLE);
    FORM_DoDocumentOpenAction: fn(FPDF_FORMHANDLE);
    FORM_DoDocumentAAction: fn(FPDF_FORMHANDLE, c_int);
    FORM_OnAfterLoadPage: fn(FPDF_PAGE, FPDF_FORMHANDLE);
    FORM_OnBeforeClosePage: fn(FPDF_PAGE, FPDF_FORMHANDLE);
    FORM_DoPageAAction: fn(FPDF_PAGE, FPDF_FORMHANDLE, c_int);
    FPDF_LoadPage: fn(FPDF_DOCUMENT, c_int) -> FPDF_PAGE;
    FPDF_ClosePage: fn(FPDF_PAGE);
    FPDF_GetPageWidth: fn(FPDF_PAGE) -> c_double;
    FPDF_GetPageHeight: fn(FPDF_PAGE) -> c_double;
    FPDFPage_SetRotation: fn(FPDF_PAGE, c_int);
    FPDFText_LoadPage: fn(FPDF_PAGE) -> FPDF_TEXTPAGE;
    FPDFText_ClosePage: fn(FPDF_TEXTPAGE);
    FPDFText_CountChars: fn(FPDF_TEXTPAGE) -> c_int;
    FPDFText_GetText: fn(FPDF_TEXTPAGE, c_int, c_int, *mut c_ushort) -> c_int;
    FPDFText_CountRects: fn(FPDF_TEXTPAGE, c_int, c_int) -> c_int;
    FPDFText_GetRect: fn(FPDF_TEXTPAGE, c_int, *mut c_double, *mut c_double, *mut c_double, *mut c_double) -> FPDF_BOOL;
    FPDFText_GetCharIndexAtPos: fn(FPDF_TEXTPAGE, c_double, c_double, c_double, c_double) -> c_int;
    FPDFBitmap_CreateEx: fn(c_int, c_int, c_int, *mut c_void, c_int) -> FPDF_BITMAP;
    FPDFBitmap_FillRect: fn(FPDF_BITMAP, c_int, c_int, c_int, c_int, c_ulong);
    FPDFBitmap_Destroy: fn(FPDF_BITMAP);
    FPDF_RenderPageBitmap: fn(FPDF_BITMAP, FPDF_PAGE, c_int, c_int, c_int, c_int, c_int, c_int);
    FPDF_FFLDraw: fn(FPDF_FORMHANDLE, FPDF_BITMAP, FPDF_PAGE, c_int, c_int, c_int, c_int, c_int, c_int);
    FPDF_DeviceToPage: fn(FPDF_PAGE, c_int, c_int, c_int, c_int, c_int, c_int, c_int, *mut c_double, *mut c_double) -> FPDF_BOOL;
    FPDF_PageToDevice: fn(FPDF_PAGE, c_int, c_int, c_int, c_int, c_int, c_double, c_double, *mut c_int, *mut c_int) -> FPDF_BOOL;
    FPDFBookmark_GetFirstChild: fn(FPDF_DOCUMENT, FPDF_BOOKMARK) -> FPDF_BOOKMARK;
    FPDFBookmark_GetNextSibling: fn(FPDF_DOCUMENT, FPDF_BOOKMARK) -> FPDF_BOOKMARK;
    FPDFBookmark_GetTitle: fn(FPDF_BOOKMARK, *mut c_void, c_ulong) -> c_ulong;
    FPDFBookmark_GetDest: fn(FPDF_DOCUMENT, FPDF_BOOKMARK) -> FPDF_DEST;
    FPDFDest_GetDestPageIndex: fn(FPDF_DOCUMENT, FPDF_DEST) -> c_int;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_fill_info_starts_null() {
        let info = FPDF_FORMFILLINFO::empty();
        assert_eq!(info.version, 0);
        assert!(info.m_pJsPlatform.is_null());
        assert!(info.FFI_DoGoToAction.is_null());
    }

    #[test]
    fn file_access_is_pointer_sized_fields() {
        // The engine reads the struct directly; layout must stay C-compatible.
        assert!(std::mem::size_of::<FPDF_FILEACCESS>() >= std::mem::size_of::<usize>() * 2);
    }
}
