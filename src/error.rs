//! Error types shared across the crate.

use std::fmt;

use crate::ffi;

pub type Result<T> = std::result::Result<T, Error>;

/// Engine-reported reason a document failed to load.
///
/// Only meaningful immediately after a failing load call; the wrapper
/// captures it under the same engine lock that observed the failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadErrorCode {
    /// The engine recorded no error for the failing call.
    Success,
    Unknown,
    /// The source could not be read or was not found.
    BadFile,
    /// The data is not a document the engine recognizes.
    BadFormat,
    /// A password is required, or the supplied one is wrong.
    Password,
    /// Unsupported security scheme.
    Security,
    /// The requested page is missing or corrupt.
    BadPage,
    /// A code this wrapper does not know about.
    Other(u32),
}

impl LoadErrorCode {
    pub(crate) fn from_raw(raw: libc::c_ulong) -> Self {
        match raw {
            ffi::FPDF_ERR_SUCCESS => Self::Success,
            ffi::FPDF_ERR_UNKNOWN => Self::Unknown,
            ffi::FPDF_ERR_FILE => Self::BadFile,
            ffi::FPDF_ERR_FORMAT => Self::BadFormat,
            ffi::FPDF_ERR_PASSWORD => Self::Password,
            ffi::FPDF_ERR_SECURITY => Self::Security,
            ffi::FPDF_ERR_PAGE => Self::BadPage,
            other => Self::Other(other as u32),
        }
    }
}

impl fmt::Display for LoadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "no error recorded"),
            Self::Unknown => write!(f, "unknown error"),
            Self::BadFile => write!(f, "file not found or could not be read"),
            Self::BadFormat => write!(f, "data is not a recognized document"),
            Self::Password => write!(f, "password required or incorrect"),
            Self::Security => write!(f, "unsupported security scheme"),
            Self::BadPage => write!(f, "page not found or content error"),
            Self::Other(code) => write!(f, "engine error code {code}"),
        }
    }
}

/// Errors surfaced by the wrapper.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine rejected the document at load time.
    #[error("document load failed: {code}")]
    Load { code: LoadErrorCode },

    /// The backing source returned fewer bytes than requested, or a sink
    /// write failed.
    #[error("source I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The engine could not rasterize the page.
    #[error("render failed: {detail}")]
    Render { detail: String },

    /// Operation on a disposed document or a closed page.
    #[error("{detail}")]
    Usage { detail: &'static str },

    /// A caller-supplied argument made the operation impossible.
    #[error("{detail}")]
    InvalidArgument { detail: &'static str },

    /// The engine library could not be located or bound.
    #[error("engine unavailable: {detail}")]
    Engine { detail: String },
}

impl Error {
    pub(crate) fn render(detail: impl Into<String>) -> Self {
        Self::Render {
            detail: detail.into(),
        }
    }

    pub(crate) fn usage(detail: &'static str) -> Self {
        Self::Usage { detail }
    }

    pub(crate) fn invalid(detail: &'static str) -> Self {
        Self::InvalidArgument { detail }
    }

    pub(crate) fn engine(detail: impl Into<String>) -> Self {
        Self::Engine {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_codes_map_from_raw() {
        assert_eq!(LoadErrorCode::from_raw(4), LoadErrorCode::Password);
        assert_eq!(LoadErrorCode::from_raw(2), LoadErrorCode::BadFile);
        assert_eq!(LoadErrorCode::from_raw(99), LoadErrorCode::Other(99));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
