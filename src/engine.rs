//! Process-wide engine binding and call serialization.
//!
//! The native engine is not reentrant and not internally thread-safe:
//! exactly one call may be in flight at a time across the whole process.
//! Every entry into the engine funnels through [`Engine::run`], which holds
//! the single global lock for the duration of the call. The pull-read
//! callback fires synchronously on the calling thread inside such a call
//! and must not retake the lock.

use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use crate::error::{Error, Result};
use crate::ffi::Bindings;

/// Environment variable naming the engine library, or a directory to look
/// it up in. Without it, the platform library name is resolved through the
/// default loader search path.
pub const ENGINE_PATH_VAR: &str = "PDFIUM_LIB_PATH";

static ENGINE: OnceLock<std::result::Result<Engine, String>> = OnceLock::new();

pub(crate) struct Engine {
    bindings: Bindings,
    lock: Mutex<()>,
}

impl Engine {
    /// Bind and initialize the engine on first use; afterwards the same
    /// instance is handed out for the remainder of the process.
    pub(crate) fn get() -> Result<&'static Engine> {
        let slot = ENGINE.get_or_init(|| {
            let bindings = load_bindings()?;
            // One-time native initialization. The engine offers a matching
            // destroy call, but the library stays resident until process
            // exit, so it is never issued.
            unsafe { (bindings.FPDF_InitLibrary)() };
            Ok(Engine {
                bindings,
                lock: Mutex::new(()),
            })
        });
        match slot {
            Ok(engine) => Ok(engine),
            Err(detail) => Err(Error::engine(detail.clone())),
        }
    }

    /// Run `f` with exclusive access to the engine. `f` must not call back
    /// into `run`; the lock is not reentrant.
    pub(crate) fn run<T>(&self, f: impl FnOnce(&Bindings) -> T) -> T {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&self.bindings)
    }
}

fn platform_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(configured) = env::var(ENGINE_PATH_VAR) {
        let path = PathBuf::from(&configured);
        if path.is_dir() {
            candidates.push(path.join(platform_library_name()));
        } else {
            candidates.push(path);
        }
    }
    candidates.push(PathBuf::from(platform_library_name()));
    candidates
}

fn load_bindings() -> std::result::Result<Bindings, String> {
    let mut last_error = String::from("no candidate paths");
    for path in candidate_paths() {
        match unsafe { libloading::Library::new(&path) } {
            Ok(lib) => match Bindings::load(lib) {
                Ok(bindings) => {
                    log::debug!("bound engine library at {}", path.display());
                    return Ok(bindings);
                }
                Err(e) => last_error = format!("{}: {e}", path.display()),
            },
            Err(e) => last_error = format!("{}: {e}", path.display()),
        }
    }
    Err(last_error)
}
