//! `dlopen`/`dlsym` backend for macOS and other POSIX systems.

use std::ffi::c_void;
use std::path::Path;
use std::ptr::NonNull;

use libloading::os::unix::{Library, RTLD_LAZY};

use super::LibraryLoader;
use crate::error::{BridgeError, Result};

/// Loader using the POSIX dynamic linking API.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixLoader;

impl LibraryLoader for PosixLoader {
    type Library = Library;

    fn open(&self, path: &Path) -> Result<Library> {
        // SAFETY: loading runs the library's initializers; the Bridge library
        // is trusted vendor code.
        unsafe { Library::open(Some(path), RTLD_LAZY) }.map_err(|e| {
            BridgeError::LibraryOpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })
    }

    fn symbol(&self, library: &Library, path: &Path, name: &str) -> Result<NonNull<c_void>> {
        let symbol_error = |reason: String| BridgeError::SymbolResolutionFailed {
            symbol: name.to_string(),
            path: path.to_path_buf(),
            reason,
        };

        // SAFETY: the address is only read, typed later by an EntryPoint.
        let symbol = unsafe { library.get::<*mut c_void>(name.as_bytes()) }
            .map_err(|e| symbol_error(e.to_string()))?;

        NonNull::new(*symbol).ok_or_else(|| symbol_error("symbol resolved to null".to_string()))
    }
}
