//! `LoadLibraryExW`/`GetProcAddress` backend for Windows.

use std::ffi::c_void;
use std::path::Path;
use std::ptr::NonNull;

use libloading::os::windows::{Library, LOAD_WITH_ALTERED_SEARCH_PATH};

use super::LibraryLoader;
use crate::error::{BridgeError, Result};

/// Loader using the Win32 module API.
///
/// Libraries are loaded with `LOAD_WITH_ALTERED_SEARCH_PATH`, so DLLs that
/// ship next to `bridge_inproc.dll` in its install directory are found
/// without changing the process-wide DLL search path.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsLoader;

impl LibraryLoader for WindowsLoader {
    type Library = Library;

    fn open(&self, path: &Path) -> Result<Library> {
        // SAFETY: loading runs DllMain; the Bridge library is trusted vendor
        // code.
        unsafe { Library::load_with_flags(path, LOAD_WITH_ALTERED_SEARCH_PATH) }.map_err(|e| {
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
