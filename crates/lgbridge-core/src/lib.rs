//! Client-side loader for the Looking Glass Bridge in-process library.
//!
//! This crate finds an installed copy of `bridge_inproc` from the Bridge
//! settings manifest, loads it at runtime and exposes its exports as typed
//! function pointers through a per-symbol cache.
//!
//! ```no_run
//! use lgbridge_core::{Bridge, BRIDGE_VERSION};
//!
//! let bridge = Bridge::new();
//! bridge.initialize("my-app", BRIDGE_VERSION)?;
//! for display in bridge.display_info_list()? {
//!     println!("{} {}", display.display_id, display.name);
//! }
//! bridge.uninitialize()?;
//! # Ok::<(), lgbridge_core::BridgeError>(())
//! ```

#[cfg(not(any(unix, windows)))]
compile_error!("lgbridge-core supports Windows, macOS and POSIX targets only");

pub mod bridge;
pub mod config;
pub mod display;
pub mod entry;
pub mod error;
pub mod loader;
pub mod macros;
pub mod manifest;
pub mod marshal;
pub mod platform;
pub mod resolver;
pub mod types;
pub mod window;

use std::path::Path;

use once_cell::sync::Lazy;

pub use bridge::Bridge;
pub use config::{BridgeConfig, BRIDGE_VERSION, MIN_BRIDGE_VERSION};
pub use error::{BridgeError, Result};
pub use loader::{EntryPoint, LibraryLoader, NativeLoader, SymbolBinding, SymbolCache};
pub use manifest::VersionEntry;
pub use platform::{Platform, StringEncoding};
pub use resolver::InstallResolver;
pub use types::{
    BridgeVersion, Calibration, DefaultQuiltSettings, Dimensions, DisplayInfo, PixelFormat,
    QuiltTexture, WindowData, WindowHandle, WindowPosition,
};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::bridge::Bridge;
    pub use crate::config::{env_vars, BridgeConfig, BRIDGE_VERSION, MIN_BRIDGE_VERSION};
    pub use crate::error::{BridgeError, Result};
    pub use crate::loader::{EntryPoint, LibraryLoader};
    pub use crate::platform::Platform;
    pub use crate::resolver::InstallResolver;
    pub use crate::types::{DisplayInfo, PixelFormat, QuiltTexture, WindowHandle};
}

static GLOBAL: Lazy<Bridge> = Lazy::new(Bridge::new);

/// Process-wide bridge context used by the free functions below.
pub fn global() -> &'static Bridge {
    &GLOBAL
}

fn report(operation: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) if e.is_install_not_found() => {
            tracing::warn!(operation, error = %e, "No matching Bridge install");
            false
        }
        Err(e) => {
            tracing::error!(operation, error = %e, "Bridge call failed");
            false
        }
    }
}

/// Initialize the global context with the install matching `version`.
pub fn initialize(app_name: &str, version: &str) -> bool {
    report("initialize", global().initialize(app_name, version))
}

/// Initialize the global context from an explicit install directory.
pub fn initialize_with_path(app_name: &str, install_dir: impl AsRef<Path>) -> bool {
    report(
        "initialize_with_path",
        global().initialize_with_path(app_name, install_dir),
    )
}

pub fn uninitialize() -> bool {
    report("uninitialize", global().uninitialize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_maps_errors_to_false() {
        assert!(report("noop", Ok(())));
        assert!(!report("missing", Err(BridgeError::InstallNotFound("2.5.1".into()))));
        assert!(!report("uninit", Err(BridgeError::NotInitialized)));
    }

    #[test]
    fn test_facade_with_empty_path_fails() {
        assert!(!initialize_with_path("test", ""));
        assert!(!global().is_initialized());
    }
}
