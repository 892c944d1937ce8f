//! Bridge configuration defaults and environment overrides.

use std::path::PathBuf;

/// Bridge version this crate was written against.
pub const BRIDGE_VERSION: &str = "2.5.1";

/// Oldest Bridge release the C++ SDK accepts from the manifest.
pub const MIN_BRIDGE_VERSION: &str = "2.5.0";

/// Base name of the in-process Bridge library, without prefix or extension.
pub const LIBRARY_BASE_NAME: &str = "bridge_inproc";

/// Display index asking Bridge to pick the first Looking Glass device.
pub const FIRST_LOOKING_GLASS_DEVICE: u32 = u32::MAX;

/// Settings manifest location pieces
pub mod settings {
    /// Vendor directory under the per-user config directory.
    pub const VENDOR_DIR: &str = "Looking Glass";
    /// Product directory under the vendor directory.
    pub const PRODUCT_DIR: &str = "Bridge";
    /// Hidden directory under `$HOME` on generic POSIX systems.
    pub const POSIX_DIR: &str = ".lgf";
    /// Manifest file name.
    pub const FILE_NAME: &str = "settings.json";
    /// Key of the array listing installed Bridge copies.
    pub const INSTALL_LOCATIONS_KEY: &str = "install_locations";
}

/// Environment variable names
pub mod env_vars {
    /// Overrides the platform settings manifest path.
    pub const SETTINGS_PATH: &str = "LGBRIDGE_SETTINGS_PATH";
    /// Enables JSON log output in the CLI.
    pub const LOG_JSON: &str = "LGBRIDGE_LOG_JSON";
}

/// Configuration for a [`crate::Bridge`] context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Settings manifest path. `None` uses the platform convention.
    pub settings_path: Option<PathBuf>,
    /// Manifest entries ordinally below this version are ignored.
    pub minimum_version: Option<String>,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the environment.
    pub fn from_env() -> Self {
        let settings_path = std::env::var_os(env_vars::SETTINGS_PATH)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            settings_path,
            minimum_version: None,
        }
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn with_minimum_version(mut self, version: impl Into<String>) -> Self {
        self.minimum_version = Some(version.into());
        self
    }
}

/// Whether JSON log output was requested through the environment.
pub fn log_json_requested() -> bool {
    std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false)
}
