//! Runtime platform detection.
//!
//! The platform is detected once per process and cached. It decides which
//! loader backend is used, how strings are marshaled into native calls,
//! where the settings manifest lives and which library file name is built
//! from an install directory.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Serialize;

use crate::config::{settings, LIBRARY_BASE_NAME};

/// Operating system variant the bridge is running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    /// Linux and every other POSIX system that is not Darwin.
    Posix,
}

/// Encoding used for string arguments crossing the native boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    /// NUL-terminated UTF-16, the Windows wide-character convention.
    Utf16,
    /// NUL-terminated UTF-8.
    Utf8,
}

static PLATFORM: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// Platform of the running process, detected on first use.
    pub fn current() -> Platform {
        *PLATFORM.get_or_init(|| {
            let platform = Self::classify(std::env::consts::FAMILY, kernel_name);
            tracing::debug!(?platform, "Detected platform");
            platform
        })
    }

    /// Classify an OS family report.
    ///
    /// `probe` is only consulted for the unix family and must return the
    /// kernel name (`uname -s`). Only `"Darwin"` is classified as macOS; any
    /// other answer, or no answer, is generic POSIX.
    pub fn classify(family: &str, probe: impl FnOnce() -> Option<String>) -> Platform {
        match family {
            "windows" => Platform::Windows,
            "unix" => match probe() {
                Some(name) if name == "Darwin" => Platform::MacOs,
                _ => Platform::Posix,
            },
            _ => Platform::Posix,
        }
    }

    pub fn string_encoding(self) -> StringEncoding {
        match self {
            Platform::Windows => StringEncoding::Utf16,
            Platform::MacOs | Platform::Posix => StringEncoding::Utf8,
        }
    }

    /// File name of the Bridge library inside an install directory.
    pub fn library_file_name(self) -> String {
        match self {
            Platform::Windows => format!("{}.dll", LIBRARY_BASE_NAME),
            Platform::MacOs => format!("lib{}.dylib", LIBRARY_BASE_NAME),
            Platform::Posix => format!("lib{}.so", LIBRARY_BASE_NAME),
        }
    }

    /// Directory holding the Bridge settings manifest.
    ///
    /// Returns `None` when the user's home or config directory is unknown.
    pub fn settings_dir(self) -> Option<PathBuf> {
        match self {
            Platform::Windows => dirs::config_dir()
                .map(|dir| dir.join(settings::VENDOR_DIR).join(settings::PRODUCT_DIR)),
            Platform::MacOs => dirs::home_dir().map(|home| {
                home.join("Library")
                    .join("Application Support")
                    .join(settings::VENDOR_DIR)
                    .join(settings::PRODUCT_DIR)
            }),
            Platform::Posix => dirs::home_dir()
                .map(|home| home.join(settings::POSIX_DIR).join(settings::PRODUCT_DIR)),
        }
    }

    /// Full path of the Bridge settings manifest.
    pub fn settings_path(self) -> Option<PathBuf> {
        self.settings_dir().map(|dir| dir.join(settings::FILE_NAME))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Posix => write!(f, "posix"),
        }
    }
}

/// Kernel name reported by `uname(2)`.
#[cfg(unix)]
fn kernel_name() -> Option<String> {
    // SAFETY: utsname is plain old data and uname only writes into it.
    let mut info: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut info) } != 0 {
        return None;
    }

    // SAFETY: uname NUL-terminates every field on success.
    let sysname = unsafe { std::ffi::CStr::from_ptr(info.sysname.as_ptr()) };
    Some(sysname.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn kernel_name() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_windows_skips_probe() {
        let platform = Platform::classify("windows", || panic!("probe must not run"));
        assert_eq!(platform, Platform::Windows);
    }

    #[test]
    fn test_classify_darwin() {
        assert_eq!(
            Platform::classify("unix", || Some("Darwin".to_string())),
            Platform::MacOs
        );
    }

    #[test]
    fn test_classify_other_unix() {
        assert_eq!(
            Platform::classify("unix", || Some("Linux".to_string())),
            Platform::Posix
        );
        assert_eq!(
            Platform::classify("unix", || Some("darwin".to_string())),
            Platform::Posix
        );
        assert_eq!(Platform::classify("unix", || None), Platform::Posix);
    }

    #[test]
    fn test_current_is_stable() {
        let first = Platform::current();
        for _ in 0..16 {
            assert_eq!(Platform::current(), first);
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_current_on_linux() {
        assert_eq!(Platform::current(), Platform::Posix);
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_current_on_macos() {
        assert_eq!(Platform::current(), Platform::MacOs);
    }

    #[test]
    fn test_library_file_names() {
        assert_eq!(Platform::Windows.library_file_name(), "bridge_inproc.dll");
        assert_eq!(Platform::MacOs.library_file_name(), "libbridge_inproc.dylib");
        assert_eq!(Platform::Posix.library_file_name(), "libbridge_inproc.so");
    }

    #[test]
    fn test_string_encoding() {
        assert_eq!(Platform::Windows.string_encoding(), StringEncoding::Utf16);
        assert_eq!(Platform::MacOs.string_encoding(), StringEncoding::Utf8);
        assert_eq!(Platform::Posix.string_encoding(), StringEncoding::Utf8);
    }

    #[test]
    fn test_posix_settings_path_layout() {
        if let Some(path) = Platform::Posix.settings_path() {
            assert!(path.ends_with(".lgf/Bridge/settings.json"));
        }
    }

    #[test]
    fn test_macos_settings_path_layout() {
        if let Some(path) = Platform::MacOs.settings_path() {
            assert!(path.ends_with("Library/Application Support/Looking Glass/Bridge/settings.json"));
        }
    }
}
