//! Error types for bridge loading and invocation.

use std::path::PathBuf;

/// Bridge errors
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// No usable install was found. Not fatal: the host should ask for a
    /// manual install path.
    #[error("No Bridge install found: {0}")]
    InstallNotFound(String),

    #[error("Failed to load library {path:?}: {reason}")]
    LibraryOpenFailed { path: PathBuf, reason: String },

    #[error("Symbol not found: {symbol} in {path:?}: {reason}")]
    SymbolResolutionFailed {
        symbol: String,
        path: PathBuf,
        reason: String,
    },

    /// The native function ran and reported failure.
    #[error("Native call failed: {0}")]
    NativeCallFailed(String),

    #[error("Bridge is not initialized")]
    NotInitialized,

    #[error("Invalid string for native call: {0}")]
    InvalidString(String),

    /// An integer argument does not fit the native `unsigned long`.
    #[error("{name} {value} does not fit in a native unsigned long")]
    ValueOutOfRange { name: &'static str, value: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the host should fall back to asking for an install path.
    pub fn is_install_not_found(&self) -> bool {
        matches!(self, BridgeError::InstallNotFound(_))
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BridgeError::SymbolResolutionFailed {
            symbol: "get_displays".to_string(),
            path: PathBuf::from("/opt/bridge/libbridge_inproc.so"),
            reason: "undefined symbol".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("get_displays"));
        assert!(msg.contains("libbridge_inproc.so"));

        assert_eq!(
            BridgeError::NativeCallFailed("initialize_bridge".to_string()).to_string(),
            "Native call failed: initialize_bridge"
        );
    }

    #[test]
    fn test_install_not_found_classification() {
        assert!(BridgeError::InstallNotFound("2.5.1".into()).is_install_not_found());
        assert!(!BridgeError::NotInitialized.is_install_not_found());
    }
}
