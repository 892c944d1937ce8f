//! Bridge context: install resolution, initialization and entry-point calls.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::BridgeConfig;
use crate::entry::{InitializeBridge, InitializeBridgeWide, UninitializeBridge};
use crate::error::{BridgeError, Result};
use crate::loader::{EntryPoint, LibraryLoader, NativeLoader, SymbolCache};
use crate::marshal::NativeString;
use crate::platform::Platform;
use crate::resolver::InstallResolver;

/// Handle to a (possibly not yet initialized) Bridge library.
///
/// Every entry point other than initialization targets the library path
/// recorded by the last successful [`Bridge::initialize`] or
/// [`Bridge::initialize_with_path`]. Until then such calls fail with
/// [`BridgeError::NotInitialized`] without touching the loader.
pub struct Bridge<L: LibraryLoader = NativeLoader> {
    platform: Platform,
    config: BridgeConfig,
    cache: SymbolCache<L>,
    library_path: RwLock<Option<PathBuf>>,
}

impl Bridge<NativeLoader> {
    /// Bridge for the current platform, configured from the environment.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::from_env())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let platform = Platform::current();
        Self::with_loader(platform, config, NativeLoader::for_platform(platform))
    }
}

impl Default for Bridge<NativeLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: LibraryLoader> Bridge<L> {
    /// Bridge using an explicit platform and loader backend.
    pub fn with_loader(platform: Platform, config: BridgeConfig, loader: L) -> Self {
        Self {
            platform,
            config,
            cache: SymbolCache::new(loader),
            library_path: RwLock::new(None),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn symbol_cache(&self) -> &SymbolCache<L> {
        &self.cache
    }

    /// Resolver for this bridge's settings manifest.
    pub fn resolver(&self) -> InstallResolver {
        InstallResolver::from_config(&self.config, self.platform)
    }

    /// Path of the active Bridge library, if initialized.
    pub fn library_path(&self) -> Option<PathBuf> {
        self.library_path.read().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.library_path.read().is_some()
    }

    /// Find the install for `version` and initialize the library there.
    pub fn initialize(&self, app_name: &str, version: &str) -> Result<()> {
        let install_dir = self
            .resolver()
            .resolve(version)?
            .ok_or_else(|| BridgeError::InstallNotFound(format!("version {}", version)))?;

        self.initialize_with_path(app_name, install_dir)
    }

    /// Initialize the Bridge library installed in `install_dir`.
    pub fn initialize_with_path(&self, app_name: &str, install_dir: impl AsRef<Path>) -> Result<()> {
        let install_dir = install_dir.as_ref();
        if install_dir.as_os_str().is_empty() {
            return Err(BridgeError::InstallNotFound("empty install path".to_string()));
        }

        let library_path = install_dir.join(self.platform.library_file_name());
        let app_name = NativeString::for_platform(app_name, self.platform)?;

        let initialized = match &app_name {
            NativeString::Utf16(wide) => {
                let f = self.cache.entry_point::<InitializeBridgeWide>(&library_path)?;
                // SAFETY: NUL-terminated UTF-16 that outlives the call.
                unsafe { f(wide.as_ptr()) }
            }
            NativeString::Utf8(utf8) => {
                let f = self.cache.entry_point::<InitializeBridge>(&library_path)?;
                // SAFETY: NUL-terminated UTF-8 that outlives the call.
                unsafe { f(utf8.as_ptr()) }
            }
        };

        if !initialized {
            return Err(BridgeError::NativeCallFailed(
                InitializeBridge::SYMBOL.to_string(),
            ));
        }

        tracing::info!(library = %library_path.display(), "Bridge initialized");
        *self.library_path.write() = Some(library_path);
        Ok(())
    }

    /// Shut the active library down. The bridge is uninitialized afterwards.
    pub fn uninitialize(&self) -> Result<()> {
        // SAFETY: uninitialize_bridge takes no arguments.
        self.call_checked::<UninitializeBridge>(|f| unsafe { f() })?;
        *self.library_path.write() = None;
        tracing::info!("Bridge uninitialized");
        Ok(())
    }

    /// Typed function pointer for `E` in the active library.
    pub fn entry_point<E: EntryPoint>(&self) -> Result<E::Fn> {
        let path = self.library_path().ok_or(BridgeError::NotInitialized)?;
        self.cache.entry_point::<E>(&path)
    }

    /// Resolve `E` in the active library and hand it to `invoke`.
    pub fn call<E, R>(&self, invoke: impl FnOnce(E::Fn) -> R) -> Result<R>
    where
        E: EntryPoint,
    {
        Ok(invoke(self.entry_point::<E>()?))
    }

    /// Like [`Bridge::call`] for exports returning a success flag; `false`
    /// becomes [`BridgeError::NativeCallFailed`].
    pub fn call_checked<E>(&self, invoke: impl FnOnce(E::Fn) -> bool) -> Result<()>
    where
        E: EntryPoint,
    {
        if self.call::<E, _>(invoke)? {
            Ok(())
        } else {
            Err(BridgeError::NativeCallFailed(E::SYMBOL.to_string()))
        }
    }
}
