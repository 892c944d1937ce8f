//! Dynamic library loading with per-symbol caching.
//!
//! A [`LibraryLoader`] opens shared libraries and resolves exported symbols.
//! [`SymbolCache`] sits on top of a loader and guarantees that each library
//! path is opened at most once and each (library path, symbol name) pair is
//! resolved at most once for the life of the cache. Libraries are never
//! closed.

use std::collections::HashMap;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BridgeError, Result};
use crate::platform::Platform;

#[cfg(unix)]
pub mod posix;
#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
pub use posix::PosixLoader;
#[cfg(windows)]
pub use windows::WindowsLoader;

/// Backend that opens shared libraries and looks up their exports.
pub trait LibraryLoader: Send + Sync {
    /// Handle to an opened library. Dropping it may unload the library.
    type Library: Send + Sync;

    /// Open the shared library at `path`.
    fn open(&self, path: &Path) -> Result<Self::Library>;

    /// Resolve `name` inside an opened library. `path` is the path the
    /// library was opened from and is only used for error reporting.
    fn symbol(&self, library: &Self::Library, path: &Path, name: &str) -> Result<NonNull<c_void>>;
}

/// Descriptor tying an exported symbol name to its native signature.
///
/// # Safety
///
/// `Fn` must be a function pointer type whose signature and calling
/// convention match the export named `SYMBOL`.
pub unsafe trait EntryPoint {
    /// Exported symbol name.
    const SYMBOL: &'static str;
    /// Function pointer type of the export.
    type Fn: Copy;
}

/// A resolved export inside a loaded library.
#[derive(Debug)]
pub struct SymbolBinding {
    library: PathBuf,
    name: String,
    address: NonNull<c_void>,
}

// SAFETY: the address points into a library that stays loaded for the life
// of the owning cache and is never written through.
unsafe impl Send for SymbolBinding {}
unsafe impl Sync for SymbolBinding {}

impl SymbolBinding {
    fn new(library: PathBuf, name: &str, address: NonNull<c_void>) -> Self {
        Self {
            library,
            name: name.to_string(),
            address,
        }
    }

    pub fn library(&self) -> &Path {
        &self.library
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> *const c_void {
        self.address.as_ptr()
    }

    /// View the address as a function pointer of type `F`.
    ///
    /// # Safety
    ///
    /// `F` must be a function pointer type matching the export's real
    /// signature and calling convention.
    pub unsafe fn as_fn<F: Copy>(&self) -> F {
        assert_eq!(
            std::mem::size_of::<F>(),
            std::mem::size_of::<*mut c_void>(),
            "entry point type must be a plain function pointer"
        );
        std::mem::transmute_copy(&self.address.as_ptr())
    }

    /// Typed view through an [`EntryPoint`] descriptor.
    pub fn entry_point<E: EntryPoint>(&self) -> E::Fn {
        // SAFETY: guaranteed by the EntryPoint implementation.
        unsafe { self.as_fn::<E::Fn>() }
    }
}

struct CacheState<Lib> {
    libraries: HashMap<PathBuf, Arc<Lib>>,
    symbols: HashMap<PathBuf, HashMap<String, Arc<SymbolBinding>>>,
}

impl<Lib> Default for CacheState<Lib> {
    fn default() -> Self {
        Self {
            libraries: HashMap::new(),
            symbols: HashMap::new(),
        }
    }
}

impl<Lib> CacheState<Lib> {
    fn binding(&self, path: &Path, name: &str) -> Option<Arc<SymbolBinding>> {
        self.symbols.get(path).and_then(|s| s.get(name)).cloned()
    }
}

/// Memoizing symbol resolver over a [`LibraryLoader`].
pub struct SymbolCache<L: LibraryLoader> {
    loader: L,
    state: RwLock<CacheState<L::Library>>,
}

impl<L: LibraryLoader> SymbolCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolve `name` in the library at `path`, opening it if needed.
    ///
    /// Repeated calls with the same arguments return the same binding
    /// without touching the loader again. Nothing is cached for a failed
    /// lookup.
    pub fn resolve(&self, path: &Path, name: &str) -> Result<Arc<SymbolBinding>> {
        let path = normalize(path);

        if let Some(binding) = self.state.read().binding(&path, name) {
            tracing::trace!(symbol = name, library = %path.display(), "Symbol cache hit");
            return Ok(binding);
        }

        let mut state = self.state.write();
        // Another thread may have filled the entry while we waited.
        if let Some(binding) = state.binding(&path, name) {
            return Ok(binding);
        }

        let library = match state.libraries.get(&path) {
            Some(library) => Arc::clone(library),
            None => {
                tracing::debug!(library = %path.display(), "Opening library");
                let library = Arc::new(self.loader.open(&path)?);
                state.libraries.insert(path.clone(), Arc::clone(&library));
                library
            }
        };

        let address = self.loader.symbol(&library, &path, name)?;
        let binding = Arc::new(SymbolBinding::new(path.clone(), name, address));
        tracing::debug!(symbol = name, library = %path.display(), "Resolved symbol");

        state
            .symbols
            .entry(path)
            .or_default()
            .insert(name.to_string(), Arc::clone(&binding));

        Ok(binding)
    }

    /// Resolve an entry point and return its typed function pointer.
    pub fn entry_point<E: EntryPoint>(&self, path: &Path) -> Result<E::Fn> {
        Ok(self.resolve(path, E::SYMBOL)?.entry_point::<E>())
    }

    /// Whether a library at `path` has been opened through this cache.
    pub fn is_library_open(&self, path: &Path) -> bool {
        self.state.read().libraries.contains_key(&normalize(path))
    }

    /// Number of cached symbol bindings across all libraries.
    pub fn symbol_count(&self) -> usize {
        self.state.read().symbols.values().map(HashMap::len).sum()
    }
}

/// Lexical normalization used for cache keys.
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Library handle produced by [`NativeLoader`].
pub enum NativeLibrary {
    #[cfg(unix)]
    Posix(libloading::os::unix::Library),
    #[cfg(windows)]
    Windows(libloading::os::windows::Library),
}

/// Loader backed by the operating system's dynamic linker.
///
/// The backend is chosen once from the detected [`Platform`]: `dlopen` and
/// `dlsym` on macOS and other POSIX systems, `LoadLibraryExW` and
/// `GetProcAddress` on Windows.
#[derive(Debug, Clone, Copy)]
pub enum NativeLoader {
    #[cfg(unix)]
    Posix(PosixLoader),
    #[cfg(windows)]
    Windows(WindowsLoader),
    /// The detected platform has no backend in this build.
    Unsupported(Platform),
}

impl NativeLoader {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            #[cfg(windows)]
            Platform::Windows => NativeLoader::Windows(WindowsLoader),
            #[cfg(unix)]
            Platform::MacOs | Platform::Posix => NativeLoader::Posix(PosixLoader),
            #[allow(unreachable_patterns)]
            other => NativeLoader::Unsupported(other),
        }
    }
}

impl Default for NativeLoader {
    fn default() -> Self {
        Self::for_platform(Platform::current())
    }
}

impl LibraryLoader for NativeLoader {
    type Library = NativeLibrary;

    fn open(&self, path: &Path) -> Result<NativeLibrary> {
        match self {
            #[cfg(unix)]
            NativeLoader::Posix(loader) => loader.open(path).map(NativeLibrary::Posix),
            #[cfg(windows)]
            NativeLoader::Windows(loader) => loader.open(path).map(NativeLibrary::Windows),
            NativeLoader::Unsupported(platform) => Err(BridgeError::LibraryOpenFailed {
                path: path.to_path_buf(),
                reason: format!("no loader backend for {} in this build", platform),
            }),
        }
    }

    fn symbol(&self, library: &NativeLibrary, path: &Path, name: &str) -> Result<NonNull<c_void>> {
        match (self, library) {
            #[cfg(unix)]
            (NativeLoader::Posix(loader), NativeLibrary::Posix(library)) => {
                loader.symbol(library, path, name)
            }
            #[cfg(windows)]
            (NativeLoader::Windows(loader), NativeLibrary::Windows(library)) => {
                loader.symbol(library, path, name)
            }
            #[allow(unreachable_patterns)]
            _ => Err(BridgeError::SymbolResolutionFailed {
                symbol: name.to_string(),
                path: path.to_path_buf(),
                reason: "library was opened by a different backend".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    extern "C" fn answer() -> i32 {
        42
    }

    #[derive(Default)]
    struct CountingLoader {
        opens: AtomicUsize,
        lookups: AtomicUsize,
    }

    impl LibraryLoader for CountingLoader {
        type Library = ();

        fn open(&self, path: &Path) -> Result<()> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if path.to_string_lossy().contains("missing") {
                return Err(BridgeError::LibraryOpenFailed {
                    path: path.to_path_buf(),
                    reason: "no such file".to_string(),
                });
            }
            Ok(())
        }

        fn symbol(&self, _library: &(), path: &Path, name: &str) -> Result<NonNull<c_void>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if name == "answer" {
                NonNull::new(answer as *mut c_void).ok_or(BridgeError::NotInitialized)
            } else {
                Err(BridgeError::SymbolResolutionFailed {
                    symbol: name.to_string(),
                    path: path.to_path_buf(),
                    reason: "not exported".to_string(),
                })
            }
        }
    }

    struct Answer;

    unsafe impl EntryPoint for Answer {
        const SYMBOL: &'static str = "answer";
        type Fn = extern "C" fn() -> i32;
    }

    #[test]
    fn test_resolve_is_memoized() {
        let cache = SymbolCache::new(CountingLoader::default());
        let path = Path::new("/opt/bridge/libbridge_inproc.so");

        let first = cache.resolve(path, "answer").unwrap();
        let second = cache.resolve(path, "answer").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.loader().opens.load(Ordering::SeqCst), 1);
        assert_eq!(cache.loader().lookups.load(Ordering::SeqCst), 1);
        assert_eq!(cache.symbol_count(), 1);
    }

    #[test]
    fn test_library_opened_once_for_many_symbols() {
        let cache = SymbolCache::new(CountingLoader::default());
        let path = Path::new("/opt/bridge/libbridge_inproc.so");

        cache.resolve(path, "answer").unwrap();
        assert!(cache.resolve(path, "absent").is_err());
        assert!(cache.resolve(path, "absent").is_err());

        assert_eq!(cache.loader().opens.load(Ordering::SeqCst), 1);
        assert_eq!(cache.loader().lookups.load(Ordering::SeqCst), 3);
        assert_eq!(cache.symbol_count(), 1);
    }

    #[test]
    fn test_normalized_paths_share_entries() {
        let cache = SymbolCache::new(CountingLoader::default());

        let a = cache.resolve(Path::new("/opt/bridge/./libbridge_inproc.so"), "answer").unwrap();
        let b = cache.resolve(Path::new("/opt//bridge/libbridge_inproc.so"), "answer").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(cache.is_library_open(Path::new("/opt/bridge/libbridge_inproc.so")));
    }

    #[test]
    fn test_open_failure_is_not_cached() {
        let cache = SymbolCache::new(CountingLoader::default());
        let path = Path::new("/missing/libbridge_inproc.so");

        let err = cache.resolve(path, "answer").unwrap_err();
        assert!(matches!(err, BridgeError::LibraryOpenFailed { .. }));
        assert!(!cache.is_library_open(path));

        assert!(cache.resolve(path, "answer").is_err());
        assert_eq!(cache.loader().opens.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_typed_entry_point() {
        let cache = SymbolCache::new(CountingLoader::default());
        let f = cache.entry_point::<Answer>(Path::new("/opt/lib.so")).unwrap();
        assert_eq!(f(), 42);
    }

    #[test]
    fn test_unsupported_backend_fails_cleanly() {
        let loader = NativeLoader::Unsupported(Platform::Windows);
        let err = loader.open(Path::new("bridge_inproc.dll")).err().unwrap();
        assert!(matches!(err, BridgeError::LibraryOpenFailed { .. }));
    }
}
