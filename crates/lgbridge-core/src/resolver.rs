//! Install location resolver.
//!
//! Maps a requested Bridge version to the install directory of the best
//! matching installed copy, as listed in the settings manifest.
//!
//! Selection rules:
//! 1. An exact version match wins.
//! 2. Otherwise the ordinally greatest version sharing the requested major
//!    version (the first dot-delimited component) is used. Comparison is by
//!    string, not by number, so `"2.10.0"` sorts before `"2.9.0"`.
//! 3. Otherwise nothing is found.
//!
//! A missing manifest and a manifest without a match both yield `Ok(None)`.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::manifest::{scrape_install_locations, VersionEntry};
use crate::platform::Platform;

/// Version string to install directory, one path per exact version.
pub type VersionMap = HashMap<String, String>;

/// Resolves install directories from a settings manifest.
#[derive(Debug, Clone, Default)]
pub struct InstallResolver {
    settings_path: Option<PathBuf>,
    minimum_version: Option<String>,
}

impl InstallResolver {
    /// Resolver reading the manifest at `settings_path`. `None` means the
    /// manifest location is unknown and nothing will ever resolve.
    pub fn new(settings_path: Option<PathBuf>) -> Self {
        Self {
            settings_path,
            minimum_version: None,
        }
    }

    /// Resolver using the platform's settings manifest location.
    pub fn for_platform(platform: Platform) -> Self {
        Self::new(platform.settings_path())
    }

    /// Resolver honoring the overrides in `config`.
    pub fn from_config(config: &BridgeConfig, platform: Platform) -> Self {
        let settings_path = config
            .settings_path
            .clone()
            .or_else(|| platform.settings_path());

        Self {
            settings_path,
            minimum_version: config.minimum_version.clone(),
        }
    }

    /// Ignore manifest entries ordinally below `version`.
    pub fn with_minimum_version(mut self, version: impl Into<String>) -> Self {
        self.minimum_version = Some(version.into());
        self
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    pub fn minimum_version(&self) -> Option<&str> {
        self.minimum_version.as_deref()
    }

    /// Read and scrape the manifest. `Ok(None)` when it does not exist.
    fn read_entries(&self) -> Result<Option<Vec<VersionEntry>>> {
        let Some(path) = self.settings_path.as_deref() else {
            return Ok(None);
        };

        // Anything that is not a regular file counts as a missing manifest.
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => {
                tracing::debug!(path = %path.display(), "Settings manifest is not a file");
                return Ok(None);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Settings manifest not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Some(scrape_install_locations(&text)))
    }

    /// Installed copies listed in the manifest, one per version, sorted
    /// ordinally by version. Empty when the manifest does not exist.
    pub fn entries(&self) -> Result<Vec<VersionEntry>> {
        let map = self.version_map()?;
        let mut entries: Vec<VersionEntry> = map
            .into_iter()
            .map(|(version, path)| VersionEntry { version, path })
            .collect();
        entries.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(entries)
    }

    /// Version map built from the manifest, after minimum-version filtering.
    pub fn version_map(&self) -> Result<VersionMap> {
        let entries = self.read_entries()?.unwrap_or_default();
        Ok(build_version_map(entries, self.minimum_version.as_deref()))
    }

    /// Install directory for `requested`, or `None` when nothing matches.
    pub fn resolve(&self, requested: &str) -> Result<Option<PathBuf>> {
        let map = self.version_map()?;

        let resolved = select_install(&map, requested).map(PathBuf::from);
        match &resolved {
            Some(path) => {
                tracing::debug!(requested, path = %path.display(), "Resolved Bridge install")
            }
            None => tracing::debug!(requested, "No matching Bridge install"),
        }
        Ok(resolved)
    }
}

/// Build the version map. Later duplicates replace earlier ones.
pub fn build_version_map(
    entries: impl IntoIterator<Item = VersionEntry>,
    minimum_version: Option<&str>,
) -> VersionMap {
    let mut map = VersionMap::new();
    for entry in entries {
        if let Some(minimum) = minimum_version {
            if entry.version.as_str() < minimum {
                tracing::debug!(version = %entry.version, minimum, "Ignoring install below minimum version");
                continue;
            }
        }
        map.insert(entry.version, entry.path);
    }
    map
}

/// Leading dot-delimited component of a version string.
pub fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

/// Pick the install path for `requested` from `map`.
pub fn select_install<'a>(map: &'a VersionMap, requested: &str) -> Option<&'a str> {
    if let Some(path) = map.get(requested) {
        return Some(path.as_str());
    }

    let major = major_version(requested);
    map.iter()
        .filter(|(version, _)| major_version(version) == major)
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, path)| path.as_str())
}
