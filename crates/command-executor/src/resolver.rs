//! Mapping logical tool names to executables
//!
//! The resolver keeps a copy-on-write cache: readers take an `Arc` snapshot of the
//! map, writers build a new map and swap it in. Resolution never fails outright; a
//! name that cannot be found yields a descriptor without a path, and the error is
//! raised when something tries to spawn it.

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// A resolved (or unresolvable) tool binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryDescriptor {
    logical_name: String,
    resolved_path: Option<PathBuf>,
    is_alternate_install: bool,
}

impl BinaryDescriptor {
    /// Create a descriptor pointing at an explicit executable
    pub fn new(logical_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            logical_name: logical_name.into(),
            resolved_path: Some(path.into()),
            is_alternate_install: false,
        }
    }

    /// Create a descriptor for a name that could not be found
    pub fn unresolved(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            resolved_path: None,
            is_alternate_install: false,
        }
    }

    /// The logical name this descriptor was resolved for
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// The executable path, if one was found
    pub fn resolved_path(&self) -> Option<&Path> {
        self.resolved_path.as_deref()
    }

    /// Whether the binary came from the alternate bundled-install location
    pub fn is_alternate_install(&self) -> bool {
        self.is_alternate_install
    }

    /// Whether an executable was found
    pub fn is_resolved(&self) -> bool {
        self.resolved_path.is_some()
    }

    /// The executable path, or [`Error::BinaryResolution`] if there is none
    pub fn require_path(&self) -> Result<&Path> {
        self.resolved_path
            .as_deref()
            .ok_or_else(|| Error::BinaryResolution {
                name: self.logical_name.clone(),
            })
    }
}

/// The directories a resolution pass looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchEnvironment {
    /// Alternate bundled-install directory, if configured
    pub alternate_install: Option<PathBuf>,
    /// Search path directories, in priority order
    pub search_path: Vec<PathBuf>,
}

impl SearchEnvironment {
    /// Build the search environment from the current process environment
    pub fn from_process(config: &ResolverConfig) -> Self {
        let alternate_install = std::env::var_os(&config.alternate_install_var)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let search_path = std::env::var_os(&config.path_var)
            .map(|value| split_search_path(&value))
            .unwrap_or_default();

        Self {
            alternate_install,
            search_path,
        }
    }
}

fn split_search_path(value: &OsString) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect()
}

/// Options for a single [`BinaryResolver::resolve_with`] call
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Look in the alternate install location before the search path
    pub prefer_alternate: bool,
    /// Discard the cache and resolve again
    pub force_refresh: bool,
}

#[derive(Debug, Clone)]
enum EnvironmentSource {
    Process,
    Fixed(SearchEnvironment),
}

type Cache = HashMap<(String, bool), Arc<BinaryDescriptor>>;

/// Resolves logical tool names to executables, caching the results
///
/// Share one resolver (behind an `Arc`) between everything that spawns tools.
#[derive(Debug)]
pub struct BinaryResolver {
    config: ResolverConfig,
    source: EnvironmentSource,
    cache: RwLock<Arc<Cache>>,
}

impl BinaryResolver {
    /// Create a resolver that reads the process environment on every (re)resolution
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            source: EnvironmentSource::Process,
            cache: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Create a resolver over a fixed set of directories
    pub fn with_environment(config: ResolverConfig, environment: SearchEnvironment) -> Self {
        Self {
            config,
            source: EnvironmentSource::Fixed(environment),
            cache: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Resolve a name with default options
    pub fn resolve(&self, logical_name: &str) -> Arc<BinaryDescriptor> {
        self.resolve_with(logical_name, ResolveOptions::default())
    }

    /// Resolve a name, consulting the cache unless `force_refresh` is set
    pub fn resolve_with(&self, logical_name: &str, options: ResolveOptions) -> Arc<BinaryDescriptor> {
        let key = (logical_name.to_string(), options.prefer_alternate);

        if !options.force_refresh {
            if let Some(cached) = self.snapshot().get(&key) {
                return Arc::clone(cached);
            }
        }

        let environment = match &self.source {
            EnvironmentSource::Process => SearchEnvironment::from_process(&self.config),
            EnvironmentSource::Fixed(environment) => environment.clone(),
        };
        let descriptor = Arc::new(self.locate(logical_name, options.prefer_alternate, &environment));

        match descriptor.resolved_path() {
            Some(path) => info!(
                "Resolved '{}' to {}{}",
                logical_name,
                path.display(),
                if descriptor.is_alternate_install() { " (alternate install)" } else { "" }
            ),
            None => info!("Could not resolve '{}'", logical_name),
        }

        let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
        let mut next: Cache = if options.force_refresh {
            HashMap::new()
        } else {
            (**guard).clone()
        };
        let stored = Arc::clone(next.entry(key).or_insert(descriptor));
        *guard = Arc::new(next);
        stored
    }

    /// Drop every cached descriptor
    pub fn clear(&self) {
        let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(HashMap::new());
    }

    fn snapshot(&self) -> Arc<Cache> {
        let guard = self.cache.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    fn locate(
        &self,
        logical_name: &str,
        prefer_alternate: bool,
        environment: &SearchEnvironment,
    ) -> BinaryDescriptor {
        // Explicit paths bypass the search entirely
        let direct = Path::new(logical_name);
        if direct.components().count() > 1 {
            return match self.find_candidate(direct.parent(), direct) {
                Some(path) => BinaryDescriptor::new(logical_name, path),
                None => BinaryDescriptor::unresolved(logical_name),
            };
        }

        let alternate = environment.alternate_install.as_deref();

        if prefer_alternate {
            if let Some(path) = alternate.and_then(|dir| self.find_in(dir, logical_name)) {
                return alternate_descriptor(logical_name, path);
            }
        }

        for dir in &environment.search_path {
            if !prefer_alternate && alternate.is_some_and(|alt| same_dir(alt, dir)) {
                debug!("Skipping alternate install dir {} on search path", dir.display());
                continue;
            }
            if let Some(path) = self.find_in(dir, logical_name) {
                return BinaryDescriptor::new(logical_name, path);
            }
        }

        if !prefer_alternate {
            if let Some(path) = alternate.and_then(|dir| self.find_in(dir, logical_name)) {
                return alternate_descriptor(logical_name, path);
            }
        }

        BinaryDescriptor::unresolved(logical_name)
    }

    fn find_in(&self, dir: &Path, logical_name: &str) -> Option<PathBuf> {
        self.find_candidate(Some(dir), &dir.join(logical_name))
    }

    fn find_candidate(&self, dir: Option<&Path>, base: &Path) -> Option<PathBuf> {
        let file_name = base.file_name()?.to_string_lossy().into_owned();
        let dir = dir.unwrap_or_else(|| Path::new(""));

        self.config
            .executable_suffixes
            .iter()
            .map(|suffix| dir.join(format!("{file_name}{suffix}")))
            .find(|candidate| is_executable(candidate))
    }
}

impl Default for BinaryResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

fn alternate_descriptor(logical_name: &str, path: PathBuf) -> BinaryDescriptor {
    BinaryDescriptor {
        logical_name: logical_name.to_string(),
        resolved_path: Some(path),
        is_alternate_install: true,
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
