// ── Loader context ────────────────────────────────────────────────────────────
//
// Process-level owner of everything a load needs: the detected platform,
// the backend chosen for its family, the resolver, the handle registry, and
// the "library loaded" observers.  Binding layers normally create one context
// at startup and keep it alive as long as any `NativeAssembly` it produced.
//
// The registry is owned here rather than hidden in a global, so independent
// contexts (e.g. one per test) never see each other's handles.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    config::LoaderConfig,
    error::Result,
    handle::HandleRegistry,
    loader::{backend_for, DependencyManifest, LibraryLoaded, LoadTargetResolver, LoaderBackend, NativeAssembly},
    platform::{self, PlatformDescriptor},
};

type Observer = Arc<dyn Fn(&LibraryLoaded) + Send + Sync>;

/// Shared state for loading libraries and owning their handles.
pub struct LoaderContext {
    platform: PlatformDescriptor,
    backend: Arc<dyn LoaderBackend>,
    registry: Arc<HandleRegistry>,
    resolver: LoadTargetResolver,
    observers: Mutex<Vec<Observer>>,
}

impl LoaderContext {
    /// Context for the host platform, configured by `config`.
    ///
    /// A missing or malformed dependency manifest is logged and skipped.
    pub fn new(config: &LoaderConfig) -> Self {
        let mut platform = platform::detect().clone();
        if let Some(rid) = config.runtime_identifier.as_deref().filter(|r| !r.is_empty()) {
            platform = platform.with_runtime_identifier(rid);
        }

        let manifest = config
            .resolved_deps_file()
            .and_then(|path| DependencyManifest::load_optional(&path));

        let mut resolver = LoadTargetResolver::new(platform.runtime_identifier())
            .with_probe_paths(config.probe_paths.iter().cloned())
            .with_manifest(manifest);
        if let Some(dir) = config.resolved_base_dir() {
            resolver = resolver.with_base_dir(dir);
        }

        let backend = backend_for(platform.family());
        Self::with_parts(platform, backend, resolver)
    }

    /// Context for the host platform configured from the environment.
    pub fn from_env() -> Self {
        Self::new(&LoaderConfig::from_env())
    }

    /// Assemble a context from explicit parts (custom backends, tests).
    pub fn with_parts(
        platform: PlatformDescriptor,
        backend: Arc<dyn LoaderBackend>,
        resolver: LoadTargetResolver,
    ) -> Self {
        Self {
            platform,
            backend,
            registry: Arc::new(HandleRegistry::new()),
            resolver,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for `NativeAssembly::load(self, candidates)`.
    pub fn load<S: AsRef<str>>(&self, candidates: &[S]) -> Result<NativeAssembly> {
        NativeAssembly::load(self, candidates)
    }

    pub fn platform(&self) -> &PlatformDescriptor {
        &self.platform
    }

    pub fn backend(&self) -> &Arc<dyn LoaderBackend> {
        &self.backend
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &LoadTargetResolver {
        &self.resolver
    }

    /// Register an observer for successful loads.  Informational only.
    pub fn on_library_loaded<F>(&self, observer: F)
    where
        F: Fn(&LibraryLoaded) + Send + Sync + 'static,
    {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(observer));
    }

    /// Observers run with the list unlocked, so they may load libraries or
    /// register further observers themselves.
    pub(crate) fn publish(&self, event: &LibraryLoaded) {
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer(event);
        }
    }
}

impl fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderContext")
            .field("platform", &self.platform)
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
