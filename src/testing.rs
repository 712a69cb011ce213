// ── Test doubles ──────────────────────────────────────────────────────────────
//
// A scripted `LoaderBackend` that opens only the paths it was told about and
// records every open attempt and close call.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    context::LoaderContext,
    handle::NativeHandle,
    loader::{backend::LoaderBackend, resolver::LoadTargetResolver},
    platform::{Architecture, Family, OsVersion, PlatformDescriptor},
};

#[derive(Default)]
pub(crate) struct MockBackend {
    libraries: HashMap<String, NativeHandle>,
    symbols: HashMap<(NativeHandle, String), NativeHandle>,
    attempts: Mutex<Vec<String>>,
    closes: Mutex<Vec<NativeHandle>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `path` opens successfully and yields `raw`.
    pub(crate) fn library(mut self, path: impl Into<String>, raw: usize) -> Self {
        self.libraries.insert(path.into(), NativeHandle::from_raw(raw));
        self
    }

    /// `name` resolves to `address` inside the library with handle `raw`.
    pub(crate) fn symbol(mut self, raw: usize, name: &str, address: usize) -> Self {
        self.symbols.insert(
            (NativeHandle::from_raw(raw), name.to_owned()),
            NativeHandle::from_raw(address),
        );
        self
    }

    pub(crate) fn attempts(&self) -> Vec<String> {
        self.attempts.lock().expect("attempts").clone()
    }

    pub(crate) fn close_count(&self, raw: usize) -> usize {
        let raw = NativeHandle::from_raw(raw);
        self.closes.lock().expect("closes").iter().filter(|&&h| h == raw).count()
    }
}

impl LoaderBackend for MockBackend {
    fn open_library(&self, path: &str) -> NativeHandle {
        self.attempts.lock().expect("attempts").push(path.to_owned());
        self.libraries.get(path).copied().unwrap_or(NativeHandle::NULL)
    }

    fn resolve_symbol(&self, handle: NativeHandle, name: &str) -> NativeHandle {
        self.symbols
            .get(&(handle, name.to_owned()))
            .copied()
            .unwrap_or(NativeHandle::NULL)
    }

    fn close_library(&self, handle: NativeHandle) -> bool {
        if handle.is_null() {
            return true;
        }
        self.closes.lock().expect("closes").push(handle);
        true
    }
}

pub(crate) fn platform(family: Family) -> PlatformDescriptor {
    PlatformDescriptor::new(family, Architecture::X64, &OsVersion::default(), None)
}

/// Context over `backend` with a resolver that has no base directory and no
/// manifest, so candidates expand to their bare names only.
pub(crate) fn context(family: Family, backend: &Arc<MockBackend>) -> LoaderContext {
    let platform = platform(family);
    let resolver = LoadTargetResolver::new(platform.runtime_identifier());
    let backend: Arc<dyn LoaderBackend> = Arc::clone(backend) as Arc<dyn LoaderBackend>;
    LoaderContext::with_parts(platform, backend, resolver)
}
