// ── Loader backend ────────────────────────────────────────────────────────────
//
// Three abstract operations with identical signatures on every platform:
//
//   open_library   → module handle, or null on failure (never panics)
//   resolve_symbol → symbol address, or null when absent
//   close_library  → success flag; closing null is a successful no-op
//
// One concrete backend per OS family is chosen once, from
// `PlatformDescriptor::family`, by `backend_for`.  Typed errors are the
// caller's job (`NativeAssembly`); backends only report null / false.

use std::{fmt, sync::Arc};

use crate::{
    handle::{NativeHandle, ReleaseHandle},
    platform::Family,
};

/// OS loader primitives.
pub trait LoaderBackend: Send + Sync {
    fn open_library(&self, path: &str) -> NativeHandle;

    fn resolve_symbol(&self, handle: NativeHandle, name: &str) -> NativeHandle;

    fn close_library(&self, handle: NativeHandle) -> bool;
}

/// Select the backend for `family`.
///
/// A family this build cannot serve (e.g. `Windows` on a Unix build, or
/// `Unknown`) gets `UnsupportedBackend`.
pub fn backend_for(family: Family) -> Arc<dyn LoaderBackend> {
    match family {
        #[cfg(windows)]
        Family::Windows => Arc::new(Win32Backend),
        #[cfg(unix)]
        Family::Linux | Family::MacOS | Family::FreeBSD => Arc::new(PosixBackend),
        _ => {
            log::warn!("no native loader available for {family}");
            Arc::new(UnsupportedBackend)
        }
    }
}

// ── Win32 ─────────────────────────────────────────────────────────────────────

/// `LoadLibraryW` / `GetProcAddress` / `FreeLibrary`.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Backend;

#[cfg(windows)]
impl LoaderBackend for Win32Backend {
    fn open_library(&self, path: &str) -> NativeHandle {
        crate::platform::win32::open_library(path)
    }

    fn resolve_symbol(&self, handle: NativeHandle, name: &str) -> NativeHandle {
        crate::platform::win32::resolve_symbol(handle, name)
    }

    fn close_library(&self, handle: NativeHandle) -> bool {
        crate::platform::win32::close_library(handle)
    }
}

// ── POSIX ─────────────────────────────────────────────────────────────────────

/// `dlopen(RTLD_NOW)` / `dlsym` / `dlclose`.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixBackend;

#[cfg(unix)]
impl LoaderBackend for PosixBackend {
    fn open_library(&self, path: &str) -> NativeHandle {
        crate::platform::posix::open_library(path)
    }

    fn resolve_symbol(&self, handle: NativeHandle, name: &str) -> NativeHandle {
        crate::platform::posix::resolve_symbol(handle, name)
    }

    fn close_library(&self, handle: NativeHandle) -> bool {
        crate::platform::posix::close_library(handle)
    }
}

// ── Unsupported ───────────────────────────────────────────────────────────────

/// Backend for unrecognised platforms: every open fails, every close of a
/// non-null handle fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedBackend;

impl LoaderBackend for UnsupportedBackend {
    fn open_library(&self, _path: &str) -> NativeHandle {
        NativeHandle::NULL
    }

    fn resolve_symbol(&self, _handle: NativeHandle, _name: &str) -> NativeHandle {
        NativeHandle::NULL
    }

    fn close_library(&self, handle: NativeHandle) -> bool {
        handle.is_null()
    }
}

// ── Library release strategy ──────────────────────────────────────────────────

/// Releases library handles through the backend that opened them.
#[derive(Clone)]
pub struct LibraryRelease {
    backend: Arc<dyn LoaderBackend>,
}

impl LibraryRelease {
    pub fn new(backend: &Arc<dyn LoaderBackend>) -> Self {
        Self {
            backend: Arc::clone(backend),
        }
    }

    pub fn backend(&self) -> &Arc<dyn LoaderBackend> {
        &self.backend
    }
}

impl ReleaseHandle for LibraryRelease {
    fn release(&mut self, handle: NativeHandle) -> bool {
        self.backend.close_library(handle)
    }
}

impl fmt::Debug for LibraryRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryRelease").finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
