// ── Native handle ownership ───────────────────────────────────────────────────
//
// Every OS resource nativelib hands out is wrapped so that it is released
// exactly once, is owned by exactly one wrapper, and cannot be used after
// release:
//
//   • `registry`  – process-level identity map (one owner per raw value)
//   • `lifecycle` – the `Live -> Disposed` state of a single registration
//   • `component` – `NativeComponent<T>`: lifecycle + release strategy +
//                   composed managed children
//
// Cleanup is deterministic: `Drop` runs the same path as `dispose()`.

use std::{ffi::c_void, fmt};

pub mod component;
pub mod lifecycle;
pub mod registry;

pub use component::{NativeComponent, ReleaseFn, ReleaseHandle};
pub use lifecycle::HandleLifecycle;
pub use registry::{HandleRecord, HandleRegistry, OwnerId};

// ── NativeHandle ──────────────────────────────────────────────────────────────

/// An opaque pointer-sized value issued by the OS loader: a module handle or
/// a resolved symbol address.
///
/// Zero is the sentinel "no resource" value and is never valid.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeHandle(usize);

impl NativeHandle {
    /// The sentinel null handle.
    pub const NULL: NativeHandle = NativeHandle(0);

    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as usize)
    }

    pub const fn as_raw(self) -> usize {
        self.0
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:#x})", self.0)
    }
}

// ── Disposal protocol ─────────────────────────────────────────────────────────

/// Deterministic, idempotent release of a resource.
///
/// A second call to `dispose` is a no-op.  Implementors also run `dispose`
/// from `Drop`, so scoped acquisition is the normal way to use them.
pub trait Dispose {
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
