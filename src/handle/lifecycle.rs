// ── Handle lifecycle ──────────────────────────────────────────────────────────
//
// State machine per registration:   Live ──dispose──▶ Disposed (terminal)
//
// `acquire` is the only way to attach a raw value, so a lifecycle can never
// be re-pointed at a different handle.  `retire` is the only transition to
// `Disposed` and is crate-private: only a component's disposal path calls it.

use std::{fmt, sync::Arc};

use super::{HandleRegistry, NativeHandle, OwnerId};
use crate::error::{Error, Result};

/// Registration of one raw handle in a `HandleRegistry`.
///
/// Knows nothing about how the OS resource is freed; that is the job of
/// the `ReleaseHandle` strategy in `NativeComponent`.  Dropping a lifecycle
/// that was never retired still removes its registry entry.
pub struct HandleLifecycle {
    registry: Arc<HandleRegistry>,
    owner: OwnerId,
    raw: NativeHandle,
    disposed: bool,
}

impl HandleLifecycle {
    /// Register `raw` under a fresh owner identity.
    pub fn acquire(registry: &Arc<HandleRegistry>, raw: NativeHandle) -> Result<Self> {
        let owner = registry.new_owner();
        registry.register(owner, raw)?;
        Ok(Self {
            registry: Arc::clone(registry),
            owner,
            raw,
            disposed: false,
        })
    }

    /// The handle, or `InvalidHandle` once disposed.
    pub fn handle(&self) -> Result<NativeHandle> {
        if self.is_invalid() {
            return Err(Error::InvalidHandle { handle: self.raw });
        }
        Ok(self.raw)
    }

    /// The raw value this lifecycle was acquired with, even after disposal.
    /// Used for identity and diagnostics only.
    pub fn raw(&self) -> NativeHandle {
        self.raw
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_invalid(&self) -> bool {
        self.disposed || self.raw.is_null()
    }

    /// Mark disposed and drop the registry entry.
    ///
    /// Returns `true` only on the first call.
    pub(crate) fn retire(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.registry.remove(self.owner);
        true
    }
}

impl Drop for HandleLifecycle {
    fn drop(&mut self) {
        self.retire();
    }
}

impl fmt::Debug for HandleLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleLifecycle")
            .field("owner", &self.owner)
            .field("raw", &self.raw)
            .field("disposed", &self.disposed)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
