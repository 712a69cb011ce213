// ── Handle identity registry ──────────────────────────────────────────────────
//
// Maps each live owner to the raw handle it registered, with a parallel index
// from raw value back to owner so that a second owner of the same resource is
// rejected at insertion time.
//
// The registry is an explicit object owned by `LoaderContext` (not a hidden
// global), and all insert/contains/remove operations go through one `Mutex`.
// Library loads are rare, so a single lock is plenty.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use super::NativeHandle;
use crate::error::{Error, Result};

// ── Records ───────────────────────────────────────────────────────────────────

/// Opaque identity of one handle wrapper.  Issued by `HandleRegistry::new_owner`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// One registration: `owner` holds `raw`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandleRecord {
    pub owner: OwnerId,
    pub raw: NativeHandle,
}

#[derive(Default)]
struct Tables {
    by_owner: HashMap<OwnerId, NativeHandle>,
    by_raw: HashMap<NativeHandle, OwnerId>,
}

// ── HandleRegistry ────────────────────────────────────────────────────────────

/// Process-level map enforcing "one live owner per raw handle value".
#[derive(Default)]
pub struct HandleRegistry {
    next_owner: AtomicU64,
    tables: Mutex<Tables>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh owner identity.  Identities are never reused.
    pub fn new_owner(&self) -> OwnerId {
        OwnerId(self.next_owner.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Register `raw` as owned by `owner`.
    ///
    /// Fails with `InvalidHandle` for the null sentinel or when `owner`
    /// already holds a handle, and with `DuplicateHandle` when `raw` is
    /// already held by a live owner.
    pub fn register(&self, owner: OwnerId, raw: NativeHandle) -> Result<()> {
        if raw.is_null() {
            return Err(Error::InvalidHandle { handle: raw });
        }

        let mut tables = self.lock();
        if tables.by_raw.contains_key(&raw) {
            return Err(Error::DuplicateHandle { handle: raw });
        }
        if tables.by_owner.contains_key(&owner) {
            return Err(Error::InvalidHandle { handle: raw });
        }
        tables.by_owner.insert(owner, raw);
        tables.by_raw.insert(raw, owner);
        log::trace!("registered handle {raw:?} to {owner}");
        Ok(())
    }

    /// `true` if some live owner holds `raw`.
    pub fn contains(&self, raw: NativeHandle) -> bool {
        self.lock().by_raw.contains_key(&raw)
    }

    pub fn owner_of(&self, raw: NativeHandle) -> Option<OwnerId> {
        self.lock().by_raw.get(&raw).copied()
    }

    pub fn record(&self, owner: OwnerId) -> Option<HandleRecord> {
        self.lock()
            .by_owner
            .get(&owner)
            .map(|&raw| HandleRecord { owner, raw })
    }

    /// Remove the registration held by `owner` and return its raw value.
    ///
    /// Only the owner's identity can remove its entry; there is no way to
    /// evict another owner's handle by raw value.
    pub fn remove(&self, owner: OwnerId) -> Option<NativeHandle> {
        let mut tables = self.lock();
        let raw = tables.by_owner.remove(&owner)?;
        tables.by_raw.remove(&raw);
        log::trace!("released handle {raw:?} from {owner}");
        Some(raw)
    }

    pub fn len(&self) -> usize {
        self.lock().by_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the two maps out of step
    // (every mutation is a pair of infallible inserts/removes), so a poisoned
    // lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry").field("live", &self.len()).finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    const H1: NativeHandle = NativeHandle::from_raw(0x1000);
    const H2: NativeHandle = NativeHandle::from_raw(0x2000);

    #[test]
    fn register_and_remove() {
        let reg = HandleRegistry::new();
        let a = reg.new_owner();
        reg.register(a, H1).expect("register");

        assert!(reg.contains(H1));
        assert_eq!(reg.owner_of(H1), Some(a));
        assert_eq!(reg.record(a), Some(HandleRecord { owner: a, raw: H1 }));
        assert_eq!(reg.len(), 1);

        assert_eq!(reg.remove(a), Some(H1));
        assert!(!reg.contains(H1));
        assert!(reg.is_empty());
        // Second removal is a no-op.
        assert_eq!(reg.remove(a), None);
    }

    #[test]
    fn null_handle_is_never_registered() {
        let reg = HandleRegistry::new();
        let a = reg.new_owner();
        let err = reg.register(a, NativeHandle::NULL).unwrap_err();
        assert!(matches!(err, Error::InvalidHandle { .. }));
        assert!(reg.is_empty());
    }

    #[test]
    fn second_owner_of_same_raw_value_is_rejected() {
        let reg = HandleRegistry::new();
        let a = reg.new_owner();
        let b = reg.new_owner();
        reg.register(a, H1).expect("first");

        let err = reg.register(b, H1).unwrap_err();
        assert!(matches!(err, Error::DuplicateHandle { handle } if handle == H1));
        // The first registration is untouched.
        assert_eq!(reg.owner_of(H1), Some(a));
        assert_eq!(reg.record(b), None);
    }

    #[test]
    fn owner_cannot_register_twice() {
        let reg = HandleRegistry::new();
        let a = reg.new_owner();
        reg.register(a, H1).expect("first");
        let err = reg.register(a, H2).unwrap_err();
        assert!(matches!(err, Error::InvalidHandle { .. }));
        assert!(!reg.contains(H2));
    }

    #[test]
    fn raw_value_is_reusable_after_removal() {
        let reg = HandleRegistry::new();
        let a = reg.new_owner();
        let b = reg.new_owner();
        reg.register(a, H1).expect("first");
        reg.remove(a);
        reg.register(b, H1).expect("reuse after release");
        assert_eq!(reg.owner_of(H1), Some(b));
    }

    #[test]
    fn concurrent_registration_admits_exactly_one_owner() {
        let reg = Arc::new(HandleRegistry::new());
        let winners: usize = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    let owner = reg.new_owner();
                    reg.register(owner, H1).is_ok()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|t| t.join().expect("thread") as usize)
            .sum();
        assert_eq!(winners, 1);
        assert_eq!(reg.len(), 1);
    }
}
