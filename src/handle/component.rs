// ── NativeComponent<T> ────────────────────────────────────────────────────────
//
// Ties an arbitrary native handle to the disposal protocol.  Wrappers built
// on top (library modules, widgets, drawing contexts) hold a
// `NativeComponent` by composition rather than inheriting from it.
//
// Disposal is two-phase and runs exactly once:
//   1. managed  – adopted children are disposed, newest first; they may still
//                 observe this component's handle as valid
//   2. unmanaged – `ReleaseHandle::release` frees the OS resource, then the
//                 registry entry is removed

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use super::{Dispose, HandleLifecycle, HandleRegistry, NativeHandle};
use crate::error::{Error, Result};

// ── Release strategy ──────────────────────────────────────────────────────────

/// How a particular kind of native handle is freed.
pub trait ReleaseHandle {
    /// Free the OS resource behind `handle`.  Returns whether it succeeded.
    fn release(&mut self, handle: NativeHandle) -> bool;

    /// Platform-specific closed/invalid values beyond the null sentinel.
    fn is_invalid_value(&self, handle: NativeHandle) -> bool {
        handle.is_null()
    }
}

/// Adapts a closure into a `ReleaseHandle`.
pub struct ReleaseFn<F>(pub F);

impl<F> ReleaseHandle for ReleaseFn<F>
where
    F: FnMut(NativeHandle) -> bool,
{
    fn release(&mut self, handle: NativeHandle) -> bool {
        (self.0)(handle)
    }
}

// ── NativeComponent ───────────────────────────────────────────────────────────

/// An owned native handle with exactly-once, two-phase release.
///
/// Equality and hashing follow the raw handle value, so "same native
/// resource" means "same key" in maps.  `Drop` calls `dispose`.
pub struct NativeComponent<T: ReleaseHandle> {
    lifecycle: HandleLifecycle,
    release: T,
    managed: Vec<Box<dyn Dispose + Send>>,
}

impl<T: ReleaseHandle> NativeComponent<T> {
    /// Take ownership of `raw`.
    ///
    /// Fails with `InvalidHandle` when `raw` is null or flagged by `release`,
    /// and with `DuplicateHandle` when another live component owns it.  On
    /// failure nothing is registered and `release` is not invoked: the caller
    /// still owns the raw resource.
    pub fn new(registry: &Arc<HandleRegistry>, raw: NativeHandle, release: T) -> Result<Self> {
        if release.is_invalid_value(raw) {
            return Err(Error::InvalidHandle { handle: raw });
        }
        let lifecycle = HandleLifecycle::acquire(registry, raw)?;
        Ok(Self {
            lifecycle,
            release,
            managed: Vec::new(),
        })
    }

    /// The live handle.  `InvalidHandle` after disposal.
    pub fn handle(&self) -> Result<NativeHandle> {
        self.lifecycle.handle()
    }

    /// The raw value this component was created with (valid or not).
    pub fn raw(&self) -> NativeHandle {
        self.lifecycle.raw()
    }

    pub fn is_invalid(&self) -> bool {
        self.lifecycle.is_invalid()
    }

    pub fn lifecycle(&self) -> &HandleLifecycle {
        &self.lifecycle
    }

    pub fn releaser(&self) -> &T {
        &self.release
    }

    /// Compose a managed child whose disposal precedes this component's
    /// unmanaged release.
    pub fn adopt<D>(&mut self, child: D) -> Result<()>
    where
        D: Dispose + Send + 'static,
    {
        self.handle()?;
        self.managed.push(Box::new(child));
        Ok(())
    }
}

impl<T: ReleaseHandle> Dispose for NativeComponent<T> {
    fn dispose(&mut self) {
        if self.lifecycle.is_disposed() {
            return;
        }

        // Phase 1: managed.
        while let Some(mut child) = self.managed.pop() {
            child.dispose();
        }

        // Phase 2: unmanaged.
        let raw = self.lifecycle.raw();
        if !self.release.release(raw) {
            log::warn!("native release of handle {raw:?} reported failure");
        }
        self.lifecycle.retire();
    }

    fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }
}

impl<T: ReleaseHandle> Drop for NativeComponent<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: ReleaseHandle> PartialEq for NativeComponent<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl<T: ReleaseHandle> Eq for NativeComponent<T> {}

impl<T: ReleaseHandle> Hash for NativeComponent<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw().hash(state);
    }
}

impl<T: ReleaseHandle> fmt::Display for NativeComponent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw(), f)
    }
}

impl<T: ReleaseHandle> fmt::Debug for NativeComponent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeComponent")
            .field("lifecycle", &self.lifecycle)
            .field("managed", &self.managed.len())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use super::*;

    const H1: NativeHandle = NativeHandle::from_raw(0x10);
    const H2: NativeHandle = NativeHandle::from_raw(0x20);

    fn counting(counter: &Arc<AtomicUsize>) -> ReleaseFn<impl FnMut(NativeHandle) -> bool> {
        let counter = Arc::clone(counter);
        ReleaseFn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    /// Child that records its disposal and whether the registry still held
    /// the parent's handle at that moment.
    struct Probe {
        registry: Arc<HandleRegistry>,
        parent: NativeHandle,
        events: Arc<Mutex<Vec<String>>>,
        disposed: bool,
    }

    impl Dispose for Probe {
        fn dispose(&mut self) {
            let live = self.registry.contains(self.parent);
            self.events
                .lock()
                .expect("log")
                .push(format!("child(parent live = {live})"));
            self.disposed = true;
        }

        fn is_disposed(&self) -> bool {
            self.disposed
        }
    }

    #[test]
    fn dispose_is_idempotent_and_releases_once() {
        let reg = Arc::new(HandleRegistry::new());
        let closes = Arc::new(AtomicUsize::new(0));
        let mut c = NativeComponent::new(&reg, H1, counting(&closes)).expect("new");
        assert!(!c.is_invalid());

        c.dispose();
        c.dispose();
        drop(c);

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn drop_releases_live_component() {
        let reg = Arc::new(HandleRegistry::new());
        let closes = Arc::new(AtomicUsize::new(0));
        {
            let _c = NativeComponent::new(&reg, H1, counting(&closes)).expect("new");
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!reg.contains(H1));
    }

    #[test]
    fn disposed_component_rejects_handle_access() {
        let reg = Arc::new(HandleRegistry::new());
        let closes = Arc::new(AtomicUsize::new(0));
        let mut c = NativeComponent::new(&reg, H1, counting(&closes)).expect("new");
        c.dispose();

        assert!(c.is_invalid());
        assert!(matches!(c.handle(), Err(Error::InvalidHandle { handle }) if handle == H1));
        let probe = Probe {
            registry: Arc::clone(&reg),
            parent: H1,
            events: Arc::default(),
            disposed: false,
        };
        assert!(matches!(c.adopt(probe), Err(Error::InvalidHandle { .. })));
    }

    #[test]
    fn duplicate_wrap_fails_and_first_stays_usable() {
        let reg = Arc::new(HandleRegistry::new());
        let closes = Arc::new(AtomicUsize::new(0));
        let first = NativeComponent::new(&reg, H1, counting(&closes)).expect("first");

        let err = NativeComponent::new(&reg, H1, counting(&closes)).unwrap_err();
        assert!(matches!(err, Error::DuplicateHandle { handle } if handle == H1));

        // The failed wrapper never owned the resource, so nothing was closed.
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        assert_eq!(first.handle().expect("still live"), H1);
    }

    #[test]
    fn null_and_flagged_values_are_rejected() {
        struct MinusOneIsClosed;
        impl ReleaseHandle for MinusOneIsClosed {
            fn release(&mut self, _: NativeHandle) -> bool {
                true
            }
            fn is_invalid_value(&self, handle: NativeHandle) -> bool {
                handle.is_null() || handle.as_raw() == usize::MAX
            }
        }

        let reg = Arc::new(HandleRegistry::new());
        let null = NativeComponent::new(&reg, NativeHandle::NULL, MinusOneIsClosed);
        assert!(matches!(null, Err(Error::InvalidHandle { .. })));
        let closed = NativeComponent::new(&reg, NativeHandle::from_raw(usize::MAX), MinusOneIsClosed);
        assert!(matches!(closed, Err(Error::InvalidHandle { .. })));
        assert!(reg.is_empty());
    }

    #[test]
    fn managed_children_dispose_before_unmanaged_release() {
        let reg = Arc::new(HandleRegistry::new());
        let events: Arc<Mutex<Vec<String>>> = Arc::default();
        let release_events = Arc::clone(&events);
        let mut c = NativeComponent::new(
            &reg,
            H1,
            ReleaseFn(move |h: NativeHandle| {
                release_events.lock().expect("log").push(format!("release {h}"));
                true
            }),
        )
        .expect("new");

        c.adopt(Probe {
            registry: Arc::clone(&reg),
            parent: H1,
            events: Arc::clone(&events),
            disposed: false,
        })
        .expect("adopt");
        c.dispose();

        let seen = events.lock().expect("events").clone();
        assert_eq!(seen, vec!["child(parent live = true)".to_owned(), "release 16".to_owned()]);
    }

    fn keep(_: NativeHandle) -> bool {
        true
    }

    type Plain = NativeComponent<ReleaseFn<fn(NativeHandle) -> bool>>;

    fn plain(reg: &Arc<HandleRegistry>, raw: NativeHandle) -> Plain {
        NativeComponent::new(reg, raw, ReleaseFn(keep as fn(NativeHandle) -> bool)).expect("new")
    }

    #[test]
    fn equality_and_hash_follow_raw_value() {
        let reg = Arc::new(HandleRegistry::new());
        let other_reg = Arc::new(HandleRegistry::new());
        let a = plain(&reg, H1);
        let b = plain(&reg, H2);
        let mut same = plain(&other_reg, H1);
        assert_ne!(a, b);
        assert_eq!(a, same);

        same.dispose();
        // Identity survives disposal; only validity changes.
        assert_eq!(a, same);
        assert_eq!(a.to_string(), "16");

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&same));
        assert!(!set.contains(&b));
    }
}
