// ── NativeAssembly ────────────────────────────────────────────────────────────
//
// The public loader.  Walks an ordered list of candidate names, opens the
// first one that resolves, owns the module handle through a
// `NativeComponent`, and hands out function pointers.
//
// Selection rules:
//   • an absolute candidate is opened as-is;
//   • any other candidate is expanded by `LoadTargetResolver`; expansions
//     that are rooted but missing on disk are skipped;
//   • within one candidate the LAST successful expansion wins (the
//     manifest-resolved path, which comes later, supersedes a bare-name hit)
//     and superseded handles are closed immediately;
//   • across candidates the FIRST candidate with any success wins.

use std::{fmt, mem, path::Path, sync::Arc};

use super::{
    backend::{LibraryRelease, LoaderBackend},
    names::LibraryNames,
};
use crate::{
    context::LoaderContext,
    error::{Error, Result},
    handle::{Dispose, NativeComponent, NativeHandle},
};

/// Published once per successful `NativeAssembly::load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryLoaded {
    /// The candidate name that matched.
    pub name: String,
    /// The exact path handed to the OS loader.
    pub path: String,
    pub handle: NativeHandle,
}

/// A loaded native library.
///
/// Dropping it (or calling `dispose`) closes the module handle exactly once.
pub struct NativeAssembly {
    name: String,
    path: String,
    backend: Arc<dyn LoaderBackend>,
    component: NativeComponent<LibraryRelease>,
}

impl NativeAssembly {
    /// Load the first of `candidates` that resolves to an openable library.
    ///
    /// Fails with `LibraryNotFound` carrying exactly `candidates` when none
    /// does, or with `DuplicateHandle` when the resolved module is already
    /// owned by another live `NativeAssembly` in the same context.
    pub fn load<S: AsRef<str>>(ctx: &LoaderContext, candidates: &[S]) -> Result<Self> {
        let backend = ctx.backend();

        for candidate in candidates {
            let candidate: &str = candidate.as_ref();
            let Some((path, handle)) = open_candidate(ctx, candidate) else {
                continue;
            };

            let component =
                match NativeComponent::new(ctx.registry(), handle, LibraryRelease::new(backend)) {
                    Ok(component) => component,
                    Err(e) => {
                        // The registry refused ownership, so the reference we
                        // just took on the module is still ours to drop.
                        backend.close_library(handle);
                        return Err(e);
                    }
                };

            log::info!("loaded native library {candidate} from {path} ({handle:?})");
            let assembly = Self {
                name: candidate.to_owned(),
                path,
                backend: Arc::clone(backend),
                component,
            };
            ctx.publish(&LibraryLoaded {
                name: assembly.name.clone(),
                path: assembly.path.clone(),
                handle,
            });
            return Ok(assembly);
        }

        Err(Error::LibraryNotFound {
            names: candidates.iter().map(|c| c.as_ref().to_owned()).collect(),
        })
    }

    /// Load using the names declared for the running OS family.
    ///
    /// `PlatformNotSupported` when `names` has nothing for this family.
    pub fn load_for_platform(ctx: &LoaderContext, names: &LibraryNames) -> Result<Self> {
        let candidates = names.for_family(ctx.platform().family())?;
        Self::load(ctx, candidates)
    }

    /// Resolve `name` to a non-null address.
    ///
    /// `EntryPointNotFound` when the symbol is absent; the library stays
    /// open.  `InvalidHandle` once the assembly has been disposed.
    pub fn load_function_pointer(&self, name: &str) -> Result<NativeHandle> {
        let handle = self.component.handle()?;
        let symbol = self.backend.resolve_symbol(handle, name);
        if symbol.is_null() {
            return Err(Error::EntryPointNotFound {
                library: self.name.clone(),
                name: name.to_owned(),
            });
        }
        Ok(symbol)
    }

    /// Resolve `name` and reinterpret it as the callable type `F`, typically
    /// an `unsafe extern "C" fn(..) -> ..`.
    ///
    /// # Safety
    ///
    /// `F` must match the exported symbol's real signature and calling
    /// convention, and the returned callable must not be invoked after this
    /// assembly has been disposed.
    #[allow(unsafe_code)]
    pub unsafe fn load_function<F: Copy>(&self, name: &str) -> Result<F> {
        if mem::size_of::<F>() != mem::size_of::<usize>() {
            return Err(Error::IncompatibleSignature {
                name: name.to_owned(),
                size: mem::size_of::<F>(),
            });
        }
        let address = self.load_function_pointer(name)?.as_raw();
        // SAFETY: F is pointer-sized (checked above) and the caller guarantees
        // it is a function pointer type matching the symbol; address is non-null.
        Ok(unsafe { mem::transmute_copy::<usize, F>(&address) })
    }

    /// Candidate name that matched.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path the OS loader opened.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The module handle.  `InvalidHandle` once disposed.
    pub fn handle(&self) -> Result<NativeHandle> {
        self.component.handle()
    }

    pub fn is_invalid(&self) -> bool {
        self.component.is_invalid()
    }

    pub fn component(&self) -> &NativeComponent<LibraryRelease> {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut NativeComponent<LibraryRelease> {
        &mut self.component
    }
}

impl Dispose for NativeAssembly {
    fn dispose(&mut self) {
        if !self.component.is_disposed() {
            log::debug!("unloading native library {}", self.name);
        }
        self.component.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.component.is_disposed()
    }
}

impl fmt::Debug for NativeAssembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeAssembly")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("component", &self.component)
            .finish()
    }
}

// ── Candidate expansion ───────────────────────────────────────────────────────

fn open_candidate(ctx: &LoaderContext, candidate: &str) -> Option<(String, NativeHandle)> {
    let backend = ctx.backend();

    if Path::new(candidate).is_absolute() {
        log::debug!("trying {candidate}");
        let handle = backend.open_library(candidate);
        return (!handle.is_null()).then(|| (candidate.to_owned(), handle));
    }

    let mut found: Option<(String, NativeHandle)> = None;
    for path in ctx.resolver().enumerate(candidate) {
        let p = Path::new(&path);
        if p.has_root() && !p.exists() {
            continue;
        }
        log::debug!("trying {path}");
        let handle = backend.open_library(&path);
        if handle.is_null() {
            continue;
        }
        if let Some((previous, old)) = found.replace((path, handle)) {
            log::debug!("{previous} superseded by a later match for {candidate}");
            backend.close_library(old);
        }
    }
    found
}

// ── Tests ─────────────────────────────────────────────────────────────────────
