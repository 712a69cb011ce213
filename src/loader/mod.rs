// ── Native library loading ────────────────────────────────────────────────────
//
//   names     – per-OS candidate names for one logical library
//   resolver  – candidate name → ordered paths (bare, app-local, manifest)
//   manifest  – deps.json native assets and RID fallback graph
//   backend   – OS loader primitives, one implementation per family
//   assembly  – `NativeAssembly`: selection, ownership, symbol binding

pub mod assembly;
pub mod backend;
pub mod manifest;
pub mod names;
pub mod resolver;

pub use assembly::{LibraryLoaded, NativeAssembly};
pub use backend::{backend_for, LibraryRelease, LoaderBackend, UnsupportedBackend};
pub use manifest::{DependencyManifest, NativeAsset};
pub use names::LibraryNames;
pub use resolver::{guess_general_rid, LoadTargetResolver};

#[cfg(unix)]
pub use backend::PosixBackend;
#[cfg(windows)]
pub use backend::Win32Backend;
