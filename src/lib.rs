// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32` – Win32 module loader and RTL version FFI
//   • `platform::posix` – dlfcn, uname and sysctl FFI
//   • `NativeAssembly::load_function` – symbol address → typed callable
// Each unsafe block in those places MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! Native library loading and handle lifecycle for GUI toolkit bindings.
//!
//! ```no_run
//! use nativelib::{LibraryNames, LoaderConfig, LoaderContext, NativeAssembly};
//!
//! let ctx = LoaderContext::new(&LoaderConfig::from_env());
//! let gtk = LibraryNames::new()
//!     .windows(["libgtk-3-0.dll"])
//!     .linux(["libgtk-3.so.0"])
//!     .osx(["libgtk-3.0.dylib"]);
//! let lib = NativeAssembly::load_for_platform(&ctx, &gtk)?;
//! let init = unsafe { lib.load_function::<unsafe extern "C" fn(*mut i32, *mut *mut *mut i8)>("gtk_init")? };
//! # let _ = init;
//! # Ok::<(), nativelib::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod loader;
pub mod platform;

#[cfg(test)]
pub(crate) mod testing;

pub use config::LoaderConfig;
pub use context::LoaderContext;
pub use error::{Error, Result};
pub use handle::{Dispose, HandleLifecycle, HandleRegistry, NativeComponent, NativeHandle, ReleaseHandle};
pub use loader::{DependencyManifest, LibraryLoaded, LibraryNames, LoadTargetResolver, LoaderBackend, NativeAssembly};
pub use platform::{detect, Architecture, Family, PlatformDescriptor};
