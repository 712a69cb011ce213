// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in nativelib return `error::Result<T>`.  None of
// these conditions are transient, so nothing is retried internally; callers
// (the GUI layer) treat them as fatal startup failures.

use crate::handle::NativeHandle;

/// Every error that nativelib can produce.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// None of the candidate names resolved to an openable library.
    #[error("unable to load native library; tried {names:?}")]
    LibraryNotFound {
        /// The candidate names exactly as supplied by the caller.
        names: Vec<String>,
    },

    /// A symbol could not be resolved in an already-open library.
    ///
    /// The library stays open and usable for other symbols.
    #[error("entry point `{name}` not found in `{library}`")]
    EntryPointNotFound { library: String, name: String },

    /// The raw handle is already registered to another live component.
    #[error("native handle {handle} is already owned by a live component")]
    DuplicateHandle { handle: NativeHandle },

    /// The handle is null, flagged closed, or its owner has been disposed.
    #[error("invalid native handle {handle}")]
    InvalidHandle { handle: NativeHandle },

    /// The running OS family has no sensible degraded behaviour here.
    #[error("platform `{platform}` is not supported")]
    PlatformNotSupported { platform: String },

    /// A typed binding was requested for a type that is not pointer-sized.
    #[error("`{name}` cannot be bound as a {size}-byte callable")]
    IncompatibleSignature { name: String, size: usize },

    /// A dependency manifest was explicitly requested but could not be parsed.
    #[error("malformed dependency manifest: {0}")]
    Manifest(#[source] serde_json::Error),

    /// A loader configuration file could not be parsed.
    #[error("malformed loader configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// A standard I/O error (reading a manifest or configuration file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
