// ── Win32 platform implementation ─────────────────────────────────────────────
//
// This is one of exactly two modules in the codebase where `unsafe` code is
// permitted (the other is `platform::posix`).  Every `unsafe` block MUST
// carry a `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

use std::ffi::CString;

use windows::{
    core::{PCSTR, PCWSTR},
    Wdk::System::SystemServices::RtlGetVersion,
    Win32::{
        Foundation::HMODULE,
        System::{
            LibraryLoader::{FreeLibrary, GetProcAddress, LoadLibraryW},
            SystemInformation::OSVERSIONINFOW,
        },
    },
};

use super::os_release::{self, OsVersion};
use crate::handle::NativeHandle;

// ── Module loader ─────────────────────────────────────────────────────────────

/// `LoadLibraryW(path)`.  Null on failure.
pub(crate) fn open_library(path: &str) -> NativeHandle {
    let wide: Vec<u16> = path.encode_utf16().chain(std::iter::once(0)).collect();
    // SAFETY: wide is a valid null-terminated UTF-16 string that outlives the
    // call.  LoadLibraryW applies the standard DLL search order to bare names.
    match unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) } {
        Ok(module) => NativeHandle::from_ptr(module.0),
        Err(e) => {
            log::debug!("LoadLibraryW({path:?}) failed: {e}");
            NativeHandle::NULL
        }
    }
}

/// `GetProcAddress(handle, name)`.  Null when the export is absent.
pub(crate) fn resolve_symbol(handle: NativeHandle, name: &str) -> NativeHandle {
    if handle.is_null() {
        return NativeHandle::NULL;
    }
    let Ok(c_name) = CString::new(name) else {
        return NativeHandle::NULL;
    };
    // SAFETY: handle came from a successful LoadLibraryW and has not been
    // freed (NativeComponent rejects disposed handles); c_name is a
    // null-terminated ANSI string that outlives the call.
    let proc = unsafe { GetProcAddress(HMODULE(handle.as_ptr()), PCSTR(c_name.as_ptr().cast())) };
    proc.map_or(NativeHandle::NULL, |f| NativeHandle::from_raw(f as usize))
}

/// `FreeLibrary(handle)`.  Freeing the null handle is a successful no-op.
pub(crate) fn close_library(handle: NativeHandle) -> bool {
    if handle.is_null() {
        return true;
    }
    // SAFETY: handle came from a successful LoadLibraryW; NativeComponent
    // calls this at most once per registration.
    match unsafe { FreeLibrary(HMODULE(handle.as_ptr())) } {
        Ok(()) => true,
        Err(e) => {
            log::debug!("FreeLibrary({handle:?}) failed: {e}");
            false
        }
    }
}

// ── OS version ────────────────────────────────────────────────────────────────

/// Read the real OS version through `RtlGetVersion`.
///
/// Unlike `GetVersionExW`, the RTL call is not subject to manifest-based
/// version lies, so Windows 10/11 report 10.0 even without a manifest.
pub(crate) fn os_version() -> Option<OsVersion> {
    let mut info = OSVERSIONINFOW {
        dwOSVersionInfoSize: std::mem::size_of::<OSVERSIONINFOW>() as u32,
        ..Default::default()
    };
    // SAFETY: info is a writable OSVERSIONINFOW with its size field set, as
    // the RTL version API requires.
    let status = unsafe { RtlGetVersion(&mut info) };
    if status.0 < 0 {
        log::warn!("RtlGetVersion failed (status {:#010x})", status.0 as u32);
        return None;
    }
    Some(os_release::windows_version(
        info.dwMajorVersion,
        info.dwMinorVersion,
        info.dwBuildNumber,
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
