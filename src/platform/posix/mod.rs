// ── POSIX platform implementation ─────────────────────────────────────────────
//
// Linux, macOS and FreeBSD share the `dlfcn.h` loader and `uname`.  This is
// one of exactly two modules where `unsafe` code is permitted (the other is
// `platform::win32`).  Every `unsafe` block MUST carry a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::ffi::{CStr, CString};

use crate::handle::NativeHandle;

// ── Dynamic loader ────────────────────────────────────────────────────────────

/// `dlopen(path, RTLD_NOW)`.  Null on failure.
pub(crate) fn open_library(path: &str) -> NativeHandle {
    let Ok(c_path) = CString::new(path) else {
        return NativeHandle::NULL;
    };
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call.
    // RTLD_NOW binds every symbol immediately so failures surface here rather
    // than on first call through a function pointer.
    let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW) };
    if handle.is_null() {
        log::debug!("dlopen({path:?}) failed: {}", last_error());
    }
    NativeHandle::from_ptr(handle)
}

/// `dlsym(handle, name)`.  Null when the symbol is absent.
pub(crate) fn resolve_symbol(handle: NativeHandle, name: &str) -> NativeHandle {
    if handle.is_null() {
        return NativeHandle::NULL;
    }
    let Ok(c_name) = CString::new(name) else {
        return NativeHandle::NULL;
    };
    // SAFETY: handle came from a successful dlopen and has not been closed
    // (callers go through NativeComponent, which rejects disposed handles);
    // c_name is NUL-terminated and outlives the call.
    let symbol = unsafe { libc::dlsym(handle.as_ptr(), c_name.as_ptr()) };
    NativeHandle::from_ptr(symbol)
}

/// `dlclose(handle)`.  Closing the null handle is a successful no-op.
pub(crate) fn close_library(handle: NativeHandle) -> bool {
    if handle.is_null() {
        return true;
    }
    // SAFETY: handle came from a successful dlopen; NativeComponent calls this
    // at most once per registration.
    let rc = unsafe { libc::dlclose(handle.as_ptr()) };
    if rc != 0 {
        log::debug!("dlclose({handle:?}) failed: {}", last_error());
    }
    rc == 0
}

fn last_error() -> String {
    // SAFETY: dlerror returns either null or a pointer to a thread-local,
    // NUL-terminated message valid until the next dl* call on this thread.
    unsafe {
        let msg = libc::dlerror();
        if msg.is_null() {
            "unknown error".to_owned()
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    }
}

// ── OS identity ───────────────────────────────────────────────────────────────

fn uname() -> Option<libc::utsname> {
    // SAFETY: utsname is plain old data; all-zero is a valid bit pattern and
    // uname fills every field on success.
    let mut info: libc::utsname = unsafe { std::mem::zeroed() };
    // SAFETY: info is a valid, writable utsname.
    if unsafe { libc::uname(&mut info) } != 0 {
        return None;
    }
    Some(info)
}

fn field(chars: &[libc::c_char]) -> String {
    // SAFETY: uname NUL-terminates every field within its fixed-size array.
    unsafe { CStr::from_ptr(chars.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Free-form OS description: `"{sysname} {release}"`, e.g.
/// `"FreeBSD 13.2-RELEASE-p4"`.
pub(crate) fn os_description() -> Option<String> {
    let info = uname()?;
    Some(format!("{} {}", field(&info.sysname), field(&info.release)))
}

/// Kernel release string (`kern.osrelease`), e.g. `"22.6.0"` on macOS.
#[cfg(target_os = "macos")]
pub(crate) fn kernel_release() -> Option<String> {
    let mut buf = [0u8; 256];
    let mut len = buf.len();
    // SAFETY: the name is a NUL-terminated literal; buf/len describe a
    // writable buffer and sysctlbyname writes at most `len` bytes.
    let rc = unsafe {
        libc::sysctlbyname(
            c"kern.osrelease".as_ptr(),
            buf.as_mut_ptr().cast(),
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return None;
    }
    let release = CStr::from_bytes_until_nul(&buf[..len.min(buf.len())]).ok()?;
    Some(release.to_string_lossy().into_owned())
}

/// Kernel release string from `uname` on non-Darwin systems.
#[cfg(not(target_os = "macos"))]
pub(crate) fn kernel_release() -> Option<String> {
    uname().map(|info| field(&info.release))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
