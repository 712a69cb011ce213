// ── Platform abstraction layer ────────────────────────────────────────────────
//
// Detects the host OS family, CPU architecture and OS version once per
// process and derives the runtime identifier (RID) used to pick
// platform-specific native assets.
//
// No `unsafe` lives here; all FFI is confined to the `posix` and `win32`
// sub-modules and never leaks outward.  Version probing never fails: an
// unreadable descriptor degrades to an empty version string.

use std::{env, fmt, fs, path::Path, sync::OnceLock};

pub mod os_release;

#[cfg(unix)]
pub(crate) mod posix;
#[cfg(windows)]
pub(crate) mod win32;

pub use os_release::OsVersion;

/// Environment variable that, when set and non-empty, replaces the computed
/// RID verbatim.
pub const RID_OVERRIDE_ENV: &str = "NATIVELIB_RUNTIME_ID";

// ── Family ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Windows,
    Linux,
    MacOS,
    FreeBSD,
    Unknown,
}

impl Family {
    /// The family this binary was compiled for.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOS
        } else if cfg!(target_os = "freebsd") {
            Self::FreeBSD
        } else {
            Self::Unknown
        }
    }

    /// Leading RID token.  Linux uses the distro id when known.
    pub fn rid_token(self) -> &'static str {
        match self {
            Self::Windows => "win",
            Self::Linux => "linux",
            Self::MacOS => "osx",
            Self::FreeBSD => "freebsd",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::MacOS => "macOS",
            Self::FreeBSD => "FreeBSD",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// ── Architecture ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    X86,
    X64,
    Arm,
    Arm64,
    S390x,
    LoongArch64,
    Ppc64le,
    Wasm,
    Unknown,
}

impl Architecture {
    /// The architecture this binary was compiled for.
    pub fn host() -> Self {
        Self::from_target_arch(env::consts::ARCH)
    }

    /// Map a Rust `target_arch` name to an architecture.
    pub fn from_target_arch(arch: &str) -> Self {
        match arch {
            "x86" => Self::X86,
            "x86_64" => Self::X64,
            "arm" => Self::Arm,
            "aarch64" => Self::Arm64,
            "s390x" => Self::S390x,
            "loongarch64" => Self::LoongArch64,
            "powerpc64" if cfg!(target_endian = "little") => Self::Ppc64le,
            "wasm32" | "wasm64" => Self::Wasm,
            _ => Self::Unknown,
        }
    }

    pub fn rid_token(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::S390x => "s390x",
            Self::LoongArch64 => "loongarch64",
            Self::Ppc64le => "ppc64le",
            Self::Wasm => "wasm",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rid_token())
    }
}

// ── PlatformDescriptor ────────────────────────────────────────────────────────

/// Immutable description of the running platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    family: Family,
    architecture: Architecture,
    os_version: String,
    runtime_identifier: String,
}

impl PlatformDescriptor {
    /// Assemble a descriptor from already-probed parts.
    ///
    /// `rid_override`, when `Some` and non-empty, replaces the computed RID
    /// regardless of the other inputs.
    pub fn new(
        family: Family,
        architecture: Architecture,
        version: &OsVersion,
        rid_override: Option<&str>,
    ) -> Self {
        let runtime_identifier = match rid_override.filter(|r| !r.is_empty()) {
            Some(rid) => rid.to_owned(),
            None => runtime_identifier(
                family,
                version.distro_id.as_deref(),
                &version.rid_version,
                architecture,
            ),
        };
        Self {
            family,
            architecture,
            os_version: version.version.clone(),
            runtime_identifier,
        }
    }

    /// Probe the host now, without touching the process-wide cache.
    pub fn probe(rid_override: Option<&str>) -> Self {
        let family = Family::host();
        let version = probe_version(family);
        Self::new(family, Architecture::host(), &version, rid_override)
    }

    /// The same platform with its RID replaced verbatim.
    pub fn with_runtime_identifier(mut self, rid: impl Into<String>) -> Self {
        self.runtime_identifier = rid.into();
        self
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// OS version string; empty when the probe failed.
    pub fn os_version(&self) -> &str {
        &self.os_version
    }

    pub fn runtime_identifier(&self) -> &str {
        &self.runtime_identifier
    }
}

static DETECTED: OnceLock<PlatformDescriptor> = OnceLock::new();

/// Detect the host platform.  Computed once, then cached for the process.
///
/// The RID override environment variable is read on the first call only.
pub fn detect() -> &'static PlatformDescriptor {
    DETECTED.get_or_init(|| {
        let rid_override = env::var(RID_OVERRIDE_ENV).ok();
        let platform = PlatformDescriptor::probe(rid_override.as_deref());
        log::debug!(
            "detected platform {} {} (version {:?}, rid {})",
            platform.family,
            platform.architecture,
            platform.os_version,
            platform.runtime_identifier
        );
        platform
    })
}

// ── RID construction ──────────────────────────────────────────────────────────

/// `"{platform}{version suffix}-{arch}"`.
///
/// Windows appends the version with no separator (`win10-x64`); every other
/// family uses a dot (`ubuntu.22.04-x64`, `osx.13-arm64`).  An empty version
/// yields no suffix at all.
pub fn runtime_identifier(
    family: Family,
    distro_id: Option<&str>,
    rid_version: &str,
    architecture: Architecture,
) -> String {
    let platform = match (family, distro_id) {
        (Family::Linux, Some(id)) if !id.is_empty() => id,
        _ => family.rid_token(),
    };
    let suffix = match (family, rid_version.is_empty()) {
        (_, true) => String::new(),
        (Family::Windows, false) => rid_version.to_owned(),
        (_, false) => format!(".{rid_version}"),
    };
    format!("{platform}{suffix}-{}", architecture.rid_token())
}

// ── Version probes ────────────────────────────────────────────────────────────

const OS_RELEASE: &str = "/etc/os-release";
const REDHAT_RELEASE: &str = "/etc/redhat-release";

fn probe_version(family: Family) -> OsVersion {
    let version = match family {
        Family::Linux => read_linux_version(Path::new(OS_RELEASE), Path::new(REDHAT_RELEASE)),
        #[cfg(unix)]
        Family::MacOS => posix::kernel_release()
            .map(|release| os_release::macos_version(&release))
            .unwrap_or_default(),
        #[cfg(unix)]
        Family::FreeBSD => posix::os_description()
            .map(|description| os_release::freebsd_version(&description))
            .unwrap_or_default(),
        #[cfg(windows)]
        Family::Windows => win32::os_version().unwrap_or_default(),
        _ => OsVersion::default(),
    };

    if version.version.is_empty() {
        log::warn!("could not determine {family} version; RID will carry no version");
    }
    version
}

/// The legacy release file is consulted whenever os-release is missing or
/// carries no `ID`.
fn read_linux_version(os_release_path: &Path, redhat_path: &Path) -> OsVersion {
    let os_release = fs::read_to_string(os_release_path).ok();
    let redhat = match os_release.as_deref().and_then(os_release::parse_os_release) {
        Some(_) => None,
        None => fs::read_to_string(redhat_path).ok(),
    };
    os_release::linux_version(os_release.as_deref(), redhat.as_deref())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
