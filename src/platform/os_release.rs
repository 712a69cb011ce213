// ── OS version descriptors ────────────────────────────────────────────────────
//
// Pure parsing of whatever each OS reports about its version.  No I/O and no
// FFI here, so every rule is testable on any host; the probes that fetch the
// raw strings live in `posix` / `win32` and in `platform::probe_version`.

/// Version data extracted from one OS probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsVersion {
    /// Human-readable version, e.g. `"22.04"`, `"10.0.19045"`, `"13.5"`.
    pub version: String,
    /// The version component used inside a RID (`"10"` in `win10-x64`,
    /// `"22.04"` in `ubuntu.22.04-x64`).  Empty when unknown.
    pub rid_version: String,
    /// Linux distribution id (`ID=` in os-release), e.g. `"ubuntu"`.
    pub distro_id: Option<String>,
}

// ── Linux ─────────────────────────────────────────────────────────────────────

/// Parse an `os-release` file, returning `(ID, VERSION_ID)`.
///
/// Blank lines and `#` comments are skipped; values may be single- or
/// double-quoted.  `ID` is required, `VERSION_ID` is optional (rolling
/// distributions such as Arch omit it).
pub fn parse_os_release(contents: &str) -> Option<(String, Option<String>)> {
    let mut id = None;
    let mut version_id = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(value.trim());
        match key.trim() {
            "ID" if !value.is_empty() => id = Some(value.to_ascii_lowercase()),
            "VERSION_ID" if !value.is_empty() => version_id = Some(value.to_owned()),
            _ => {}
        }
    }

    id.map(|id| (id, version_id))
}

/// Parse the legacy `/etc/redhat-release` one-liner, e.g.
/// `"CentOS release 6.10 (Final)"`, into `("rhel", "6")`.
///
/// Only the major version is kept; that is what RHEL-family RIDs use.
pub fn parse_redhat_release(contents: &str) -> Option<(String, String)> {
    let line = contents.lines().next()?.trim();
    let mut words = line.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case("release"))?;
    let version = words.next()?;
    let major = leading_digits(version);
    if major.is_empty() {
        return None;
    }
    Some(("rhel".to_owned(), major.to_owned()))
}

pub fn linux_version(os_release: Option<&str>, redhat_release: Option<&str>) -> OsVersion {
    if let Some((id, version_id)) = os_release.and_then(parse_os_release) {
        let version = version_id.unwrap_or_default();
        return OsVersion {
            rid_version: version.clone(),
            version,
            distro_id: Some(id),
        };
    }
    if let Some((id, major)) = redhat_release.and_then(parse_redhat_release) {
        return OsVersion {
            rid_version: major.clone(),
            version: major,
            distro_id: Some(id),
        };
    }
    OsVersion::default()
}

// ── macOS ─────────────────────────────────────────────────────────────────────

/// Map a Darwin kernel release (`kern.osrelease`, e.g. `"19.6.0"`) to the
/// marketing version.
///
/// Kernels 5 through 19 are Mac OS X 10.1 through 10.15 (`10.{major - 4}`);
/// from kernel 20 (Big Sur) the marketing major is `major - 9`.
pub fn macos_version(kernel_release: &str) -> OsVersion {
    let Ok(major) = leading_digits(kernel_release.trim()).parse::<u32>() else {
        return OsVersion::default();
    };
    let version = match major {
        5..=19 => format!("10.{}", major - 4),
        20.. => format!("{}", major - 9),
        _ => return OsVersion::default(),
    };
    OsVersion {
        rid_version: version.clone(),
        version,
        distro_id: None,
    }
}

// ── FreeBSD ───────────────────────────────────────────────────────────────────

/// Extract the major version from an OS description such as
/// `"FreeBSD 13.2-RELEASE-p4"`: the integer prefix of the second token.
pub fn freebsd_version(description: &str) -> OsVersion {
    let major = description
        .split_whitespace()
        .nth(1)
        .map(leading_digits)
        .unwrap_or_default();
    OsVersion {
        version: major.to_owned(),
        rid_version: major.to_owned(),
        distro_id: None,
    }
}

// ── Windows ───────────────────────────────────────────────────────────────────

/// Build the version from an RTL version block (major / minor / build).
///
/// RIDs use the legacy product number: 6.1 → `7`, 6.2 → `8`, 6.3 → `81`,
/// 10.x (including Windows 11, which still reports 10.0) → `10`.
pub fn windows_version(major: u32, minor: u32, build: u32) -> OsVersion {
    let rid_version = match (major, minor) {
        (6, 1) => "7",
        (6, 2) => "8",
        (6, 3) => "81",
        (10.., _) => "10",
        _ => "",
    };
    OsVersion {
        version: format!("{major}.{minor}.{build}"),
        rid_version: rid_version.to_owned(),
        distro_id: None,
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    value
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU: &str = r#"
PRETTY_NAME="Ubuntu 22.04.3 LTS"
NAME="Ubuntu"
# comment line
VERSION_ID="22.04"
ID=ubuntu
ID_LIKE=debian
"#;

    #[test]
    fn os_release_reads_id_and_version() {
        assert_eq!(
            parse_os_release(UBUNTU),
            Some(("ubuntu".to_owned(), Some("22.04".to_owned())))
        );
    }

    #[test]
    fn os_release_without_version_id() {
        let arch = "NAME=\"Arch Linux\"\nID=arch\nBUILD_ID=rolling\n";
        assert_eq!(parse_os_release(arch), Some(("arch".to_owned(), None)));
        let v = linux_version(Some(arch), None);
        assert_eq!(v.distro_id.as_deref(), Some("arch"));
        assert_eq!(v.rid_version, "");
    }

    #[test]
    fn os_release_single_quotes() {
        let alpine = "ID='alpine'\nVERSION_ID='3.18.4'\n";
        assert_eq!(
            parse_os_release(alpine),
            Some(("alpine".to_owned(), Some("3.18.4".to_owned())))
        );
    }

    #[test]
    fn os_release_without_id_falls_back_to_redhat() {
        let v = linux_version(Some("NAME=foo\n"), Some("CentOS release 6.10 (Final)\n"));
        assert_eq!(v.distro_id.as_deref(), Some("rhel"));
        assert_eq!(v.rid_version, "6");
    }

    #[test]
    fn redhat_release_rejects_garbage() {
        assert_eq!(parse_redhat_release("nothing to see"), None);
        assert_eq!(parse_redhat_release("Foo release beta"), None);
        assert_eq!(parse_redhat_release(""), None);
    }

    #[test]
    fn linux_with_no_descriptor_is_empty() {
        assert_eq!(linux_version(None, None), OsVersion::default());
    }

    #[test]
    fn macos_kernel_mapping() {
        assert_eq!(macos_version("5.0.0").version, "10.1");
        assert_eq!(macos_version("19.6.0").version, "10.15");
        assert_eq!(macos_version("20.1.0").version, "11");
        assert_eq!(macos_version("22.6.0").rid_version, "13");
        assert_eq!(macos_version("4.0"), OsVersion::default());
        assert_eq!(macos_version("garbage"), OsVersion::default());
    }

    #[test]
    fn freebsd_second_token_prefix() {
        assert_eq!(freebsd_version("FreeBSD 13.2-RELEASE-p4").rid_version, "13");
        assert_eq!(freebsd_version("FreeBSD").rid_version, "");
        assert_eq!(freebsd_version("FreeBSD CURRENT").rid_version, "");
    }

    #[test]
    fn windows_legacy_product_numbers() {
        assert_eq!(windows_version(6, 1, 7601).rid_version, "7");
        assert_eq!(windows_version(6, 2, 9200).rid_version, "8");
        assert_eq!(windows_version(6, 3, 9600).rid_version, "81");
        let w11 = windows_version(10, 0, 22631);
        assert_eq!(w11.rid_version, "10");
        assert_eq!(w11.version, "10.0.22631");
        assert_eq!(windows_version(5, 1, 2600).rid_version, "");
    }
}
