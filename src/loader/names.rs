// ── Per-platform library names ────────────────────────────────────────────────
//
// A native dependency usually ships under a different file name on each OS
// (`libgtk-3-0.dll`, `libgtk-3.so.0`, `libgtk-3.0.dylib`).  Binding layers
// declare all of them once and let the running family pick.

use crate::{
    error::{Error, Result},
    platform::Family,
};

/// Candidate names for one logical library, per OS family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryNames {
    pub windows: Vec<String>,
    pub linux: Vec<String>,
    pub osx: Vec<String>,
    pub freebsd: Vec<String>,
}

impl LibraryNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn windows<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.windows = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn linux<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.linux = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn osx<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.osx = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn freebsd<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.freebsd = names.into_iter().map(Into::into).collect();
        self
    }

    /// The names to try on `family`.
    ///
    /// `PlatformNotSupported` for `Unknown`, or for a family with no names:
    /// there is no asset to fall back to.
    pub fn for_family(&self, family: Family) -> Result<&[String]> {
        let names: &[String] = match family {
            Family::Windows => &self.windows,
            Family::Linux => &self.linux,
            Family::MacOS => &self.osx,
            Family::FreeBSD => &self.freebsd,
            Family::Unknown => &[],
        };
        if names.is_empty() {
            return Err(Error::PlatformNotSupported {
                platform: family.to_string(),
            });
        }
        Ok(names)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
