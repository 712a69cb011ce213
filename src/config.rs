// ── Loader configuration ──────────────────────────────────────────────────────
//
// Where to look for native libraries.  Built from environment variables,
// from a JSON file, or by hand; every field is optional and missing fields
// fall back to defaults derived from the running executable.
// No `unsafe` here; pure safe Rust over serde_json.

use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ── Environment ───────────────────────────────────────────────────────────────

/// Path of a `deps.json` dependency manifest.
pub const DEPS_FILE_ENV: &str = "NATIVELIB_DEPS_FILE";

/// Package probe roots, separated like `PATH`.
pub const PROBE_PATHS_ENV: &str = "NATIVELIB_PROBE_PATHS";

/// Suffix of the manifest that sits next to the executable by default.
const DEPS_SUFFIX: &str = ".deps.json";

// ── LoaderConfig ──────────────────────────────────────────────────────────────

/// Search configuration for a `LoaderContext`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Application base directory.  Defaults to the executable's directory.
    pub base_dir: Option<PathBuf>,
    /// Dependency manifest.  Defaults to `<base dir>/<exe stem>.deps.json`
    /// when that file exists.
    pub deps_file: Option<PathBuf>,
    /// Roots under which package-relative assets are probed.
    pub probe_paths: Vec<PathBuf>,
    /// Replaces the detected RID when set.
    pub runtime_identifier: Option<String>,
}

impl LoaderConfig {
    /// Read `NATIVELIB_DEPS_FILE` and `NATIVELIB_PROBE_PATHS`.
    ///
    /// The RID override variable is handled by `platform::detect`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var_os(key))
    }

    /// Same as `from_env`, over an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let deps_file = lookup(DEPS_FILE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let probe_paths = lookup(PROBE_PATHS_ENV)
            .map(|v| env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();
        Self {
            deps_file,
            probe_paths,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(Error::Config)
    }

    /// Fields set in `other` win over fields set in `self`.
    pub fn merge(mut self, other: LoaderConfig) -> Self {
        if other.base_dir.is_some() {
            self.base_dir = other.base_dir;
        }
        if other.deps_file.is_some() {
            self.deps_file = other.deps_file;
        }
        if other.runtime_identifier.is_some() {
            self.runtime_identifier = other.runtime_identifier;
        }
        self.probe_paths.extend(other.probe_paths);
        self
    }

    /// `base_dir`, or the directory containing the running executable.
    pub fn resolved_base_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.base_dir {
            return Some(dir.clone());
        }
        let exe = env::current_exe().ok()?;
        exe.parent().map(Path::to_path_buf)
    }

    /// `deps_file`, or `<base dir>/<exe stem>.deps.json` if it exists.
    pub fn resolved_deps_file(&self) -> Option<PathBuf> {
        if let Some(file) = &self.deps_file {
            return Some(file.clone());
        }
        let stem = env::current_exe().ok()?.file_stem()?.to_os_string();
        let mut name = stem;
        name.push(DEPS_SUFFIX);
        let candidate = self.resolved_base_dir()?.join(name);
        candidate.is_file().then_some(candidate)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, OsString)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> =
            pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_reads_deps_file_and_probe_paths() {
        let probes = env::join_paths([Path::new("/pkgs/a"), Path::new("/pkgs/b")]).expect("join");
        let cfg = LoaderConfig::from_vars(vars(&[
            (DEPS_FILE_ENV, OsString::from("/app/app.deps.json")),
            (PROBE_PATHS_ENV, probes),
        ]));
        assert_eq!(cfg.deps_file, Some(PathBuf::from("/app/app.deps.json")));
        assert_eq!(cfg.probe_paths, vec![PathBuf::from("/pkgs/a"), PathBuf::from("/pkgs/b")]);
        assert_eq!(cfg.base_dir, None);
    }

    #[test]
    fn empty_env_is_default() {
        let cfg = LoaderConfig::from_vars(vars(&[(DEPS_FILE_ENV, OsString::new())]));
        assert_eq!(cfg, LoaderConfig::default());
    }

    #[test]
    fn missing_json_fields_default() {
        let cfg = LoaderConfig::from_json(r#"{ "runtime_identifier": "linux-x64" }"#).expect("parse");
        assert_eq!(cfg.runtime_identifier.as_deref(), Some("linux-x64"));
        assert!(cfg.probe_paths.is_empty());
        assert_eq!(cfg.deps_file, None);
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(LoaderConfig::from_json("[1, 2"), Err(Error::Config(_))));
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("loader.json");
        let cfg = LoaderConfig {
            base_dir: Some(PathBuf::from("/opt/app")),
            deps_file: None,
            probe_paths: vec![PathBuf::from("/opt/pkgs")],
            runtime_identifier: Some("osx-arm64".to_owned()),
        };
        cfg.save(&path).expect("save");
        assert_eq!(LoaderConfig::load(&path).expect("load"), cfg);
    }

    #[test]
    fn merge_prefers_later_values() {
        let base = LoaderConfig {
            base_dir: Some(PathBuf::from("/a")),
            probe_paths: vec![PathBuf::from("/p1")],
            ..LoaderConfig::default()
        };
        let over = LoaderConfig {
            runtime_identifier: Some("win-x64".to_owned()),
            probe_paths: vec![PathBuf::from("/p2")],
            ..LoaderConfig::default()
        };
        let merged = base.merge(over);
        assert_eq!(merged.base_dir, Some(PathBuf::from("/a")));
        assert_eq!(merged.runtime_identifier.as_deref(), Some("win-x64"));
        assert_eq!(merged.probe_paths, vec![PathBuf::from("/p1"), PathBuf::from("/p2")]);
    }

    #[test]
    fn explicit_paths_win_over_defaults() {
        let cfg = LoaderConfig {
            base_dir: Some(PathBuf::from("/opt/app")),
            deps_file: Some(PathBuf::from("/opt/app/custom.deps.json")),
            ..LoaderConfig::default()
        };
        assert_eq!(cfg.resolved_base_dir(), Some(PathBuf::from("/opt/app")));
        assert_eq!(cfg.resolved_deps_file(), Some(PathBuf::from("/opt/app/custom.deps.json")));
    }

    #[test]
    fn default_base_dir_is_executable_dir() {
        let expected = env::current_exe().expect("exe").parent().map(Path::to_path_buf);
        assert_eq!(LoaderConfig::default().resolved_base_dir(), expected);
    }
}
