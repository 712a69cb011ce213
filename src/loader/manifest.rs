// ── Dependency manifest ───────────────────────────────────────────────────────
//
// Reads a `deps.json`-style dependency graph: which packages ship which
// native assets for which RID, where each package lives relative to a probe
// directory, and the RID → fallback-RID graph.  The manifest is read-only
// once parsed.  Unknown JSON fields are ignored.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

// ── On-disk types ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct DepsFile {
    #[serde(default)]
    targets: BTreeMap<String, BTreeMap<String, TargetEntry>>,
    #[serde(default)]
    libraries: BTreeMap<String, LibraryEntry>,
    #[serde(default)]
    runtimes: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TargetEntry {
    /// RID-specific assets: `"runtimes/<rid>/native/<file>": { rid, assetType }`.
    #[serde(default)]
    runtime_targets: BTreeMap<String, RuntimeTarget>,
    /// RID-agnostic native assets: `"<file>": {}`.
    #[serde(default)]
    native: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RuntimeTarget {
    rid: Option<String>,
    asset_type: Option<String>,
}

#[derive(Deserialize, Default)]
struct LibraryEntry {
    path: Option<String>,
}

// ── Parsed model ──────────────────────────────────────────────────────────────

/// One native file shipped by a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAsset {
    /// Package key, e.g. `"GtkSharp.Dependencies/3.24.24"`.
    pub package: String,
    /// Package directory relative to a probe root (from `libraries`).
    pub package_path: Option<String>,
    /// RID the asset is built for; `None` for RID-agnostic assets.
    pub rid: Option<String>,
    /// Asset path relative to the package, e.g. `"runtimes/linux-x64/native/libgtk-3.so.0"`.
    pub path: String,
}

impl NativeAsset {
    /// Last path component of `path`.
    pub fn file_name(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }
}

/// Native assets and RID fallback graph from a dependency manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyManifest {
    assets: Vec<NativeAsset>,
    fallbacks: BTreeMap<String, Vec<String>>,
}

impl DependencyManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        let deps: DepsFile = serde_json::from_str(json).map_err(Error::Manifest)?;
        Ok(Self::from_deps(deps))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load `path`, or `None` (with a warning) when it is missing or malformed.
    ///
    /// The manifest is an optional enrichment; its absence is never fatal.
    pub fn load_optional(path: &Path) -> Option<Self> {
        match Self::load(path) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                log::warn!("ignoring dependency manifest {}: {e}", path.display());
                None
            }
        }
    }

    fn from_deps(deps: DepsFile) -> Self {
        let mut assets = Vec::new();
        for packages in deps.targets.into_values() {
            for (package, entry) in packages {
                let package_path = deps.libraries.get(&package).and_then(|l| l.path.clone());

                for (path, target) in entry.runtime_targets {
                    if target.asset_type.as_deref().is_some_and(|t| t != "native") {
                        continue;
                    }
                    assets.push(NativeAsset {
                        package: package.clone(),
                        package_path: package_path.clone(),
                        rid: target.rid,
                        path,
                    });
                }
                for path in entry.native.into_keys() {
                    assets.push(NativeAsset {
                        package: package.clone(),
                        package_path: package_path.clone(),
                        rid: None,
                        path,
                    });
                }
            }
        }
        Self {
            assets,
            fallbacks: deps.runtimes,
        }
    }

    /// Declared fallback chain for `rid` (empty when undeclared).
    pub fn fallbacks(&self, rid: &str) -> &[String] {
        self.fallbacks.get(rid).map(Vec::as_slice).unwrap_or_default()
    }

    /// Assets for exactly `rid` (or RID-agnostic assets for `None`) whose
    /// file name equals `name`.
    pub fn native_assets(&self, rid: Option<&str>, name: &str) -> Vec<&NativeAsset> {
        self.assets
            .iter()
            .filter(|a| a.rid.as_deref() == rid && a.file_name() == name)
            .collect()
    }

    pub fn assets(&self) -> &[NativeAsset] {
        &self.assets
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
