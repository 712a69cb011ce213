// ── Load target resolver ──────────────────────────────────────────────────────
//
// Expands one short library name into the ordered paths to try:
//
//   1. the bare name            – the OS loader applies its own search rules
//   2. <base dir>/<name>        – next to the running application
//   3. manifest-resolved assets – for the current RID, then its fallbacks
//
// `enumerate` is lazy and restartable: every call builds a fresh iterator
// over immutable resolver state, so there is no shared cursor.  A path is
// yielded at most once per call.

use std::{
    collections::HashSet,
    iter,
    path::{Path, PathBuf},
};

use super::manifest::{DependencyManifest, NativeAsset};

/// Turns a library short name into candidate paths.
#[derive(Debug, Clone, Default)]
pub struct LoadTargetResolver {
    rid: String,
    base_dir: Option<PathBuf>,
    probe_paths: Vec<PathBuf>,
    manifest: Option<DependencyManifest>,
}

impl LoadTargetResolver {
    pub fn new(rid: impl Into<String>) -> Self {
        Self {
            rid: rid.into(),
            ..Self::default()
        }
    }

    /// Application base directory (stage 2, and root for app-local assets).
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Package roots under which `<package path>/<asset>` is probed.
    pub fn with_probe_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.probe_paths.extend(paths);
        self
    }

    pub fn with_manifest(mut self, manifest: Option<DependencyManifest>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn rid(&self) -> &str {
        &self.rid
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn manifest(&self) -> Option<&DependencyManifest> {
        self.manifest.as_ref()
    }

    /// Ordered candidate paths for `name`.
    pub fn enumerate<'a>(&'a self, name: &'a str) -> impl Iterator<Item = String> + 'a {
        let bare = iter::once(name.to_owned());
        let local = self.base_dir.iter().map(move |dir| path_string(&dir.join(name)));
        let manifest = self
            .manifest
            .iter()
            .flat_map(move |manifest| self.manifest_paths(manifest, name));
        let mut seen = HashSet::new();
        bare.chain(local)
            .chain(manifest)
            .filter(move |path| seen.insert(path.clone()))
    }

    /// RIDs whose assets are consulted, most specific first.
    ///
    /// When the current RID has no declared fallbacks, a more general RID is
    /// guessed once (see `guess_general_rid`) and its fallbacks used instead.
    /// Fallback graphs differ between manifests, so not every specific RID is
    /// guaranteed to appear in the one at hand.
    pub fn rid_chain(&self) -> Vec<String> {
        let mut chain = vec![self.rid.clone()];
        let Some(manifest) = &self.manifest else {
            return chain;
        };

        let declared = manifest.fallbacks(&self.rid);
        if !declared.is_empty() {
            chain.extend(declared.iter().cloned());
        } else if let Some(guess) = guess_general_rid(&self.rid) {
            log::debug!("no fallbacks declared for {}; guessing {guess}", self.rid);
            chain.extend(manifest.fallbacks(&guess).iter().cloned());
            chain.insert(1, guess);
        }

        let mut seen = Vec::with_capacity(chain.len());
        chain.retain(|rid| {
            if seen.contains(rid) {
                false
            } else {
                seen.push(rid.clone());
                true
            }
        });
        chain
    }

    fn manifest_paths<'a>(
        &'a self,
        manifest: &'a DependencyManifest,
        name: &'a str,
    ) -> impl Iterator<Item = String> + 'a {
        self.rid_chain()
            .into_iter()
            .map(Some)
            .chain(iter::once(None))
            .flat_map(move |rid| manifest.native_assets(rid.as_deref(), name))
            .flat_map(move |asset| self.asset_locations(asset))
    }

    /// App-local copy first, then each probe root.
    fn asset_locations<'a>(&'a self, asset: &'a NativeAsset) -> impl Iterator<Item = String> + 'a {
        let local = self.base_dir.iter().map(move |dir| path_string(&dir.join(&asset.path)));
        let probed = asset.package_path.iter().flat_map(move |package| {
            self.probe_paths
                .iter()
                .map(move |root| path_string(&root.join(package).join(&asset.path)))
        });
        local.chain(probed)
    }
}

/// Guess a more general RID for a vendor- or version-specific one.
///
/// * `win10-x64`        → `win-x64`
/// * `osx.13-arm64`     → `osx-arm64`
/// * `freebsd.13-x64`   → `freebsd-x64`
/// * `ubuntu.22.04-x64` → `linux-x64` (any distro, versioned or not)
///
/// Generic RIDs (`linux-x64`, `linux-musl-x64`, `win-x64`, …) and RIDs of
/// non-Linux platforms without a general form (`unknown-x64`,
/// `android.34-arm64`) yield `None`.
pub fn guess_general_rid(rid: &str) -> Option<String> {
    let (platform, arch) = rid.rsplit_once('-')?;
    if platform.is_empty() || arch.is_empty() {
        return None;
    }

    if let Some(version) = platform.strip_prefix("win") {
        return (!version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()))
            .then(|| format!("win-{arch}"));
    }

    let os = platform.split_once('.').map_or(platform, |(os, _)| os);
    let general = match os {
        "osx" | "freebsd" => os,
        "linux" | "unix" | "any" | "base" => return None,
        "unknown" | "android" | "ios" | "tvos" | "maccatalyst" | "browser" | "wasi"
        | "illumos" | "solaris" | "haiku" => return None,
        _ if os.starts_with("linux") => return None,
        _ => "linux",
    };
    let guess = format!("{general}-{arch}");
    (guess != rid).then_some(guess)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
