use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One explicitly requested mod in an install's manifest, optionally pinned
/// to a version.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ManifestEntry {
    pub id: String,
    pub version: Option<String>,
}

/// A detected game installation as described by the mod-management library.
/// `mods` holds everything physically present, transitive dependencies
/// included; `manifest` holds only what the user asked for.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Install {
    pub location: Utf8PathBuf,
    pub version: String,
    pub mods: BTreeMap<String, String>,
    pub manifest: Vec<ManifestEntry>,
    pub profile: String,
}

impl Install {
    /// Version pinned in the manifest for `mod_reference`, if the mod is an
    /// explicit entry with a pin.
    pub fn manifest_version(&self, mod_reference: &str) -> Option<&str> {
        self.manifest
            .iter()
            .find(|entry| entry.id == mod_reference)
            .and_then(|entry| entry.version.as_deref())
    }

    pub fn in_manifest(&self, mod_reference: &str) -> bool {
        self.manifest.iter().any(|entry| entry.id == mod_reference)
    }
}

/// Result of install enumeration: usable installs plus the locations that
/// were registered but point nowhere.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct InstallScan {
    pub installs: Vec<Install>,
    pub invalid: Vec<Utf8PathBuf>,
}

/// A named set of mods the user wants installed. The name "vanilla" is
/// reserved for the empty profile.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Profile {
    pub name: String,
    pub items: Vec<String>,
}

pub const VANILLA_PROFILE: &str = "vanilla";
pub const DEFAULT_PROFILE: &str = "modded";

/// A published release of the mod loader and the minimum game version it
/// supports.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoaderVersion {
    pub version: String,
    pub satisfactory_version: String,
}
