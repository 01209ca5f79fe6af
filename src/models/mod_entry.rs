use serde::{Deserialize, Serialize};

/// One published version of a mod, with the loader release it targets.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModVersion {
    pub version: String,
    pub sml_version: String,
}

/// Catalog metadata as delivered by the mod repository.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModInfo {
    pub mod_reference: String,
    pub name: String,
    pub popularity: i64,
    pub hotness: i64,
    pub views: i64,
    pub downloads: i64,
    /// Epoch seconds of the newest version upload.
    pub last_version_date: i64,
    pub versions: Vec<ModVersion>,
}

/// A catalog entry: repository metadata plus the flags derived from the
/// active install. The derived fields are only ever written by the
/// compatibility pass.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModEntry {
    pub info: ModInfo,
    pub is_installed: bool,
    pub installed_version: Option<String>,
    pub manifest_version: Option<String>,
    pub is_dependency: bool,
    pub is_compatible: bool,
}

/// One row of the pending-updates list: the mod and the version it moves to.
/// The version only feeds the progress message; the collaborator resolves the
/// actual target.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PendingUpdate {
    pub item: String,
    pub version: String,
}

impl ModEntry {
    /// Wraps fresh repository metadata. Entries start out compatible so a
    /// just-fetched catalog is not rendered empty before the first
    /// compatibility pass runs.
    pub fn from_info(info: ModInfo) -> Self {
        Self {
            info,
            is_installed: false,
            installed_version: None,
            manifest_version: None,
            is_dependency: false,
            is_compatible: true,
        }
    }

    pub fn reference(&self) -> &str {
        &self.info.mod_reference
    }
}
