use crate::models::filters::{CategoryCounts, FilterState};
use crate::models::install::{Install, LoaderVersion, Profile};
use crate::models::mod_entry::ModEntry;
use crate::models::progress::OperationGroup;
use camino::Utf8PathBuf;
use serde::Serialize;
use std::collections::BTreeSet;

/// Read-only view of the whole engine state, assembled on demand for the
/// presentation layer. Everything in here is a copy; holding a snapshot never
/// blocks the engine.
#[derive(Serialize, Clone, Debug)]
pub struct StateSnapshot {
    pub mods: Vec<ModEntry>,
    pub installs: Vec<Install>,
    pub invalid_installs: Vec<Utf8PathBuf>,
    pub selected_install: Option<Install>,
    pub profiles: Vec<Profile>,
    pub selected_profile: Option<Profile>,
    pub loader_versions: Vec<LoaderVersion>,
    pub operations: Vec<OperationGroup>,
    pub error: Option<String>,
    pub is_game_running: bool,
    pub is_launching_game: bool,
    pub favorite_mods: BTreeSet<String>,
    pub filters: FilterState,
    pub counts: CategoryCounts,
    pub expanded_mod: Option<String>,
    pub expand_mod_info_on_start: bool,
    pub can_install_mods: bool,
}
