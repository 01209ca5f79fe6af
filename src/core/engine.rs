use crate::config::{self, SavedFilters, SettingsStore};
use crate::core::compatibility;
use crate::core::ledger::{OperationLedger, OperationTicket};
use crate::core::platform::{DownloadEvent, ModPlatform, PlatformResult};
use crate::core::projection;
use crate::models::error::AppError;
use crate::models::filters::{CategoryCounts, FilterState};
use crate::models::install::{Install, LoaderVersion, Profile, DEFAULT_PROFILE, VANILLA_PROFILE};
use crate::models::mod_entry::{ModEntry, PendingUpdate};
use crate::models::snapshot::StateSnapshot;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error};

/// How long a settled exclusive group stays visible before it is removed.
pub const EXCLUSIVE_LINGER: Duration = Duration::from_millis(500);
/// How long a finished download entry stays visible.
pub const DOWNLOAD_LINGER: Duration = Duration::from_millis(100);
/// How long the launching flag stays up without process confirmation.
pub const LAUNCH_RESET: Duration = Duration::from_secs(10);
/// Cadence of the game-running poll.
pub const GAME_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub(crate) const VALIDATING_INSTALL: &str = "Validating mod install";
const FINDING_BEST_VERSION: &str = "Finding the best version to install";
const CHECKING_UNNEEDED: &str = "Checking for mods that are no longer needed";

/// Everything the engine owns, kept behind one lock. The lock is only ever
/// held for plain state edits, never across a collaborator call, so read-side
/// consumers stay live while a mutation is in flight.
#[derive(Default)]
pub struct EngineState {
    pub(crate) mods: Vec<ModEntry>,
    pub(crate) installs: Vec<Install>,
    pub(crate) invalid_installs: Vec<Utf8PathBuf>,
    pub(crate) selected_install: Option<Install>,
    pub(crate) profiles: Vec<Profile>,
    pub(crate) selected_profile: Option<Profile>,
    pub(crate) loader_versions: Vec<LoaderVersion>,
    pub(crate) favorite_mods: BTreeSet<String>,
    pub(crate) filters: FilterState,
    pub(crate) counts: CategoryCounts,
    pub(crate) ledger: OperationLedger,
    pub(crate) error: Option<String>,
    pub(crate) is_game_running: bool,
    pub(crate) is_launching_game: bool,
    pub(crate) expanded_mod: Option<String>,
    pub(crate) expand_mod_info_on_start: bool,
}

/// The orchestration engine. Cheap to clone; clones share the same state,
/// collaborator and settings store. All mutation happens through the action
/// methods below, which report failures through the error slot instead of
/// returning them, mirroring the dispatch surface the presentation layer
/// gets.
#[derive(Clone)]
pub struct AppEngine {
    pub(crate) platform: Arc<dyn ModPlatform>,
    pub(crate) settings: Arc<dyn SettingsStore>,
    pub(crate) state: Arc<RwLock<EngineState>>,
}

impl AppEngine {
    pub fn new(platform: Arc<dyn ModPlatform>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            platform,
            settings,
            state: Arc::new(RwLock::new(EngineState::default())),
        }
    }

    // --- Read Side ---

    /// Full copy of the current state for the presentation layer.
    pub fn snapshot(&self) -> StateSnapshot {
        let st = self.state.read();
        StateSnapshot {
            mods: st.mods.clone(),
            installs: st.installs.clone(),
            invalid_installs: st.invalid_installs.clone(),
            selected_install: st.selected_install.clone(),
            profiles: st.profiles.clone(),
            selected_profile: st.selected_profile.clone(),
            loader_versions: st.loader_versions.clone(),
            operations: st.ledger.groups(),
            error: st.error.clone(),
            is_game_running: st.is_game_running,
            is_launching_game: st.is_launching_game,
            favorite_mods: st.favorite_mods.clone(),
            filters: st.filters.clone(),
            counts: st.counts,
            expanded_mod: st.expanded_mod.clone(),
            expand_mod_info_on_start: st.expand_mod_info_on_start,
            can_install_mods: Self::can_install(&st),
        }
    }

    /// The current filtered, sorted mod list.
    pub fn filtered_mods(&self) -> Vec<ModEntry> {
        let st = self.state.read();
        projection::view(&st.mods, &st.filters, &st.favorite_mods)
    }

    /// Installing is allowed on any profile but vanilla, and never while the
    /// game runs.
    pub fn can_install_mods(&self) -> bool {
        Self::can_install(&self.state.read())
    }

    fn can_install(st: &EngineState) -> bool {
        st.selected_profile
            .as_ref()
            .is_some_and(|p| p.name != VANILLA_PROFILE)
            && !st.is_game_running
    }

    // --- Error Channel ---

    /// Puts a message in the error slot, replacing whatever was there.
    pub fn show_error(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.state.write().error = Some(message);
    }

    pub fn clear_error(&self) {
        self.state.write().error = None;
    }

    pub(crate) fn report_error(&self, err: &AppError) {
        self.show_error(err.to_string());
    }

    // --- Unguarded State Actions ---

    pub fn set_filters(&self, filters: FilterState) {
        let saved = SavedFilters::from_state(&filters);
        self.state.write().filters = filters;
        config::update_settings(self.settings.as_ref(), |s| s.filters = Some(saved));
    }

    pub fn toggle_mod_favorite(&self, mod_id: &str) {
        let favorites = {
            let mut st = self.state.write();
            if !st.favorite_mods.remove(mod_id) {
                st.favorite_mods.insert(mod_id.to_string());
            }
            st.counts.favourite = projection::favourite_count(&st.mods, &st.favorite_mods);
            st.favorite_mods.clone()
        };
        config::update_settings(self.settings.as_ref(), |s| s.favorite_mods = favorites);
    }

    /// Marks a mod as expanded in the UI. The reference is not validated;
    /// collapsing happens via [`AppEngine::unexpand_mod`].
    pub fn expand_mod(&self, mod_id: &str) {
        self.state.write().expanded_mod = Some(mod_id.to_string());
    }

    pub fn unexpand_mod(&self) {
        self.state.write().expanded_mod = None;
    }

    pub fn set_expand_mod_info_on_start(&self, value: bool) {
        self.state.write().expand_mod_info_on_start = value;
        config::update_settings(self.settings.as_ref(), |s| s.expand_mod_info_on_start = value);
    }

    /// Flags the game as launching and running right away; the launching flag
    /// falls back down after [`LAUNCH_RESET`] and the poll keeps the running
    /// flag truthful from then on.
    pub fn launch_game(&self) {
        {
            let mut st = self.state.write();
            st.is_launching_game = true;
            st.is_game_running = true;
        }
        let engine = self.clone();
        tokio::spawn(async move {
            sleep(LAUNCH_RESET).await;
            engine.state.write().is_launching_game = false;
        });
    }

    // --- Selection ---

    /// Makes the install at `location` active. The reference switches
    /// immediately; validation (profile bind + recompute) runs only when no
    /// exclusive operation is open, and the choice is persisted with it.
    pub async fn select_install(&self, location: &Utf8Path) {
        let validate = {
            let mut st = self.state.write();
            let Some(install) = st
                .installs
                .iter()
                .find(|i| i.location == location)
                .cloned()
            else {
                drop(st);
                self.report_error(&AppError::UnknownInstall(location.to_string()));
                return;
            };
            st.selected_install = Some(install);
            !st.ledger.exclusive_open()
        };
        if !validate {
            debug!("install selected during an open operation, validation skipped");
            return;
        }

        let profile_name = self
            .settings
            .load()
            .selected_profiles
            .get(location)
            .cloned()
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        let ticket = {
            let mut st = self.state.write();
            st.selected_profile = st.profiles.iter().find(|p| p.name == profile_name).cloned();
            st.ledger.begin_exclusive("validate-install", VALIDATING_INSTALL).ok()
        };
        if let Some(ticket) = ticket {
            let result = self.platform.bind_profile(location, &profile_name).await;
            self.finish_validation(&ticket, result);
            self.dispose_exclusive(ticket.group_id);
            let location = location.to_owned();
            config::update_settings(self.settings.as_ref(), |s| {
                s.selected_install = Some(location);
            });
        }
    }

    /// Makes the named profile active. Same coalescing rules as
    /// [`AppEngine::select_install`]; the (install → profile) choice is
    /// persisted when validation runs.
    pub async fn select_profile(&self, name: &str) {
        let (validate, location) = {
            let mut st = self.state.write();
            let Some(profile) = st.profiles.iter().find(|p| p.name == name).cloned() else {
                drop(st);
                self.report_error(&AppError::UnknownProfile(name.to_string()));
                return;
            };
            st.selected_profile = Some(profile);
            (
                !st.ledger.exclusive_open(),
                st.selected_install.as_ref().map(|i| i.location.clone()),
            )
        };
        if !validate {
            debug!("profile selected during an open operation, validation skipped");
            return;
        }
        let Some(location) = location else {
            self.report_error(&AppError::NoSelectedInstall);
            return;
        };

        let ticket = {
            let mut st = self.state.write();
            st.ledger.begin_exclusive("validate-install", VALIDATING_INSTALL).ok()
        };
        if let Some(ticket) = ticket {
            let result = self.platform.bind_profile(&location, name).await;
            let bound = self.finish_validation(&ticket, result);
            self.dispose_exclusive(ticket.group_id);
            if bound {
                let name = name.to_string();
                config::update_settings(self.settings.as_ref(), |s| {
                    s.selected_profiles.insert(location, name);
                });
            }
        }
    }

    /// Settles a validation group, returns whether the bind succeeded.
    fn finish_validation(&self, ticket: &OperationTicket, result: PlatformResult<Install>) -> bool {
        let mut st = self.state.write();
        match result {
            Ok(install) => {
                st.ledger.complete_item(ticket);
                Self::adopt_install(&mut st, install);
                Self::refresh_derived(&mut st);
                true
            }
            Err(e) => {
                let err = AppError::from(e);
                error!("install validation failed: {err}");
                st.error = Some(err.to_string());
                false
            }
        }
    }

    // --- Profiles ---

    /// Asks the collaborator for a new profile seeded from the current one
    /// (or vanilla), adds it to the known list and selects it.
    pub async fn create_profile(&self, name: &str, copy_current: bool) {
        if name == VANILLA_PROFILE {
            self.report_error(&AppError::ReservedProfile);
            return;
        }
        let source = if copy_current {
            self.state
                .read()
                .selected_profile
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| VANILLA_PROFILE.to_string())
        } else {
            VANILLA_PROFILE.to_string()
        };
        match self.platform.create_profile(name, &source).await {
            Ok(profile) => {
                self.state.write().profiles.push(profile);
                self.select_profile(name).await;
            }
            Err(e) => self.report_error(&AppError::from(e)),
        }
    }

    /// Deletes a profile; when it was active, falls back to the default
    /// profile.
    pub async fn delete_profile(&self, name: &str) {
        if name == VANILLA_PROFILE {
            self.report_error(&AppError::ReservedProfile);
            return;
        }
        if let Err(e) = self.platform.delete_profile(name).await {
            self.report_error(&AppError::from(e));
            return;
        }
        let was_selected = {
            let mut st = self.state.write();
            st.profiles.retain(|p| p.name != name);
            st.selected_profile.as_ref().is_some_and(|p| p.name == name)
        };
        if was_selected {
            self.select_profile(DEFAULT_PROFILE).await;
        }
    }

    // --- Guarded Mod Actions ---

    /// Installs the mod when it is absent, uninstalls it when present.
    pub async fn switch_mod_installed(&self, mod_id: &str) {
        let installed = self.mod_is_installed(mod_id);
        let message = if installed {
            CHECKING_UNNEEDED
        } else {
            FINDING_BEST_VERSION
        };
        let (ticket, location) = match self.begin_mod_action(mod_id, message) {
            Ok(started) => started,
            Err(e) => {
                self.report_error(&e);
                return;
            }
        };
        let result = if installed {
            self.platform.uninstall_mod(&location, mod_id).await
        } else {
            self.platform.install_mod(&location, mod_id, None).await
        };
        self.finish_mod_action(ticket, result);
    }

    /// Installs a specific version when one is pinned; otherwise installs a
    /// missing mod or updates an installed one.
    pub async fn install_mod_version(&self, mod_id: &str, version: Option<&str>) {
        let installed = self.mod_is_installed(mod_id);
        let message = match version {
            Some(version) => format!("Installing {mod_id} v{version}"),
            None => format!("Installing latest {mod_id}"),
        };
        let (ticket, location) = match self.begin_mod_action(mod_id, &message) {
            Ok(started) => started,
            Err(e) => {
                self.report_error(&e);
                return;
            }
        };
        let result = if version.is_some() || !installed {
            self.platform.install_mod(&location, mod_id, version).await
        } else {
            self.platform.update_mod(&location, mod_id).await
        };
        self.finish_mod_action(ticket, result);
    }

    /// Applies one pending update through a batch manifest edit.
    pub async fn update_single(&self, update: &PendingUpdate) {
        let message = format!("Updating {} to v{}", update.item, update.version);
        let (ticket, location) = match self.begin_mod_action(&update.item, &message) {
            Ok(started) => started,
            Err(e) => {
                self.report_error(&e);
                return;
            }
        };
        let updates = vec![update.item.clone()];
        let result = self
            .platform
            .mutate_manifest(&location, &[], &[], &updates)
            .await;
        self.finish_mod_action(ticket, result);
    }

    /// Applies all pending updates in one batch manifest edit.
    pub async fn update_multi(&self, updates: &[PendingUpdate]) {
        let message = format!(
            "Updating {} mod{}",
            updates.len(),
            if updates.len() > 1 { "s" } else { "" }
        );
        let (ticket, location) = match self.begin_mod_action("update-mods", &message) {
            Ok(started) => started,
            Err(e) => {
                self.report_error(&e);
                return;
            }
        };
        let items: Vec<String> = updates.iter().map(|u| u.item.clone()).collect();
        let result = self
            .platform
            .mutate_manifest(&location, &[], &[], &items)
            .await;
        self.finish_mod_action(ticket, result);
    }

    fn mod_is_installed(&self, mod_id: &str) -> bool {
        self.state
            .read()
            .mods
            .iter()
            .find(|m| m.reference() == mod_id)
            .is_some_and(|m| m.is_installed)
    }

    /// Common entry of every guarded action: reject while anything is in
    /// flight, drop stale download entries, require an install, open the
    /// exclusive group.
    fn begin_mod_action(
        &self,
        label: &str,
        message: &str,
    ) -> Result<(OperationTicket, Utf8PathBuf), AppError> {
        let mut st = self.state.write();
        if st.ledger.any_open() {
            return Err(AppError::OperationInProgress);
        }
        st.ledger.clear_downloads();
        let location = st
            .selected_install
            .as_ref()
            .map(|i| i.location.clone())
            .ok_or(AppError::NoSelectedInstall)?;
        let ticket = st.ledger.begin_exclusive(label, message)?;
        Ok((ticket, location))
    }

    /// Common exit: adopt the returned descriptor or report the failure,
    /// recompute derived state either way, then let the group linger out.
    fn finish_mod_action(&self, ticket: OperationTicket, result: PlatformResult<Install>) {
        {
            let mut st = self.state.write();
            match result {
                Ok(install) => {
                    st.ledger.complete_item(&ticket);
                    Self::adopt_install(&mut st, install);
                }
                Err(e) => {
                    let err = AppError::from(e);
                    error!("mod operation failed: {err}");
                    st.error = Some(err.to_string());
                }
            }
            Self::refresh_derived(&mut st);
        }
        self.dispose_exclusive(ticket.group_id);
    }

    // --- Downloads ---

    /// Feeds one collaborator download report into the ledger and, when it
    /// completes the download, schedules the entry's delayed removal.
    pub fn report_download(&self, event: DownloadEvent) {
        let (item_id, finished) = self.state.write().ledger.report_download(
            &event.url,
            event.percent,
            &event.name,
            &event.version,
        );
        if finished {
            let engine = self.clone();
            tokio::spawn(async move {
                sleep(DOWNLOAD_LINGER).await;
                engine
                    .state
                    .write()
                    .ledger
                    .remove_download(&event.url, &item_id);
            });
        }
    }

    // --- Shared Internals ---

    /// Replaces the engine's copy of whichever install the collaborator just
    /// mutated. The active reference is only replaced when it still points at
    /// the same location; a selection made mid-operation wins.
    pub(crate) fn adopt_install(st: &mut EngineState, install: Install) {
        if let Some(existing) = st
            .installs
            .iter_mut()
            .find(|i| i.location == install.location)
        {
            *existing = install.clone();
        }
        if st
            .selected_install
            .as_ref()
            .is_some_and(|i| i.location == install.location)
        {
            st.selected_install = Some(install);
        }
    }

    pub(crate) fn refresh_derived(st: &mut EngineState) {
        compatibility::recompute(&mut st.mods, st.selected_install.as_ref(), &st.loader_versions);
        compatibility::refresh_counts(&mut st.counts, &st.mods);
    }

    /// Removes the exclusive group after the display linger.
    pub(crate) fn dispose_exclusive(&self, group_id: String) {
        let engine = self.clone();
        tokio::spawn(async move {
            sleep(EXCLUSIVE_LINGER).await;
            engine.state.write().ledger.close_exclusive(&group_id);
        });
    }
}
