use crate::config::SavedFilters;
use crate::core::engine::{AppEngine, GAME_POLL_INTERVAL, VALIDATING_INSTALL};
use crate::core::ledger::OperationTicket;
use crate::core::projection;
use crate::models::error::{invalid_installs_error, AppError};
use crate::models::filters::FilterState;
use crate::models::install::DEFAULT_PROFILE;
use crate::models::mod_entry::ModEntry;
use crate::models::progress::Progress;
use camino::Utf8PathBuf;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use std::collections::BTreeMap;
use tokio::time::sleep;
use tracing::{debug, info};

impl AppEngine {
    /// One-time startup: restores persisted choices, then concurrently
    /// enumerates installs, fetches loader versions, and pages in the mod
    /// catalog; finishes with the first compatibility pass and starts the
    /// game-running poll. Failures land in the error slot; partial state from
    /// the tasks that did succeed is kept.
    pub async fn init_app(&self) {
        let ticket = {
            let mut st = self.state.write();
            match st.ledger.begin_exclusive("app-load", "Loading") {
                Ok(ticket) => ticket,
                Err(e) => {
                    drop(st);
                    self.report_error(&e);
                    return;
                }
            }
        };

        self.start_download_forwarder();

        let settings = self.settings.load();
        {
            let mut st = self.state.write();
            st.favorite_mods = settings.favorite_mods.clone();
            st.expand_mod_info_on_start = settings.expand_mod_info_on_start;
            st.filters = settings
                .filters
                .map(SavedFilters::to_state)
                .unwrap_or_else(FilterState::bootstrap_default);
        }
        match self.platform.list_profiles().await {
            Ok(profiles) => self.state.write().profiles = profiles,
            Err(e) => self.report_error(&AppError::from(e)),
        }

        let (install_res, loaders_res, catalog_res) = tokio::join!(
            self.bootstrap_install(
                &ticket,
                settings.selected_install.clone(),
                settings.selected_profiles.clone(),
            ),
            self.fetch_loader_versions(),
            self.fetch_catalog(&ticket),
        );
        if let Some(e) = [install_res, loaders_res, catalog_res]
            .into_iter()
            .find_map(|r| r.err())
        {
            self.report_error(&e);
        }

        let expand = {
            let mut st = self.state.write();
            st.counts.all = st.mods.len();
            st.counts.favourite = projection::favourite_count(&st.mods, &st.favorite_mods);
            Self::refresh_derived(&mut st);
            if st.expand_mod_info_on_start {
                projection::view(&st.mods, &st.filters, &st.favorite_mods)
                    .first()
                    .map(|entry| entry.reference().to_string())
            } else {
                None
            }
        };
        self.dispose_exclusive(ticket.group_id);
        if let Some(mod_id) = expand {
            self.expand_mod(&mod_id);
        }
        info!("engine initialized");

        self.start_game_poll();
    }

    /// Task (a): cache load, install enumeration, saved-install pick and
    /// profile bind.
    async fn bootstrap_install(
        &self,
        ticket: &OperationTicket,
        saved_location: Option<Utf8PathBuf>,
        saved_profiles: BTreeMap<Utf8PathBuf, String>,
    ) -> Result<(), AppError> {
        self.platform.load_cache().await?;
        let scan = self.platform.enumerate_installs().await?;
        if scan.installs.is_empty() {
            self.state.write().invalid_installs = scan.invalid.clone();
            return Err(if scan.invalid.is_empty() {
                AppError::NoInstallsFound
            } else {
                invalid_installs_error(scan.invalid.len())
            });
        }

        let chosen = scan
            .installs
            .iter()
            .find(|i| Some(&i.location) == saved_location.as_ref())
            .unwrap_or(&scan.installs[0])
            .clone();
        let profile_name = saved_profiles
            .get(&chosen.location)
            .cloned()
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let item_id = {
            let mut st = self.state.write();
            st.installs = scan.installs;
            st.invalid_installs = scan.invalid;
            st.selected_install = Some(chosen.clone());
            st.selected_profile = st.profiles.iter().find(|p| p.name == profile_name).cloned();
            st.ledger.add_item(&ticket.group_id, VALIDATING_INSTALL)
        };

        let bound = self.platform.bind_profile(&chosen.location, &profile_name).await;
        let mut st = self.state.write();
        if let Some(item_id) = &item_id {
            st.ledger.remove_item(&ticket.group_id, item_id);
        }
        let install = bound?;
        Self::adopt_install(&mut st, install);
        Ok(())
    }

    /// Task (b): loader-version list, replaced wholesale.
    async fn fetch_loader_versions(&self) -> Result<(), AppError> {
        let versions = self.platform.loader_versions().await?;
        self.state.write().loader_versions = versions;
        Ok(())
    }

    /// Task (c): paged catalog fetch with progress reporting.
    async fn fetch_catalog(&self, ticket: &OperationTicket) -> Result<(), AppError> {
        let item_id = {
            self.state
                .write()
                .ledger
                .add_item(&ticket.group_id, "Getting available mods")
        };
        let result = self.fetch_catalog_pages(ticket, item_id.as_deref()).await;
        if let Some(item_id) = &item_id {
            self.state.write().ledger.remove_item(&ticket.group_id, item_id);
        }
        result
    }

    /// Pages are requested together and folded in completion order; the
    /// catalog is only replaced once every page arrived.
    async fn fetch_catalog_pages(
        &self,
        ticket: &OperationTicket,
        item_id: Option<&str>,
    ) -> Result<(), AppError> {
        let count = self.platform.mod_count().await?;
        let per_page = self.platform.mods_per_page().max(1);
        let pages = count.div_ceil(per_page);
        if let Some(item_id) = item_id {
            self.state
                .write()
                .ledger
                .update_item(&ticket.group_id, item_id, |item| {
                    item.progress = Progress::Fraction(0.0);
                    item.message = format!("Getting available mods (0/{count})");
                });
        }

        let mut fetches = FuturesUnordered::new();
        for page in 0..pages {
            let platform = self.platform.clone();
            fetches.push(async move { platform.mods_page(page).await });
        }

        let mut mods: Vec<ModEntry> = Vec::with_capacity(count);
        let mut got = 0usize;
        while let Some(page) = fetches.next().await {
            let page = page?;
            got += page.len();
            mods.extend(page.into_iter().map(ModEntry::from_info));
            if let Some(item_id) = item_id {
                self.state
                    .write()
                    .ledger
                    .update_item(&ticket.group_id, item_id, |item| {
                        item.progress.advance(1.0 / pages as f64);
                        item.message = format!("Getting available mods ({got}/{count})");
                    });
            }
        }
        self.state.write().mods = mods;
        Ok(())
    }

    /// Forwards collaborator download events into the ledger for the life of
    /// the engine.
    fn start_download_forwarder(&self) {
        let mut events = self.platform.subscribe_downloads();
        let engine = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                engine.report_download(event);
            }
        });
    }

    /// Keeps the game-running flag in step with the collaborator's process
    /// query, OR'd with the transient launching flag.
    fn start_game_poll(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            loop {
                sleep(GAME_POLL_INTERVAL).await;
                let running = engine.platform.is_game_running().await;
                let mut st = engine.state.write();
                let flag = st.is_launching_game || running;
                if flag != st.is_game_running {
                    debug!("game running flag changed: {flag}");
                }
                st.is_game_running = flag;
            }
        });
    }
}
