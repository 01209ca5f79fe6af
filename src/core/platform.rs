use crate::models::error::PlatformError;
use crate::models::install::{Install, InstallScan, LoaderVersion, ManifestEntry, Profile};
use crate::models::mod_entry::ModInfo;
use async_trait::async_trait;
use camino::Utf8Path;
use tokio::sync::mpsc;

pub type PlatformResult<T> = Result<T, PlatformError>;

/// One download-progress report from the mod-management library.
#[derive(Clone, Debug)]
pub struct DownloadEvent {
    pub url: String,
    pub percent: f64,
    pub name: String,
    pub version: String,
}

/// The mod-management library, as the engine sees it: the single owner of
/// on-disk install and profile state, the mod repository connection, and all
/// physical file work. The engine sequences calls into it and adopts the
/// install descriptors it returns; it never constructs installed-state on its
/// own.
///
/// Every mutating method returns the refreshed descriptor for the affected
/// install so the engine can replace its copy wholesale.
#[async_trait]
pub trait ModPlatform: Send + Sync {
    /// Loads whatever on-disk cache the library keeps. Called once before
    /// install enumeration.
    async fn load_cache(&self) -> PlatformResult<()>;

    /// Detects game installations, separating usable ones from registered
    /// locations that point nowhere.
    async fn enumerate_installs(&self) -> PlatformResult<InstallScan>;

    async fn list_profiles(&self) -> PlatformResult<Vec<Profile>>;

    /// Persists a new profile seeded from `copy_from` and returns it.
    async fn create_profile(&self, name: &str, copy_from: &str) -> PlatformResult<Profile>;

    async fn delete_profile(&self, name: &str) -> PlatformResult<()>;

    /// Binds `profile` to the install at `install`, reconciling its mod set.
    async fn bind_profile(&self, install: &Utf8Path, profile: &str) -> PlatformResult<Install>;

    /// Installs a mod, at the given version when one is pinned, else the best
    /// available.
    async fn install_mod(
        &self,
        install: &Utf8Path,
        mod_reference: &str,
        version: Option<&str>,
    ) -> PlatformResult<Install>;

    async fn uninstall_mod(&self, install: &Utf8Path, mod_reference: &str)
        -> PlatformResult<Install>;

    async fn update_mod(&self, install: &Utf8Path, mod_reference: &str)
        -> PlatformResult<Install>;

    /// Batch manifest edit: add, remove and update entries in one pass.
    async fn mutate_manifest(
        &self,
        install: &Utf8Path,
        adds: &[ManifestEntry],
        removes: &[String],
        updates: &[String],
    ) -> PlatformResult<Install>;

    /// Page size of the repository listing. Pages are fetched with
    /// `mods_page` from 0 to `ceil(mod_count / mods_per_page) - 1`.
    fn mods_per_page(&self) -> usize;

    async fn mod_count(&self) -> PlatformResult<usize>;

    async fn mods_page(&self, page: usize) -> PlatformResult<Vec<ModInfo>>;

    async fn loader_versions(&self) -> PlatformResult<Vec<LoaderVersion>>;

    /// Hands out the download-progress event stream. The engine subscribes
    /// once at bootstrap and forwards events into its ledger.
    fn subscribe_downloads(&self) -> mpsc::UnboundedReceiver<DownloadEvent>;

    /// Whether the game process is currently running.
    async fn is_game_running(&self) -> bool;
}
