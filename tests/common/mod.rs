use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use mod_helm::config::{AppSettings, SettingsStore};
use mod_helm::core::engine::{AppEngine, EXCLUSIVE_LINGER};
use mod_helm::core::platform::{DownloadEvent, ModPlatform, PlatformResult};
use mod_helm::models::error::PlatformError;
use mod_helm::models::install::{Install, InstallScan, LoaderVersion, ManifestEntry, Profile};
use mod_helm::models::mod_entry::{ModInfo, ModVersion};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Knobs and observable state of the fake mod-management library. Tests
/// reach into it through `FakePlatform::data`.
#[derive(Default)]
pub struct FakeData {
    pub scan: InstallScan,
    pub profiles: Vec<Profile>,
    pub loaders: Vec<LoaderVersion>,
    pub catalog: Vec<ModInfo>,
    pub per_page: usize,
    /// Artificial latency of collaborator calls; paused-clock tests use it to
    /// hold an operation open at a suspension point.
    pub delay: Duration,
    pub fail_enumerate: bool,
    pub fail_bind: bool,
    pub fail_mutations: bool,
    pub fail_catalog: bool,
    pub game_running: bool,
    pub calls: Vec<String>,
}

/// In-memory stand-in for the mod-management library. Mutating calls edit the
/// install descriptors in `scan` and return the refreshed copy, the same way
/// the real library hands back its view of the install.
pub struct FakePlatform {
    pub data: Mutex<FakeData>,
    events: mpsc::UnboundedSender<DownloadEvent>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<DownloadEvent>>>,
}

impl FakePlatform {
    pub fn new(data: FakeData) -> Arc<Self> {
        let (events, receiver) = mpsc::unbounded_channel();
        Arc::new(Self {
            data: Mutex::new(data),
            events,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.data.lock().calls.clone()
    }

    /// Emits a download event on the subscription channel.
    pub fn send_download(&self, url: &str, percent: f64, name: &str, version: &str) {
        let _ = self.events.send(DownloadEvent {
            url: url.to_string(),
            percent,
            name: name.to_string(),
            version: version.to_string(),
        });
    }

    async fn pause(&self) {
        let delay = self.data.lock().delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn record(&self, call: String) {
        self.data.lock().calls.push(call);
    }
}

fn edit_install(
    data: &mut FakeData,
    location: &Utf8Path,
    apply: impl FnOnce(&mut Install),
) -> PlatformResult<Install> {
    let install = data
        .scan
        .installs
        .iter_mut()
        .find(|i| i.location == location)
        .ok_or_else(|| PlatformError::new(format!("unknown install {location}")))?;
    apply(install);
    Ok(install.clone())
}

#[async_trait]
impl ModPlatform for FakePlatform {
    async fn load_cache(&self) -> PlatformResult<()> {
        self.record("load_cache".to_string());
        Ok(())
    }

    async fn enumerate_installs(&self) -> PlatformResult<InstallScan> {
        self.pause().await;
        self.record("enumerate_installs".to_string());
        let data = self.data.lock();
        if data.fail_enumerate {
            return Err(PlatformError::new("install scan failed"));
        }
        Ok(data.scan.clone())
    }

    async fn list_profiles(&self) -> PlatformResult<Vec<Profile>> {
        self.record("list_profiles".to_string());
        Ok(self.data.lock().profiles.clone())
    }

    async fn create_profile(&self, name: &str, copy_from: &str) -> PlatformResult<Profile> {
        self.record(format!("create_profile {name} from {copy_from}"));
        let mut data = self.data.lock();
        let items = data
            .profiles
            .iter()
            .find(|p| p.name == copy_from)
            .map(|p| p.items.clone())
            .unwrap_or_default();
        let profile = Profile {
            name: name.to_string(),
            items,
        };
        data.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn delete_profile(&self, name: &str) -> PlatformResult<()> {
        self.record(format!("delete_profile {name}"));
        self.data.lock().profiles.retain(|p| p.name != name);
        Ok(())
    }

    async fn bind_profile(&self, install: &Utf8Path, profile: &str) -> PlatformResult<Install> {
        self.pause().await;
        self.record(format!("bind_profile {install} {profile}"));
        let mut data = self.data.lock();
        if data.fail_bind {
            return Err(PlatformError::new("profile bind failed"));
        }
        let items = data
            .profiles
            .iter()
            .find(|p| p.name == profile)
            .map(|p| p.items.clone())
            .unwrap_or_default();
        let name = profile.to_string();
        edit_install(&mut data, install, |i| {
            i.profile = name;
            i.manifest = items
                .iter()
                .map(|id| ManifestEntry {
                    id: id.clone(),
                    version: None,
                })
                .collect();
            i.mods = items
                .iter()
                .map(|id| (id.clone(), "1.0.0".to_string()))
                .collect();
        })
    }

    async fn install_mod(
        &self,
        install: &Utf8Path,
        mod_reference: &str,
        version: Option<&str>,
    ) -> PlatformResult<Install> {
        self.pause().await;
        self.record(format!(
            "install_mod {install} {mod_reference} {}",
            version.unwrap_or("latest")
        ));
        let mut data = self.data.lock();
        if data.fail_mutations {
            return Err(PlatformError::new("mod files busy"));
        }
        let id = mod_reference.to_string();
        let pinned = version.map(str::to_string);
        edit_install(&mut data, install, |i| {
            i.mods.insert(
                id.clone(),
                pinned.clone().unwrap_or_else(|| "1.0.0".to_string()),
            );
            if !i.manifest.iter().any(|entry| entry.id == id) {
                i.manifest.push(ManifestEntry {
                    id: id.clone(),
                    version: pinned.clone(),
                });
            }
        })
    }

    async fn uninstall_mod(
        &self,
        install: &Utf8Path,
        mod_reference: &str,
    ) -> PlatformResult<Install> {
        self.pause().await;
        self.record(format!("uninstall_mod {install} {mod_reference}"));
        let mut data = self.data.lock();
        if data.fail_mutations {
            return Err(PlatformError::new("mod files busy"));
        }
        let id = mod_reference.to_string();
        edit_install(&mut data, install, |i| {
            i.mods.remove(&id);
            i.manifest.retain(|entry| entry.id != id);
        })
    }

    async fn update_mod(
        &self,
        install: &Utf8Path,
        mod_reference: &str,
    ) -> PlatformResult<Install> {
        self.pause().await;
        self.record(format!("update_mod {install} {mod_reference}"));
        let mut data = self.data.lock();
        if data.fail_mutations {
            return Err(PlatformError::new("mod files busy"));
        }
        let id = mod_reference.to_string();
        edit_install(&mut data, install, |i| {
            i.mods.insert(id.clone(), "2.0.0".to_string());
        })
    }

    async fn mutate_manifest(
        &self,
        install: &Utf8Path,
        adds: &[ManifestEntry],
        removes: &[String],
        updates: &[String],
    ) -> PlatformResult<Install> {
        self.pause().await;
        self.record(format!("mutate_manifest {install} updates={}", updates.join(",")));
        let mut data = self.data.lock();
        if data.fail_mutations {
            return Err(PlatformError::new("mod files busy"));
        }
        let adds = adds.to_vec();
        let removes = removes.to_vec();
        let updates = updates.to_vec();
        edit_install(&mut data, install, |i| {
            for add in &adds {
                i.mods.insert(
                    add.id.clone(),
                    add.version.clone().unwrap_or_else(|| "1.0.0".to_string()),
                );
                i.manifest.push(add.clone());
            }
            for id in &removes {
                i.mods.remove(id);
                i.manifest.retain(|entry| &entry.id != id);
            }
            for id in &updates {
                i.mods.insert(id.clone(), "2.0.0".to_string());
            }
        })
    }

    fn mods_per_page(&self) -> usize {
        self.data.lock().per_page.max(1)
    }

    async fn mod_count(&self) -> PlatformResult<usize> {
        self.record("mod_count".to_string());
        let data = self.data.lock();
        if data.fail_catalog {
            return Err(PlatformError::new("mod repository unreachable"));
        }
        Ok(data.catalog.len())
    }

    async fn mods_page(&self, page: usize) -> PlatformResult<Vec<ModInfo>> {
        self.pause().await;
        self.record(format!("mods_page {page}"));
        let data = self.data.lock();
        if data.fail_catalog {
            return Err(PlatformError::new("mod repository unreachable"));
        }
        let per_page = data.per_page.max(1);
        Ok(data
            .catalog
            .chunks(per_page)
            .nth(page)
            .map(|chunk| chunk.to_vec())
            .unwrap_or_default())
    }

    async fn loader_versions(&self) -> PlatformResult<Vec<LoaderVersion>> {
        self.record("loader_versions".to_string());
        Ok(self.data.lock().loaders.clone())
    }

    fn subscribe_downloads(&self) -> mpsc::UnboundedReceiver<DownloadEvent> {
        self.receiver
            .lock()
            .take()
            .unwrap_or_else(|| mpsc::unbounded_channel().1)
    }

    async fn is_game_running(&self) -> bool {
        self.data.lock().game_running
    }
}

/// Settings store that keeps everything in memory so tests can assert on what
/// the engine persisted.
#[derive(Default)]
pub struct MemorySettings(Mutex<AppSettings>);

impl MemorySettings {
    pub fn with(settings: AppSettings) -> Self {
        Self(Mutex::new(settings))
    }

    pub fn current(&self) -> AppSettings {
        self.0.lock().clone()
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> AppSettings {
        self.0.lock().clone()
    }

    fn save(&self, settings: &AppSettings) {
        *self.0.lock() = settings.clone();
    }
}

pub fn install_at(location: &str, version: &str) -> Install {
    Install {
        location: Utf8PathBuf::from(location),
        version: version.to_string(),
        mods: BTreeMap::new(),
        manifest: Vec::new(),
        profile: "modded".to_string(),
    }
}

pub fn profile(name: &str, items: &[&str]) -> Profile {
    Profile {
        name: name.to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn loader(version: &str, satisfactory_version: &str) -> LoaderVersion {
    LoaderVersion {
        version: version.to_string(),
        satisfactory_version: satisfactory_version.to_string(),
    }
}

pub fn mod_info(reference: &str, name: &str, versions: &[(&str, &str)]) -> ModInfo {
    ModInfo {
        mod_reference: reference.to_string(),
        name: name.to_string(),
        popularity: 0,
        hotness: 0,
        views: 0,
        downloads: 0,
        last_version_date: 0,
        versions: versions
            .iter()
            .map(|(version, sml)| ModVersion {
                version: version.to_string(),
                sml_version: sml.to_string(),
            })
            .collect(),
    }
}

/// One valid install on game 1.0.0, the two stock profiles, and a three-mod
/// catalog of which two work with loader 3.0.0.
pub fn base_data() -> FakeData {
    FakeData {
        scan: InstallScan {
            installs: vec![install_at("/games/a", "1.0.0")],
            invalid: Vec::new(),
        },
        profiles: vec![profile("vanilla", &[]), profile("modded", &[])],
        loaders: vec![loader("3.0.0", "1.0.0")],
        catalog: vec![
            mod_info("FicsitFarming", "Ficsit Farming", &[("1.2.0", "3.0.0")]),
            mod_info("RefinedPower", "Refined Power", &[("2.0.0", "^3.0.0")]),
            mod_info("LegacyMod", "Legacy Mod", &[("0.9.0", "1.5.0")]),
        ],
        per_page: 2,
        ..FakeData::default()
    }
}

pub fn engine_with(data: FakeData) -> (AppEngine, Arc<FakePlatform>, Arc<MemorySettings>) {
    engine_with_settings(data, AppSettings::default())
}

pub fn engine_with_settings(
    data: FakeData,
    settings: AppSettings,
) -> (AppEngine, Arc<FakePlatform>, Arc<MemorySettings>) {
    let platform = FakePlatform::new(data);
    let settings = Arc::new(MemorySettings::with(settings));
    let engine = AppEngine::new(platform.clone(), settings.clone());
    (engine, platform, settings)
}

/// Bootstraps the engine and advances past the app-load linger so the ledger
/// is idle again.
pub async fn init_settled(engine: &AppEngine) {
    engine.init_app().await;
    settle(EXCLUSIVE_LINGER).await;
}

/// Advances the paused clock and lets woken tasks run. Yields first so tasks
/// spawned just before the call get to register their timers; advancing
/// straight away would move the clock under them and their deadlines would
/// land in the future instead of firing.
pub async fn settle(duration: Duration) {
    tokio::task::yield_now().await;
    tokio::time::advance(duration).await;
    tokio::task::yield_now().await;
}
