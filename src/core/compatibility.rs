use crate::models::filters::CategoryCounts;
use crate::models::install::{Install, LoaderVersion};
use crate::models::mod_entry::{ModEntry, ModVersion};
use crate::utils::version;
use semver::Version;

/// Loader releases below this are legacy and never considered.
fn loader_floor() -> Version {
    Version::new(2, 0, 0)
}

/// Recomputes the derived flags of every catalog entry from the active
/// install and the known loader releases. Total: with no install every entry
/// is simply not installed and not compatible, and malformed version strings
/// fail their comparison instead of erroring.
pub fn recompute(mods: &mut [ModEntry], install: Option<&Install>, loaders: &[LoaderVersion]) {
    for entry in mods.iter_mut() {
        let reference = entry.info.mod_reference.clone();
        entry.is_installed = install.is_some_and(|i| i.mods.contains_key(&reference));
        entry.installed_version = install.and_then(|i| i.mods.get(&reference).cloned());
        entry.manifest_version =
            install.and_then(|i| i.manifest_version(&reference).map(str::to_string));
        entry.is_dependency =
            entry.is_installed && !install.is_some_and(|i| i.in_manifest(&reference));
        entry.is_compatible = match install {
            Some(install) => is_compatible(&entry.info.versions, install, loaders),
            None => false,
        };
    }
}

/// A mod is compatible when at least one of its versions works with the
/// install: its loader requirement is at or above the floor, a known loader
/// release matches it after normalization, and the install's game version
/// meets that release's minimum.
fn is_compatible(versions: &[ModVersion], install: &Install, loaders: &[LoaderVersion]) -> bool {
    versions
        .iter()
        .any(|v| version_usable(v, install, loaders))
}

fn version_usable(v: &ModVersion, install: &Install, loaders: &[LoaderVersion]) -> bool {
    if !version::meets_floor(&v.sml_version, &loader_floor()) {
        return false;
    }
    loaders.iter().any(|lv| {
        version::coerced_eq(&lv.version, &v.sml_version)
            && version::at_least(&install.version, &lv.satisfactory_version)
    })
}

/// Refreshes the counters owned by the compatibility pass. `all` and
/// `favourite` are maintained elsewhere (bootstrap and the favorite toggle).
pub fn refresh_counts(counts: &mut CategoryCounts, mods: &[ModEntry]) {
    counts.compatible = mods.iter().filter(|m| m.is_compatible).count();
    counts.installed = mods.iter().filter(|m| m.is_installed).count();
    counts.not_installed = mods.iter().filter(|m| !m.is_installed).count();
}
