use crate::models::filters::{Category, FilterState, SortKey};
use crate::models::mod_entry::ModEntry;
use std::collections::BTreeSet;

/// Builds the display list: category filter, then search, then sort. Pure and
/// recomputed on demand; the result is an owned copy the caller may keep
/// while the catalog moves on. With no sort key the catalog order is kept.
pub fn view(
    mods: &[ModEntry],
    filters: &FilterState,
    favorites: &BTreeSet<String>,
) -> Vec<ModEntry> {
    let search = filters.search.to_lowercase();
    let mut result: Vec<ModEntry> = mods
        .iter()
        .filter(|entry| in_category(entry, filters.category, favorites))
        .filter(|entry| search.is_empty() || entry.info.name.to_lowercase().contains(&search))
        .cloned()
        .collect();

    if let Some(key) = filters.sort_by {
        sort(&mut result, key);
    }
    result
}

fn in_category(entry: &ModEntry, category: Category, favorites: &BTreeSet<String>) -> bool {
    match category {
        Category::All => true,
        Category::Compatible => entry.is_compatible,
        Category::Favourite => favorites.contains(entry.reference()),
        Category::Installed => entry.is_installed,
        Category::NotInstalled => !entry.is_installed,
    }
}

/// Name sorts ascending, case-insensitively; every numeric key sorts
/// descending. Sorting is stable, so equal keys keep catalog order.
fn sort(mods: &mut [ModEntry], key: SortKey) {
    match key {
        SortKey::Name => mods.sort_by(|a, b| {
            a.info
                .name
                .to_lowercase()
                .cmp(&b.info.name.to_lowercase())
        }),
        SortKey::LastUpdated => {
            mods.sort_by(|a, b| b.info.last_version_date.cmp(&a.info.last_version_date))
        }
        SortKey::Popularity => mods.sort_by(|a, b| b.info.popularity.cmp(&a.info.popularity)),
        SortKey::Hotness => mods.sort_by(|a, b| b.info.hotness.cmp(&a.info.hotness)),
        SortKey::Views => mods.sort_by(|a, b| b.info.views.cmp(&a.info.views)),
        SortKey::Downloads => mods.sort_by(|a, b| b.info.downloads.cmp(&a.info.downloads)),
    }
}

/// Favourite-tab count: favorites actually present in the catalog. Dangling
/// favorite references are kept in the set but never counted.
pub fn favourite_count(mods: &[ModEntry], favorites: &BTreeSet<String>) -> usize {
    mods.iter()
        .filter(|entry| favorites.contains(entry.reference()))
        .count()
}
