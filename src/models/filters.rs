use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Category tabs of the mod list. Display strings are the tab captions.
#[derive(Display, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    #[display("All mods")]
    All,
    #[display("Compatible")]
    Compatible,
    #[display("Favourite")]
    Favourite,
    #[display("Installed")]
    Installed,
    #[display("Not installed")]
    NotInstalled,
}

/// Sort orders of the mod list. `Name` sorts ascending, everything else
/// descending on the corresponding metadata field.
#[derive(Display, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    #[display("Name")]
    Name,
    #[display("Last updated")]
    LastUpdated,
    #[display("Popularity")]
    Popularity,
    #[display("Hotness")]
    Hotness,
    #[display("Views")]
    Views,
    #[display("Downloads")]
    Downloads,
}

/// Current list projection: category, optional sort key, free-text search.
/// Starts unfiltered and unsorted; bootstrap restores the saved selection or
/// applies Compatible + LastUpdated.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FilterState {
    pub category: Category,
    pub sort_by: Option<SortKey>,
    #[serde(default)]
    pub search: String,
}

impl FilterState {
    /// The selection applied when nothing was persisted.
    pub fn bootstrap_default() -> Self {
        Self {
            category: Category::Compatible,
            sort_by: Some(SortKey::LastUpdated),
            search: String::new(),
        }
    }
}

/// Mod counts shown next to each category tab. `compatible`, `installed` and
/// `not_installed` follow every compatibility pass; `all` and `favourite` are
/// maintained by bootstrap and the favorite toggle.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub all: usize,
    pub compatible: usize,
    pub favourite: usize,
    pub installed: usize,
    pub not_installed: usize,
}
