use crate::models::error::AppError;
use crate::models::progress::{OperationGroup, Progress, ProgressItem};
use std::collections::HashMap;

/// Longest download name rendered in a progress message; longer names are
/// cut and given a trailing ellipsis.
pub const MAX_DOWNLOAD_NAME_LENGTH: usize = 25;

/// Identifies the group and placeholder item a guarded action is reporting
/// through.
#[derive(Clone, Debug)]
pub struct OperationTicket {
    pub group_id: String,
    pub item_id: String,
}

/// Bookkeeping for everything in flight: at most one exclusive operation
/// group, plus an always-present download group holding one item per resource
/// URL. The ledger is plain data behind the engine's state lock; all timing
/// (display lingers, delayed removals) is driven by the engine.
#[derive(Debug)]
pub struct OperationLedger {
    exclusive: Option<OperationGroup>,
    downloads: OperationGroup,
    download_items: HashMap<String, String>,
}

impl Default for OperationLedger {
    fn default() -> Self {
        Self {
            exclusive: None,
            downloads: OperationGroup::new("downloads"),
            download_items: HashMap::new(),
        }
    }
}

impl OperationLedger {
    /// True when anything at all is in flight, lingering download entries
    /// included. This is the pre-check guarded mod actions use.
    pub fn any_open(&self) -> bool {
        self.exclusive.is_some() || !self.downloads.items.is_empty()
    }

    /// True when an exclusive group is open. Selection flows use this to
    /// decide whether to skip validation.
    pub fn exclusive_open(&self) -> bool {
        self.exclusive.is_some()
    }

    /// Opens the exclusive group with an indeterminate placeholder showing
    /// `message`. Rejected while another exclusive group is open, lingering
    /// ones included.
    pub fn begin_exclusive(
        &mut self,
        label: &str,
        message: &str,
    ) -> Result<OperationTicket, AppError> {
        if self.exclusive.is_some() {
            return Err(AppError::OperationInProgress);
        }
        let mut group = OperationGroup::new(label);
        let placeholder = ProgressItem::indeterminate(message);
        let ticket = OperationTicket {
            group_id: group.id.clone(),
            item_id: placeholder.id.clone(),
        };
        group.items.push(placeholder);
        self.exclusive = Some(group);
        Ok(ticket)
    }

    /// Appends an indeterminate item to the open exclusive group, returning
    /// its id. No-op when the group id does not match the open group.
    pub fn add_item(&mut self, group_id: &str, message: &str) -> Option<String> {
        let group = self.exclusive.as_mut().filter(|g| g.id == group_id)?;
        let item = ProgressItem::indeterminate(message);
        let id = item.id.clone();
        group.items.push(item);
        Some(id)
    }

    pub fn update_item(
        &mut self,
        group_id: &str,
        item_id: &str,
        apply: impl FnOnce(&mut ProgressItem),
    ) {
        if let Some(group) = self.exclusive.as_mut().filter(|g| g.id == group_id) {
            if let Some(item) = group.item_mut(item_id) {
                apply(item);
            }
        }
    }

    pub fn complete_item(&mut self, ticket: &OperationTicket) {
        self.update_item(&ticket.group_id, &ticket.item_id, |item| {
            item.progress = Progress::complete();
        });
    }

    pub fn remove_item(&mut self, group_id: &str, item_id: &str) {
        if let Some(group) = self.exclusive.as_mut().filter(|g| g.id == group_id) {
            group.remove_item(item_id);
        }
    }

    /// Drops the exclusive group if it is still the given one. Called by the
    /// engine's deferred disposal task after the display linger. Download
    /// entries belong to the operation that spawned them, so any that never
    /// finished go with the group.
    pub fn close_exclusive(&mut self, group_id: &str) {
        if self.exclusive.as_ref().is_some_and(|g| g.id == group_id) {
            self.exclusive = None;
            self.clear_downloads();
        }
    }

    /// Records a download report. Creates the per-URL item on first sight,
    /// then rewrites its message and progress on every call. Returns the item
    /// id and whether this report completed the download, in which case the
    /// engine schedules the delayed removal.
    pub fn report_download(
        &mut self,
        url: &str,
        percent: f64,
        name: &str,
        version: &str,
    ) -> (String, bool) {
        let item_id = match self.download_items.get(url) {
            Some(id) => id.clone(),
            None => {
                let mut item = ProgressItem::indeterminate("");
                item.progress = Progress::Fraction(0.0);
                item.fast = true;
                let id = item.id.clone();
                self.downloads.items.push(item);
                self.download_items.insert(url.to_string(), id.clone());
                id
            }
        };
        let message = format!(
            "Downloading {} v{} {}%",
            limit_download_name(name),
            version,
            (percent * 100.0).round() as i64
        );
        if let Some(item) = self.downloads.item_mut(&item_id) {
            item.message = message;
            item.progress = Progress::from_percent(percent);
        }
        (item_id, percent >= 1.0)
    }

    /// Removes a download entry, but only while `item_id` is still the live
    /// entry for `url`; a fresh entry for the same URL must survive the
    /// removal scheduled for its predecessor.
    pub fn remove_download(&mut self, url: &str, item_id: &str) {
        if self.download_items.get(url).is_some_and(|id| id == item_id) {
            self.downloads.remove_item(item_id);
            self.download_items.remove(url);
        }
    }

    /// Clears every download entry. Guarded actions call this before they
    /// begin so stale entries do not outlive the work they belonged to.
    pub fn clear_downloads(&mut self) {
        self.downloads.items.clear();
        self.download_items.clear();
    }

    /// Snapshot of all visible groups: the exclusive one first, then the
    /// download group when it has anything to show.
    pub fn groups(&self) -> Vec<OperationGroup> {
        let mut groups = Vec::new();
        if let Some(exclusive) = &self.exclusive {
            groups.push(exclusive.clone());
        }
        if !self.downloads.items.is_empty() {
            groups.push(self.downloads.clone());
        }
        groups
    }
}

fn limit_download_name(name: &str) -> String {
    if name.chars().count() > MAX_DOWNLOAD_NAME_LENGTH {
        let cut: String = name.chars().take(MAX_DOWNLOAD_NAME_LENGTH - 3).collect();
        format!("{cut}...")
    } else {
        name.to_string()
    }
}
