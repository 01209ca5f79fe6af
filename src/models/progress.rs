use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Completion state of one progress item. Serialized as a bare fraction with
/// `-1` standing in for indeterminate, which is what the progress bars expect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Progress {
    Indeterminate,
    Fraction(f64),
}

impl Progress {
    pub fn complete() -> Self {
        Progress::Fraction(1.0)
    }

    pub fn from_percent(percent: f64) -> Self {
        Progress::Fraction(percent.clamp(0.0, 1.0))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Progress::Fraction(f) if *f >= 1.0)
    }

    /// Adds `by` to the current fraction, clamped to 1. An indeterminate item
    /// becomes a determinate one starting from zero.
    pub fn advance(&mut self, by: f64) {
        let current = match self {
            Progress::Fraction(f) => *f,
            Progress::Indeterminate => 0.0,
        };
        *self = Progress::Fraction((current + by).clamp(0.0, 1.0));
    }
}

impl Serialize for Progress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Progress::Indeterminate => serializer.serialize_f64(-1.0),
            Progress::Fraction(f) => serializer.serialize_f64(*f),
        }
    }
}

/// One line of the progress tree.
#[derive(Serialize, Clone, Debug)]
pub struct ProgressItem {
    pub id: String,
    pub progress: Progress,
    pub message: String,
    pub fast: bool,
}

impl ProgressItem {
    pub fn indeterminate(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            progress: Progress::Indeterminate,
            message: message.into(),
            fast: false,
        }
    }
}

/// A batch of progress items belonging to one operation. The label names the
/// operation for display grouping; item ids are unique within the group.
#[derive(Serialize, Clone, Debug)]
pub struct OperationGroup {
    pub id: String,
    pub label: String,
    pub items: Vec<ProgressItem>,
}

impl OperationGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            items: Vec::new(),
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&ProgressItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut ProgressItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    pub fn remove_item(&mut self, item_id: &str) {
        self.items.retain(|item| item.id != item_id);
    }
}
