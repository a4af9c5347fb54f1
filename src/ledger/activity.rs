use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use uuid::Uuid;

/// Capacity ceiling for a single calendar date.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Classification of an activity. The set is closed: grouping, colors and
/// labels are all keyed off this enum, so there is no free-form category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Sleep,
    Exercise,
    Study,
    Entertainment,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Sleep,
        Category::Exercise,
        Category::Study,
        Category::Entertainment,
        Category::Other,
    ];
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Work => "work",
            Category::Sleep => "sleep",
            Category::Exercise => "exercise",
            Category::Study => "study",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
        };
        write!(f, "{name}")
    }
}

/// A single logged time block. This is also the struct stored on disk: the
/// field names mirror the document format (`duration`, `createdAt`), so a
/// previously exported collection reads back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub date: NaiveDate,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

/// Caller-supplied fields for a new activity. Id and creation timestamp are
/// assigned by the ledger.
#[derive(Debug, Clone)]
pub struct ActivityDraft {
    pub name: String,
    pub category: Category,
    pub duration_minutes: u32,
    pub date: NaiveDate,
}

/// Partial update for an existing activity. `date` is deliberately absent:
/// an activity cannot move to another date through update.
#[derive(Debug, Clone, Default)]
pub struct ActivityPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub duration_minutes: Option<u32>,
}

impl ActivityPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none() && self.duration_minutes.is_none()
    }
}

/// Derived projection of the ledger for one date. Computed on demand,
/// never persisted.
#[derive(Debug, Clone)]
pub struct DayView {
    pub date: NaiveDate,
    pub activities: Vec<Activity>,
    pub total_minutes: u32,
    pub remaining_minutes: u32,
}
