//! Item data model for tasklist
//!
//! JSON shape matches the item service:
//! `{id, name, completed, priority: 1|2|3, category, due_date: "YYYY-MM-DD"|null}`

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Item priority, serialized as its bare level number
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Numeric level (1..=3)
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            _ => Err(crate::Error::InvalidPriority(value.to_string())),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.level()
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "low" => Ok(Priority::Low),
            "2" | "medium" | "med" => Ok(Priority::Medium),
            "3" | "high" => Ok(Priority::High),
            _ => Err(crate::Error::InvalidPriority(s.to_string())),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// A single task record as last confirmed by the item service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Service-assigned identifier, immutable
    pub id: String,

    /// Display text
    pub name: String,

    /// Completion flag
    #[serde(default)]
    pub completed: bool,

    pub priority: Priority,

    /// Free-form category; empty means uncategorized
    #[serde(default)]
    pub category: String,

    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<NaiveDate>,
}

impl Item {
    /// Build an item from a draft, the way the service does on create
    pub fn from_draft(id: String, draft: ItemDraft) -> Self {
        Self {
            id,
            name: draft.name,
            completed: false,
            priority: draft.priority,
            category: draft.category,
            due_date: draft.due_date,
        }
    }

    /// Full update that flips the completion flag and keeps everything else
    pub fn toggled(&self) -> ItemUpdate {
        ItemUpdate {
            completed: !self.completed,
            ..ItemUpdate::from(self)
        }
    }

    /// Overwrite all mutable fields with `update`; the id is kept
    pub fn apply(&mut self, update: ItemUpdate) {
        self.name = update.name;
        self.completed = update.completed;
        self.priority = update.priority;
        self.category = update.category;
        self.due_date = update.due_date;
    }

    /// Whole days from `today` until the due date, negative once overdue
    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category.is_empty()
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.completed { "x" } else { " " };
        write!(f, "[{}] {} ({}) - {}", mark, self.id, self.priority, self.name)?;
        if !self.category.is_empty() {
            write!(f, " #{}", self.category)?;
        }
        Ok(())
    }
}

/// Body of a create request; the service assigns `id` and `completed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<NaiveDate>,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: Priority::default(),
            category: String::new(),
            due_date: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }
}

/// Body of an update request
///
/// Always carries every mutable field: the service replaces the whole
/// record, so a missing category or due date would clear it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: String,
    pub completed: bool,
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<NaiveDate>,
}

impl From<&Item> for ItemUpdate {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            completed: item.completed,
            priority: item.priority,
            category: item.category.clone(),
            due_date: item.due_date,
        }
    }
}

/// Parse a `YYYY-MM-DD` date; an empty string means no date
pub fn parse_due_date(s: &str) -> crate::Result<Option<NaiveDate>> {
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(Some)
        .map_err(|_| crate::Error::InvalidDate(s.to_string()))
}

/// Accepts `null`, a missing field, `""` (what an untouched date input
/// posts) or a `YYYY-MM-DD` string.
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_due_date(&s).map_err(serde::de::Error::custom),
    }
}
