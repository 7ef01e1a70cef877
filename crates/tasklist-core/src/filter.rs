//! Priority and category filtering
//!
//! A filter never touches the store; it derives a transient view from a
//! snapshot. Priority `0` and an empty category are wildcards.

use crate::Item;
use serde::{Deserialize, Serialize};

/// Priority filter value that matches every item
pub const ANY_PRIORITY: i64 = 0;

/// Inclusion test combining both criteria with a logical AND.
///
/// Total over all integers: a priority filter outside `0..=3` matches
/// nothing. Category comparison is exact and case-sensitive.
pub fn matches(item: &Item, priority: i64, category: &str) -> bool {
    let priority_ok = priority == ANY_PRIORITY || i64::from(item.priority.level()) == priority;
    let category_ok = category.is_empty() || item.category == category;
    priority_ok && category_ok
}

/// Filter parameters currently applied to the list
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemFilter {
    /// 0 = all, otherwise an exact priority level
    pub priority: i64,
    /// Empty = all, otherwise an exact category
    pub category: String,
}

impl ItemFilter {
    pub fn new(priority: i64, category: impl Into<String>) -> Self {
        Self {
            priority,
            category: category.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        matches(item, self.priority, &self.category)
    }

    /// Items passing the filter, in their original order
    pub fn apply(&self, items: &[Item]) -> Vec<Item> {
        items.iter().filter(|i| self.matches(i)).cloned().collect()
    }

    /// Whether either criterion narrows the list
    pub fn is_active(&self) -> bool {
        self.priority != ANY_PRIORITY || !self.category.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemDraft, Priority};

    fn item(priority: Priority, category: &str) -> Item {
        Item::from_draft(
            format!("{}-{}", priority.level(), category),
            ItemDraft::new("task")
                .with_priority(priority)
                .with_category(category),
        )
    }

    #[test]
    fn test_wildcards_match_everything() {
        for priority in Priority::ALL {
            for category in ["", "home", "Work"] {
                assert!(matches(&item(priority, category), 0, ""));
            }
        }
    }

    #[test]
    fn test_conjunction() {
        let it = item(Priority::Medium, "home");
        assert!(matches(&it, 2, "home"));
        assert!(matches(&it, 0, "home"));
        assert!(matches(&it, 2, ""));
        assert!(matches(&it, 0, ""));
        assert!(!matches(&it, 1, "home"));
        assert!(!matches(&it, 2, "work"));
    }

    #[test]
    fn test_category_is_exact() {
        let it = item(Priority::Low, "home");
        assert!(!matches(&it, 0, "Home"));
        assert!(!matches(&it, 0, "hom"));
        assert!(!matches(&it, 0, " home"));
    }

    #[test]
    fn test_out_of_range_priority_matches_nothing() {
        for priority in Priority::ALL {
            let it = item(priority, "");
            for filter in [-1, 4, 99, i64::MIN, i64::MAX] {
                assert!(!matches(&it, filter, ""));
            }
        }
    }

    #[test]
    fn test_apply_preserves_order() {
        let items = vec![
            item(Priority::High, "a"),
            item(Priority::Low, "b"),
            item(Priority::High, "c"),
        ];
        let filter = ItemFilter::new(3, "");
        let visible = filter.apply(&items);
        let ids: Vec<_> = visible.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["3-a", "3-c"]);
    }

    #[test]
    fn test_is_active_and_clear() {
        let mut filter = ItemFilter::default();
        assert!(!filter.is_active());

        filter.category = "home".to_string();
        assert!(filter.is_active());

        filter.clear();
        assert_eq!(filter, ItemFilter::default());

        assert!(ItemFilter::new(1, "").is_active());
    }
}
