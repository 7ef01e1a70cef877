//! ID generation for tasklist items
//!
//! Ids are assigned by the item service at creation and never change.

use uuid::Uuid;

/// Generate a unique item ID (hyphenated lowercase UUID v4)
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
