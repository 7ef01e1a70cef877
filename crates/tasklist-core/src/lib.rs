//! tasklist-core: Core library for the tasklist client
//!
//! Holds the local mirror of server-confirmed items, the filter used to
//! derive the visible subset, and the sync client that talks to the item
//! service. The store only changes after the service acknowledges a call.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod id;
pub mod item;
pub mod store;
pub mod view;

pub use client::{HttpItemApi, ItemApi, SyncClient};
pub use config::Config;
pub use error::Error;
pub use filter::{ItemFilter, matches};
pub use id::generate_id;
pub use item::{Item, ItemDraft, ItemUpdate, Priority};
pub use store::{ChangeEvent, CollectionChangeListener, ItemStore, SubscriptionId};
pub use view::FilteredView;

/// Result type for tasklist operations
pub type Result<T> = std::result::Result<T, Error>;
