//! Entity trait: identity + lifecycle shared by every catalog record.

use chrono::{DateTime, Utc};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone
        + Eq
        + Ord
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + Send
        + Sync
        + 'static;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Soft-delete flag. Inactive entities are hidden from default listings.
    fn is_active(&self) -> bool;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;
}
