mod memory;
mod postgres;

pub use memory::InMemorySubscriptionStore;
pub use postgres::PgSubscriptionStore;

use async_trait::async_trait;

use crate::domain::{SubscriberEmail, Subscription, UnsubscribeToken};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a record with the same unique key already exists")]
    UniqueViolation,
    #[error("stored record failed domain validation: {0}")]
    Corrupted(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Repository seam for subscription records. The lifecycle reads a value,
/// decides, and writes the value back; it never mutates live storage state
/// in place.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StoreError>;

    async fn find_by_token(
        &self,
        token: &UnsubscribeToken,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Inserts a new record. Reports `UniqueViolation` if a record for the
    /// same email already exists, so callers can retry as an update.
    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError>;

    /// Replaces the record keyed by the subscription's email. A missing
    /// record is a no-op, matching SQL `UPDATE` semantics.
    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError>;
}
