use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{SubscriberEmail, Subscription, UnsubscribeToken};
use crate::storage::{StoreError, SubscriptionStore};

/// Store backing the integration-test harness. Mirrors the Postgres
/// implementation's semantics, including unique-violation reporting for
/// both the email key and the token.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    records: Mutex<HashMap<String, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, for test assertions.
    pub fn all(&self) -> Vec<Subscription> {
        self.records
            .lock()
            .expect("subscription store mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StoreError> {
        let records = self
            .records
            .lock()
            .expect("subscription store mutex poisoned");
        Ok(records.get(email.as_ref()).cloned())
    }

    async fn find_by_token(
        &self,
        token: &UnsubscribeToken,
    ) -> Result<Option<Subscription>, StoreError> {
        let records = self
            .records
            .lock()
            .expect("subscription store mutex poisoned");
        Ok(records
            .values()
            .find(|s| s.unsubscribe_token == *token)
            .cloned())
    }

    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .expect("subscription store mutex poisoned");
        let email_taken = records.contains_key(subscription.email.as_ref());
        let token_taken = records
            .values()
            .any(|s| s.unsubscribe_token == subscription.unsubscribe_token);
        if email_taken || token_taken {
            return Err(StoreError::UniqueViolation);
        }
        records.insert(subscription.email.as_ref().to_string(), subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .expect("subscription store mutex poisoned");
        if let Some(existing) = records.get_mut(subscription.email.as_ref()) {
            *existing = subscription.clone();
        }
        Ok(())
    }
}
