use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::{City, SubscriberEmail, Subscription, UnsubscribeToken};
use crate::storage::{StoreError, SubscriptionStore};

pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: PgRow) -> Result<Subscription, StoreError> {
        let email: String = row.try_get("email")?;
        let city: String = row.try_get("city")?;
        let is_subscribed: bool = row.try_get("is_subscribed")?;
        let unsubscribe_token: String = row.try_get("unsubscribe_token")?;

        Ok(Subscription {
            email: SubscriberEmail::parse(email).map_err(StoreError::Corrupted)?,
            city: City::parse(city).map_err(StoreError::Corrupted)?,
            is_subscribed,
            unsubscribe_token: UnsubscribeToken::parse(unsubscribe_token)
                .map_err(StoreError::Corrupted)?,
        })
    }
}

fn into_store_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(database_error) = &error {
        if database_error.is_unique_violation() {
            return StoreError::UniqueViolation;
        }
    }
    tracing::error!("Failed to execute query: {:?}", error);
    StoreError::Database(error)
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    #[tracing::instrument(name = "Fetch subscription by email", skip(self))]
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query(
            "SELECT email, city, is_subscribed, unsubscribe_token \
             FROM subscriptions WHERE email = $1",
        )
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(into_store_error)?;

        row.map(Self::from_row).transpose()
    }

    #[tracing::instrument(name = "Fetch subscription by token", skip(self, token))]
    async fn find_by_token(
        &self,
        token: &UnsubscribeToken,
    ) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query(
            "SELECT email, city, is_subscribed, unsubscribe_token \
             FROM subscriptions WHERE unsubscribe_token = $1",
        )
        .bind(token.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(into_store_error)?;

        row.map(Self::from_row).transpose()
    }

    #[tracing::instrument(
        name = "Insert new subscription",
        skip(self, subscription),
        fields(subscriber_email = %subscription.email)
    )]
    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO subscriptions \
             (email, city, is_subscribed, unsubscribe_token, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, now(), now())",
        )
        .bind(subscription.email.as_ref())
        .bind(subscription.city.as_ref())
        .bind(subscription.is_subscribed)
        .bind(subscription.unsubscribe_token.as_ref())
        .execute(&self.pool)
        .await
        .map_err(into_store_error)?;

        Ok(())
    }

    #[tracing::instrument(
        name = "Update subscription",
        skip(self, subscription),
        fields(subscriber_email = %subscription.email)
    )]
    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE subscriptions \
             SET city = $2, is_subscribed = $3, unsubscribe_token = $4, updated_at = now() \
             WHERE email = $1",
        )
        .bind(subscription.email.as_ref())
        .bind(subscription.city.as_ref())
        .bind(subscription.is_subscribed)
        .bind(subscription.unsubscribe_token.as_ref())
        .execute(&self.pool)
        .await
        .map_err(into_store_error)?;

        Ok(())
    }
}
