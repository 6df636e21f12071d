use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{SubscriberEmail, Subscription};
use crate::email_client::EmailClient;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to send confirmation email")]
    SendEmail(#[from] reqwest::Error),
    #[error("failed to enqueue the recurring weather email")]
    Enqueue(#[source] sqlx::Error),
}

/// Outbound side effects of the subscription lifecycle. The lifecycle hands
/// off here and never waits on anything beyond the send/enqueue call itself;
/// delivery retries are the collaborator's concern.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_confirmation(
        &self,
        recipient: &SubscriberEmail,
        verify_url: &str,
    ) -> Result<(), DispatchError>;

    /// Enqueues the subscription for the recurring daily weather email.
    async fn schedule_recurring(&self, subscription: &Subscription) -> Result<(), DispatchError>;
}

/// Queue seam for the daily weather job. The job runner that drains the
/// queue lives outside this crate.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue_daily_weather(&self, subscription: &Subscription)
        -> Result<(), DispatchError>;
}

/// Production dispatcher: confirmation emails go out through the
/// transactional email API, recurring jobs land in the queue.
pub struct EmailNotificationDispatcher {
    email_client: EmailClient,
    queue: Arc<dyn JobQueue>,
}

impl EmailNotificationDispatcher {
    pub fn new(email_client: EmailClient, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            email_client,
            queue,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for EmailNotificationDispatcher {
    #[tracing::instrument(
        name = "Send a confirmation email",
        skip(self, verify_url),
        fields(subscriber_email = %recipient)
    )]
    async fn send_confirmation(
        &self,
        recipient: &SubscriberEmail,
        verify_url: &str,
    ) -> Result<(), DispatchError> {
        self.email_client
            .send_email(
                recipient,
                "Confirm your registration",
                &format!(
                    "Welcome to your daily weather email!<br />\
                     Click <a href=\"{}\">here</a> to confirm your registration. \
                     The link is valid for 60 minutes.",
                    verify_url
                ),
                &format!(
                    "Welcome to your daily weather email!\n\
                     Visit {} to confirm your registration. \
                     The link is valid for 60 minutes.",
                    verify_url
                ),
            )
            .await?;
        Ok(())
    }

    #[tracing::instrument(
        name = "Enqueue recurring weather email",
        skip(self, subscription),
        fields(subscriber_email = %subscription.email, city = %subscription.city)
    )]
    async fn schedule_recurring(&self, subscription: &Subscription) -> Result<(), DispatchError> {
        self.queue.enqueue_daily_weather(subscription).await
    }
}

/// Postgres-backed queue. Re-verifying the same email refreshes the row
/// instead of duplicating it.
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue_daily_weather(
        &self,
        subscription: &Subscription,
    ) -> Result<(), DispatchError> {
        sqlx::query(
            "INSERT INTO daily_weather_jobs (email, city, enqueued_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (email) DO UPDATE SET city = EXCLUDED.city, enqueued_at = now()",
        )
        .bind(subscription.email.as_ref())
        .bind(subscription.city.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            tracing::error!("Failed to execute query: {:?}", error);
            DispatchError::Enqueue(error)
        })?;

        Ok(())
    }
}

/// Queue used by the test harness: records what was enqueued.
#[derive(Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<(String, String)>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(email, city)` pairs enqueued so far.
    pub fn enqueued(&self) -> Vec<(String, String)> {
        self.jobs.lock().expect("job queue mutex poisoned").clone()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue_daily_weather(
        &self,
        subscription: &Subscription,
    ) -> Result<(), DispatchError> {
        self.jobs.lock().expect("job queue mutex poisoned").push((
            subscription.email.as_ref().to_string(),
            subscription.city.as_ref().to_string(),
        ));
        Ok(())
    }
}
