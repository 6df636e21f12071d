use std::sync::Arc;

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::routing::get;
use axum::Router;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::dispatch::{EmailNotificationDispatcher, PgJobQueue};
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::lifecycle::SubscriptionLifecycle;
use crate::routes::{check_health, index, subscribe, subscribe_form, unsubscribe, verify};
use crate::signed_link::LinkSigner;
use crate::storage::PgSubscriptionStore;

pub async fn run(listener: TcpListener, lifecycle: SubscriptionLifecycle) {
    let app = router(lifecycle);

    axum::serve(listener, app)
        .await
        .expect("Failed to start up the application");
}

pub fn router(lifecycle: SubscriptionLifecycle) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health_check", get(check_health))
        .route("/subscribe", get(subscribe_form).post(subscribe))
        .route("/verify", get(verify))
        .route("/unsubscribe/:token", get(unsubscribe))
        .with_state(lifecycle)
        .layer(
            // Refer to https://github.com/tokio-rs/axum/blob/main/examples/tracing-aka-logging/Cargo.toml
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);
                tracing::info_span!(
                    "Starting HTTP request",
                    method = ?request.method(),
                    path,
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
}

/// Wires the production lifecycle: Postgres store and job queue, the
/// transactional email client, and the HMAC link signer.
pub fn get_lifecycle(configuration: &Settings) -> anyhow::Result<SubscriptionLifecycle> {
    let pool = PgPool::connect_lazy(
        configuration
            .database
            .connection_string()
            .expose_secret(),
    )?;

    let store = Arc::new(PgSubscriptionStore::new(pool.clone()));

    let sender = SubscriberEmail::parse(configuration.email_client.sender_email.clone())
        .map_err(|e| anyhow::anyhow!("Invalid sender email: {}", e))?;
    let email_client = EmailClient::new(
        configuration.email_client.base_url.clone(),
        sender,
        configuration.email_client.authorization_token.clone(),
        configuration.email_client.timeout(),
    );
    let queue = Arc::new(PgJobQueue::new(pool));
    let dispatcher = Arc::new(EmailNotificationDispatcher::new(email_client, queue));

    let signer = LinkSigner::new(&configuration.signing.secret)?;

    Ok(SubscriptionLifecycle::new(
        store,
        dispatcher,
        signer,
        configuration.application.base_url.clone(),
    ))
}
