use chrono::{Duration, Utc};
use reqwest::StatusCode;

use crate::helpers::App;

fn verify_url(app: &App, email: &str, token: &str, expires: i64, signature: &str) -> String {
    format!(
        "http://{}/verify?email={}&token={}&expires={}&signature={}",
        app.address,
        urlencoding::encode(email),
        token,
        expires,
        signature,
    )
}

#[tokio::test]
async fn verify_without_parameters_is_rejected_with_400() {
    let app = App::new().await;

    let response = app.get("/verify").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn the_emailed_link_activates_the_subscription() {
    let app = App::new().await;
    app.mount_email_mock().await;

    app.post_subscribe(&[("email", "a@x.com"), ("city", "Hanoi")])
        .await;
    let links = app.last_confirmation_links().await;

    let response = app.get_url(links.in_html).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");

    let records = app.store.all();
    assert!(records[0].is_subscribed);
    assert_eq!(
        app.jobs.enqueued(),
        vec![("a@x.com".to_string(), "Hanoi".to_string())]
    );

    let html = app.home_page_html().await;
    assert!(html.contains("Your subscription has been confirmed."));
}

#[tokio::test]
async fn verify_with_an_expired_signature_is_rejected_with_401() {
    let app = App::new().await;
    app.mount_email_mock().await;

    app.post_subscribe(&[("email", "a@x.com"), ("city", "Hue")])
        .await;
    let record = app.store.all().remove(0);

    // Correctly signed, but the embedded expiry is 61 minutes in the past.
    let signed = app.signer.sign_expiring_at(
        &record.email,
        &record.unsubscribe_token,
        Utc::now() - Duration::minutes(61),
    );
    let url = verify_url(
        &app,
        record.email.as_ref(),
        record.unsubscribe_token.as_ref(),
        signed.expires,
        &signed.signature,
    );

    let response = app.client.get(url).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!app.store.all()[0].is_subscribed);
    assert!(app.jobs.enqueued().is_empty());
}

#[tokio::test]
async fn verify_with_a_tampered_email_is_rejected_with_401() {
    let app = App::new().await;
    app.mount_email_mock().await;

    app.post_subscribe(&[("email", "a@x.com"), ("city", "Hue")])
        .await;
    let record = app.store.all().remove(0);
    let signed = app.signer.sign(&record.email, &record.unsubscribe_token);

    // Same signature, different email.
    let url = verify_url(
        &app,
        "b@x.com",
        record.unsubscribe_token.as_ref(),
        signed.expires,
        &signed.signature,
    );

    let response = app.client.get(url).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!app.store.all()[0].is_subscribed);
}

#[tokio::test]
async fn a_link_from_before_a_token_rotation_does_not_activate() {
    let app = App::new().await;
    app.mount_email_mock().await;
    let parameter = [("email", "a@x.com"), ("city", "Hue")];

    app.post_subscribe(&parameter).await;
    let first_links = app.last_confirmation_links().await;

    // A second subscribe rotates the token and invalidates the first link.
    app.post_subscribe(&parameter).await;

    let response = app.get_url(first_links.in_html).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/subscribe");
    assert!(!app.store.all()[0].is_subscribed);

    let html = app.subscribe_page_html().await;
    assert!(html.contains("This confirmation link is no longer valid."));
}

#[tokio::test]
async fn verify_for_an_unknown_email_does_not_reveal_registration_state() {
    let app = App::new().await;

    let email = weathermail::domain::SubscriberEmail::parse("ghost@x.com".to_string()).unwrap();
    let token = weathermail::domain::UnsubscribeToken::generate();
    let signed = app.signer.sign(&email, &token);
    let url = verify_url(
        &app,
        email.as_ref(),
        token.as_ref(),
        signed.expires,
        &signed.signature,
    );

    let response = app.client.get(url).send().await.unwrap();

    // Indistinguishable from a successful verification.
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");
    assert!(app.store.all().is_empty());
    assert!(app.jobs.enqueued().is_empty());
}
