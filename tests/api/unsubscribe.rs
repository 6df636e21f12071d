use reqwest::StatusCode;

use crate::helpers::App;

#[tokio::test]
async fn the_full_lifecycle_round_trips() {
    let app = App::new().await;
    app.mount_email_mock().await;

    // Subscribe, then confirm through the emailed link.
    app.post_subscribe(&[("email", "a@x.com"), ("city", "Hanoi")])
        .await;
    let links = app.last_confirmation_links().await;
    app.get_url(links.in_html).await;
    assert!(app.store.all()[0].is_subscribed);

    // Unsubscribe through the token link.
    let token = app.store.all()[0].unsubscribe_token.clone();
    let response = app.get(&format!("/unsubscribe/{}", token.as_ref())).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");

    let records = app.store.all();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_subscribed);

    let html = app.home_page_html().await;
    assert!(html.contains("You have successfully unsubscribed."));
}

#[tokio::test]
async fn an_unknown_token_flashes_an_error_and_mutates_nothing() {
    let app = App::new().await;
    app.mount_email_mock().await;
    app.post_subscribe(&[("email", "a@x.com"), ("city", "Hue")])
        .await;

    let unknown_token = "A".repeat(32);
    let response = app.get(&format!("/unsubscribe/{}", unknown_token)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = app.home_page_html().await;
    assert!(html.contains("The unsubscribe link is not valid."));

    let records = app.store.all();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_subscribed);
}

#[tokio::test]
async fn a_malformed_token_is_reported_like_an_unknown_one() {
    let app = App::new().await;

    let response = app.get("/unsubscribe/too-short").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = app.home_page_html().await;
    assert!(html.contains("The unsubscribe link is not valid."));
}

#[tokio::test]
async fn the_unsubscribe_link_stays_valid_after_use() {
    let app = App::new().await;
    app.mount_email_mock().await;

    app.post_subscribe(&[("email", "a@x.com"), ("city", "Hue")])
        .await;
    let links = app.last_confirmation_links().await;
    app.get_url(links.in_html).await;

    let token = app.store.all()[0].unsubscribe_token.clone();
    let path = format!("/unsubscribe/{}", token.as_ref());

    let first = app.get(&path).await;
    let second = app.get(&path).await;

    // Repeat use is a harmless no-op; the token is never rotated or cleared.
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    assert_eq!(second.status(), StatusCode::SEE_OTHER);

    let records = app.store.all();
    assert!(!records[0].is_subscribed);
    assert_eq!(records[0].unsubscribe_token, token);
}
