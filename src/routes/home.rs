use axum::response::{Html, IntoResponse};
use axum_extra::extract::CookieJar;

use crate::routes::{banner_html, take_flash};

/// Landing page; the post-verification redirect target.
pub async fn index(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Daily weather</title>
</head>
<body>
    {}
    <h1>Daily weather</h1>
    <p>Get a weather report for your city in your inbox, every morning.</p>
    <a href="/subscribe">Subscribe</a>
</body>
</html>"#,
        banner_html(&flash)
    );
    (jar, Html(body))
}
