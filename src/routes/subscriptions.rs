use std::fmt::{Debug, Display};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::domain::{City, SubscriberEmail};
use crate::lifecycle::{SubscribeError, SubscriptionLifecycle};
use crate::routes::{banner_html, error_chain_fmt, set_flash, take_flash, FlashLevel};

#[derive(Debug, Deserialize)]
pub struct FormData {
    email: String,
    city: String,
}

/// Renders the subscription form along with any pending flash banner.
pub async fn subscribe_form(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Subscribe to the daily weather</title>
</head>
<body>
    {}
    <h1>Subscribe to the daily weather</h1>
    <form action="/subscribe" method="post">
        <label>Email
            <input type="email" placeholder="you@example.com" name="email">
        </label>
        <label>City
            <input type="text" placeholder="Hanoi" name="city">
        </label>
        <button type="submit">Subscribe</button>
    </form>
</body>
</html>"#,
        banner_html(&flash)
    );
    (jar, Html(body))
}

#[tracing::instrument(
    name = "Adding a new weather subscriber",
    skip(lifecycle, jar, form),
    fields(
        subscriber_email = %form.email,
        city = %form.city
    ),
)]
pub async fn subscribe(
    State(lifecycle): State<SubscriptionLifecycle>,
    jar: CookieJar,
    Form(form): Form<FormData>,
) -> Result<(CookieJar, Redirect), SubscribeHandlerError> {
    let email =
        SubscriberEmail::parse(form.email).map_err(SubscribeHandlerError::ValidationError)?;
    let city = City::parse(form.city).map_err(SubscribeHandlerError::ValidationError)?;

    match lifecycle.subscribe(email, city).await {
        Ok(()) => Ok((
            set_flash(
                jar,
                FlashLevel::Success,
                "Please check your email to confirm registration.",
            ),
            Redirect::to("/subscribe"),
        )),
        Err(SubscribeError::AlreadySubscribed) => Ok((
            set_flash(jar, FlashLevel::Error, "Email has already been registered."),
            Redirect::to("/subscribe"),
        )),
        Err(error) => Err(SubscribeHandlerError::UnexpectedError(error)),
    }
}

pub enum SubscribeHandlerError {
    ValidationError(String),
    UnexpectedError(SubscribeError),
}

impl Debug for SubscribeHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl Display for SubscribeHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscribeHandlerError::ValidationError(e) => write!(f, "{}", e),
            SubscribeHandlerError::UnexpectedError(_) => {
                write!(f, "Failed to register a new subscriber")
            }
        }
    }
}

impl std::error::Error for SubscribeHandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubscribeHandlerError::ValidationError(_) => None,
            SubscribeHandlerError::UnexpectedError(e) => Some(e),
        }
    }
}

impl IntoResponse for SubscribeHandlerError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:?}", self);
        match self {
            SubscribeHandlerError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeHandlerError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}
