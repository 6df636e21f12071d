use std::fmt::{Debug, Display};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::CookieJar;

use crate::domain::UnsubscribeToken;
use crate::lifecycle::{SubscriptionLifecycle, UnsubscribeError};
use crate::routes::{error_chain_fmt, set_flash, FlashLevel};

/// `GET /unsubscribe/{token}`. A malformed or unknown token is reported to
/// the user, not treated as an authorization failure; the link is public in
/// the sense that everyone holding it may use it, repeatedly.
#[tracing::instrument(name = "Unsubscribe from the daily weather", skip(lifecycle, jar, token))]
pub async fn unsubscribe(
    State(lifecycle): State<SubscriptionLifecycle>,
    jar: CookieJar,
    Path(token): Path<String>,
) -> Result<(CookieJar, Redirect), UnsubscribeHandlerError> {
    let token = match UnsubscribeToken::parse(token) {
        Ok(token) => token,
        Err(_) => return Ok(invalid_link_response(jar)),
    };

    match lifecycle.unsubscribe(&token).await {
        Ok(()) => Ok((
            set_flash(
                jar,
                FlashLevel::Success,
                "You have successfully unsubscribed.",
            ),
            Redirect::to("/"),
        )),
        Err(UnsubscribeError::InvalidToken) => Ok(invalid_link_response(jar)),
        Err(error) => Err(UnsubscribeHandlerError::UnexpectedError(error)),
    }
}

fn invalid_link_response(jar: CookieJar) -> (CookieJar, Redirect) {
    (
        set_flash(jar, FlashLevel::Error, "The unsubscribe link is not valid."),
        Redirect::to("/"),
    )
}

pub enum UnsubscribeHandlerError {
    UnexpectedError(UnsubscribeError),
}

impl Debug for UnsubscribeHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl Display for UnsubscribeHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to unsubscribe")
    }
}

impl std::error::Error for UnsubscribeHandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UnsubscribeHandlerError::UnexpectedError(e) => Some(e),
        }
    }
}

impl IntoResponse for UnsubscribeHandlerError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:?}", self);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
