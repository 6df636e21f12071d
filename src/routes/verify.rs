use std::fmt::{Debug, Display};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::lifecycle::{SubscriptionLifecycle, VerifyError};
use crate::routes::{error_chain_fmt, set_flash, FlashLevel};
use crate::signed_link::SignedLinkError;

#[derive(Debug, Deserialize)]
pub struct Parameters {
    email: String,
    token: String,
    expires: i64,
    signature: String,
}

/// `GET /verify`: the signed-link endpoint mailed out on subscribe. An
/// invalid or expired signature is an authorization failure; an unknown
/// email redirects as if it had succeeded so the endpoint cannot be used to
/// probe which addresses are registered.
#[tracing::instrument(
    name = "Verify a subscription from a signed link",
    skip(lifecycle, jar, parameters),
    fields(subscriber_email = %parameters.email)
)]
pub async fn verify(
    State(lifecycle): State<SubscriptionLifecycle>,
    jar: CookieJar,
    Query(parameters): Query<Parameters>,
) -> Result<(CookieJar, Redirect), VerifyHandlerError> {
    match lifecycle
        .verify(
            &parameters.email,
            &parameters.token,
            parameters.expires,
            &parameters.signature,
        )
        .await
    {
        Ok(_) => Ok((
            set_flash(
                jar,
                FlashLevel::Success,
                "Your subscription has been confirmed.",
            ),
            Redirect::to("/"),
        )),
        Err(VerifyError::StaleLink) => Ok((
            set_flash(
                jar,
                FlashLevel::Error,
                "This confirmation link is no longer valid. Please use the most recent email.",
            ),
            Redirect::to("/subscribe"),
        )),
        Err(VerifyError::InvalidLink(error)) => Err(VerifyHandlerError::InvalidLink(error)),
        Err(error) => Err(VerifyHandlerError::UnexpectedError(error)),
    }
}

pub enum VerifyHandlerError {
    InvalidLink(SignedLinkError),
    UnexpectedError(VerifyError),
}

impl Debug for VerifyHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl Display for VerifyHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyHandlerError::InvalidLink(_) => {
                write!(f, "The verification link is invalid or has expired")
            }
            VerifyHandlerError::UnexpectedError(_) => {
                write!(f, "Failed to verify the subscription")
            }
        }
    }
}

impl std::error::Error for VerifyHandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerifyHandlerError::InvalidLink(e) => Some(e),
            VerifyHandlerError::UnexpectedError(e) => Some(e),
        }
    }
}

impl IntoResponse for VerifyHandlerError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:?}", self);
        match self {
            VerifyHandlerError::InvalidLink(_) => StatusCode::UNAUTHORIZED,
            VerifyHandlerError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}
