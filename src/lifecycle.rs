use std::sync::Arc;

use crate::dispatch::{DispatchError, NotificationDispatcher};
use crate::domain::{City, SubscriberEmail, Subscription, UnsubscribeToken};
use crate::signed_link::{LinkSigner, SignedLinkError};
use crate::storage::{StoreError, SubscriptionStore};

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("this email has already been registered")]
    AlreadySubscribed,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    InvalidLink(#[from] SignedLinkError),
    #[error("the confirmation link has been superseded by a newer one")]
    StaleLink,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The subscription is active and the recurring job is enqueued.
    Verified,
    /// No record exists for the email. Reported as success so the endpoint
    /// does not reveal which addresses are registered.
    NothingToVerify,
}

#[derive(Debug, thiserror::Error)]
pub enum UnsubscribeError {
    #[error("the unsubscribe link is not valid")]
    InvalidToken,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates the subscription state machine: pending on subscribe, active
/// on verify, inactive on unsubscribe. Records are never deleted.
#[derive(Clone)]
pub struct SubscriptionLifecycle {
    store: Arc<dyn SubscriptionStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    signer: LinkSigner,
    base_url: String,
}

impl SubscriptionLifecycle {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        signer: LinkSigner,
        base_url: String,
    ) -> Self {
        Self {
            store,
            dispatcher,
            signer,
            base_url,
        }
    }

    /// Creates a pending record for a new email, or rotates the token of an
    /// existing unverified one, then emails a fresh signed verification
    /// link. Every call invalidates any previously issued link for the
    /// email. Fails with `AlreadySubscribed` for active subscribers, before
    /// any side effect.
    #[tracing::instrument(
        name = "Subscribe an email to the daily weather",
        skip(self, email, city),
        fields(subscriber_email = %email, city = %city)
    )]
    pub async fn subscribe(
        &self,
        email: SubscriberEmail,
        city: City,
    ) -> Result<(), SubscribeError> {
        let subscription = match self.store.find_by_email(&email).await? {
            Some(existing) if existing.is_subscribed => {
                return Err(SubscribeError::AlreadySubscribed)
            }
            Some(mut existing) => {
                // Repeat request before verification: rotate the token and
                // keep the originally requested city.
                existing.unsubscribe_token = UnsubscribeToken::generate();
                self.store.update(&existing).await?;
                existing
            }
            None => {
                let pending = Subscription::pending(email, city);
                match self.store.create(&pending).await {
                    // A concurrent subscribe won the insert. Overwriting its
                    // token is the same lost-update outcome as two
                    // sequential calls, so retry as an update.
                    Err(StoreError::UniqueViolation) => self.store.update(&pending).await?,
                    other => other?,
                }
                pending
            }
        };

        let verify_url = self.verify_url(&subscription);
        self.dispatcher
            .send_confirmation(&subscription.email, &verify_url)
            .await?;
        Ok(())
    }

    /// Activates a pending subscription from a signed link. The signature
    /// and expiry are checked first; a validly signed link whose token was
    /// since rotated is rejected as stale, so only the newest issued link
    /// can activate.
    #[tracing::instrument(
        name = "Verify a pending subscription",
        skip(self, email, token, expires, signature),
        fields(subscriber_email = %email)
    )]
    pub async fn verify(
        &self,
        email: &str,
        token: &str,
        expires: i64,
        signature: &str,
    ) -> Result<VerifyOutcome, VerifyError> {
        self.signer.verify(email, token, expires, signature)?;

        // The signature proves the parameters are server-issued, so a parse
        // failure can only mean the record key changed shape since issuance.
        let email = match SubscriberEmail::parse(email.to_string()) {
            Ok(email) => email,
            Err(_) => return Ok(VerifyOutcome::NothingToVerify),
        };
        let Some(mut subscription) = self.store.find_by_email(&email).await? else {
            return Ok(VerifyOutcome::NothingToVerify);
        };
        if subscription.unsubscribe_token.as_ref() != token {
            return Err(VerifyError::StaleLink);
        }

        subscription.is_subscribed = true;
        self.store.update(&subscription).await?;
        self.dispatcher.schedule_recurring(&subscription).await?;
        Ok(VerifyOutcome::Verified)
    }

    /// Deactivates the subscription holding the token. The token is kept,
    /// so the same link stays valid; repeat use is a harmless no-op.
    #[tracing::instrument(name = "Unsubscribe by token", skip(self, token))]
    pub async fn unsubscribe(&self, token: &UnsubscribeToken) -> Result<(), UnsubscribeError> {
        let Some(mut subscription) = self.store.find_by_token(token).await? else {
            return Err(UnsubscribeError::InvalidToken);
        };
        subscription.is_subscribed = false;
        self.store.update(&subscription).await?;
        Ok(())
    }

    fn verify_url(&self, subscription: &Subscription) -> String {
        let signed = self
            .signer
            .sign(&subscription.email, &subscription.unsubscribe_token);
        format!(
            "{}/verify?email={}&token={}&expires={}&signature={}",
            self.base_url,
            urlencoding::encode(subscription.email.as_ref()),
            subscription.unsubscribe_token.as_ref(),
            signed.expires,
            signed.signature,
        )
    }
}
