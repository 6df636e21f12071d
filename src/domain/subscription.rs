use crate::domain::{City, SubscriberEmail, UnsubscribeToken};

/// The sole persisted entity: one record per email address. Records are
/// retained on unsubscribe; re-subscribing reuses the row.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub email: SubscriberEmail,
    pub city: City,
    pub is_subscribed: bool,
    pub unsubscribe_token: UnsubscribeToken,
}

impl Subscription {
    /// A freshly requested subscription, awaiting email verification.
    pub fn pending(email: SubscriberEmail, city: City) -> Self {
        Self {
            email,
            city,
            is_subscribed: false,
            unsubscribe_token: UnsubscribeToken::generate(),
        }
    }
}
