mod city;
mod subscriber_email;
mod subscription;
mod unsubscribe_token;

pub use city::City;
pub use subscriber_email::SubscriberEmail;
pub use subscription::Subscription;
pub use unsubscribe_token::UnsubscribeToken;
