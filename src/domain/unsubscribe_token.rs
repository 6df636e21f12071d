use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

pub const TOKEN_LENGTH: usize = 32;

/// Opaque credential attached to every subscription. It authorizes
/// unsubscribing and binds verification links to the latest subscribe
/// request for an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribeToken(String);

impl UnsubscribeToken {
    /// 32 alphanumeric characters from `thread_rng` (a CSPRNG), roughly
    /// 190 bits of entropy.
    pub fn generate() -> Self {
        let mut rng = thread_rng();
        let token = std::iter::repeat_with(|| rng.sample(Alphanumeric))
            .map(char::from)
            .take(TOKEN_LENGTH)
            .collect();
        Self(token)
    }

    /// Validates an inbound token before it is used in a store lookup.
    pub fn parse(s: String) -> Result<Self, String> {
        let well_formed =
            s.len() == TOKEN_LENGTH && s.chars().all(|c| c.is_ascii_alphanumeric());
        if well_formed {
            Ok(Self(s))
        } else {
            Err("malformed unsubscribe token".to_string())
        }
    }
}

impl AsRef<str> for UnsubscribeToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
