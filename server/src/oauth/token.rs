use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Access credential returned by the provider's token endpoint.
///
/// Held only long enough to fetch the profile. Never stored, and `Debug`
/// leaves the secret out.
#[derive(Clone, Deserialize)]
pub struct ProviderToken {
    /// The access token for the userinfo request
    pub access_token: String,
    /// The token type (usually "Bearer" for Google)
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// The scopes granted to this token
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// The slice of the userinfo payload we care about.
///
/// Providers add fields over time, so everything but `email` is ignored and
/// `email` itself is kept untyped until it is read. Only a JSON object is
/// accepted as a profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct UserProfile {
    email: Option<Value>,
}

impl From<Map<String, Value>> for UserProfile {
    fn from(mut fields: Map<String, Value>) -> Self {
        Self {
            email: fields.remove("email"),
        }
    }
}

impl UserProfile {
    /// The profile email, if present and a string
    pub fn email(&self) -> Option<&str> {
        self.email.as_ref().and_then(Value::as_str)
    }
}
