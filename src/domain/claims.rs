//! Verified token claims

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims produced by verifying a bearer credential with the identity provider.
///
/// `sub` is the provider's user id. Everything else (standard JWT fields,
/// `email`, `admin`, custom claims) is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            extra: Map::new(),
        }
    }

    /// Add a claim (builder style)
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Subject identifier (provider uid)
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn email(&self) -> Option<&str> {
        self.extra.get("email").and_then(Value::as_str)
    }

    /// `admin` claim; missing or non-boolean counts as false
    pub fn is_admin(&self) -> bool {
        self.extra
            .get("admin")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
