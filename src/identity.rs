// 🪪 Identity - the sole correlation key across sessions, plans and accounts
//
// An identity is an email-like string. It is normalized (trimmed, lower-cased)
// exactly once, at construction, so every comparison downstream is a plain
// string equality.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// IDENTITY
// ============================================================================

/// Normalized identity (lower-cased email-like string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Normalize raw user input into an identity
    ///
    /// Example: "  Lifetime@User.COM " → "lifetime@user.com"
    pub fn new(raw: impl AsRef<str>) -> Self {
        Identity(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        Identity::new(raw)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Identity::new(raw)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SESSION TOKEN
// ============================================================================

/// Token minted every time the live session is replaced (login, logout,
/// self-deletion). In-flight remote requests carry the token that was live
/// when they started; a mismatch on completion means the result is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn mint() -> Self {
        SessionToken(Uuid::new_v4())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
