use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Negotiation identity: the addressable key for signaling, unique per
/// browser session. Minted by the client, opaque to the server.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display identity supplied by the client. Not verified by this core.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DisplayIdentity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl DisplayIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: None,
        }
    }

    /// Name, falling back to email, falling back to "Anonymous".
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Anonymous")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RosterEntry {
    pub peer: PeerId,
    pub display: DisplayIdentity,
}
