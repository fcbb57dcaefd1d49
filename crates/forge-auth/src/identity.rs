use forge_api::AuthUser;
use serde::{Deserialize, Serialize};

/// Who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// An authenticated identity plus the bearer token proving it to the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(flatten)]
    pub identity: Identity,
    pub token: String,
}

impl Session {
    pub fn new(identity: Identity, token: impl Into<String>) -> Self {
        Self {
            identity,
            token: token.into(),
        }
    }

    pub fn bearer(&self) -> &str {
        &self.token
    }
}

impl From<AuthUser> for Session {
    fn from(user: AuthUser) -> Self {
        Self {
            identity: Identity {
                id: user.id,
                name: user.name,
                email: user.email,
            },
            token: user.token,
        }
    }
}
