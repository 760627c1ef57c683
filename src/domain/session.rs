use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "cliente")]
    Buyer,
    #[serde(alias = "vendedor")]
    Seller,
}

/// The authenticated user a coordinator acts for.
///
/// Built at login and handed to the coordinator explicitly; dropped at logout.
#[derive(Clone)]
pub struct SessionContext {
    user_id: String,
    role: Role,
    token: SecretString,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, role: Role, token: SecretString) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            token,
        }
    }

    pub fn buyer(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(user_id, Role::Buyer, SecretString::from(token.into()))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_buyer(&self) -> bool {
        self.role == Role::Buyer
    }

    /// Value for an `Authorization` header. Empty tokens yield `None`.
    pub fn bearer(&self) -> Option<String> {
        let token = self.token.expose_secret();
        (!token.is_empty()).then(|| format!("Bearer {token}"))
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
