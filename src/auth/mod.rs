//! Token verification collaborator. The core never issues or inspects
//! tokens itself; it only trusts user ids that were already resolved here.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AuthError;

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolve an opaque bearer token to a user id.
    async fn verify(&self, token: &str) -> Result<i32, AuthError>;
}

/// In-memory token service: issues opaque UUID tokens and verifies them
/// against its own map. Stands in for the external token service.
#[derive(Default)]
pub struct MemoryTokens {
    tokens: DashMap<String, i32>,
}

impl MemoryTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, user_id: i32) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), user_id);
        token
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.remove(token);
    }
}

#[async_trait]
impl TokenVerifier for MemoryTokens {
    async fn verify(&self, token: &str) -> Result<i32, AuthError> {
        self.tokens
            .get(token)
            .map(|entry| *entry)
            .ok_or(AuthError::InvalidToken)
    }
}
