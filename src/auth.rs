use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::Role;

/// Who is making a request, as established by an external verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Ulid,
    pub role: Role,
}

impl Identity {
    pub fn new(id: Ulid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}

/// Per-request context handed to every mutating engine call.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub identity: Identity,
    /// Give up if the engineer's ledger cannot be locked by then.
    pub deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Resolves a credential into an [`Identity`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn current_identity(&self, credential: &str) -> Result<Identity, EngineError>;
}

/// Bearer tokens issued elsewhere and registered here.
#[derive(Debug, Default)]
pub struct TokenTable {
    tokens: DashMap<String, Identity>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: impl Into<String>, identity: Identity) {
        self.tokens.insert(token.into(), identity);
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.remove(token);
    }
}

#[async_trait]
impl Authenticator for TokenTable {
    async fn current_identity(&self, credential: &str) -> Result<Identity, EngineError> {
        let token = credential.strip_prefix("Bearer ").unwrap_or(credential).trim();
        self.tokens
            .get(token)
            .map(|e| *e.value())
            .ok_or(EngineError::Unauthenticated)
    }
}
