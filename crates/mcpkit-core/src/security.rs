//! The security context attached to a session after authentication (§3
//! Security session).

use std::collections::HashMap;

use mcpkit_types::Timestamp;
use serde_json::Value;

/// Identity descriptor: an opaque map of claims/attributes produced by
/// whichever authentication strategy ran.
pub type Identity = HashMap<String, Value>;

/// The sentinel identity for an unauthenticated session (security disabled,
/// or an anonymous-allowed strategy).
pub const ANONYMOUS: &str = "anonymous";

/// A security context attached to a `Session` once authentication succeeds
/// (or is a no-op because security is disabled).
#[derive(Debug, Clone)]
pub struct SecurityContext {
    identity: Identity,
    strategy_name: String,
    authenticated_at: Timestamp,
    permissions: Vec<String>,
}

impl SecurityContext {
    /// The anonymous context used when authentication is disabled.
    pub fn anonymous() -> Self {
        Self {
            identity: Identity::new(),
            strategy_name: ANONYMOUS.to_string(),
            authenticated_at: chrono::Utc::now(),
            permissions: Vec::new(),
        }
    }

    /// Build a context for a successful authentication.
    pub fn authenticated(identity: Identity, strategy_name: impl Into<String>) -> Self {
        Self {
            identity,
            strategy_name: strategy_name.into(),
            authenticated_at: chrono::Utc::now(),
            permissions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.strategy_name == ANONYMOUS
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn authenticated_at(&self) -> Timestamp {
        self.authenticated_at
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_the_sentinel() {
        let ctx = SecurityContext::anonymous();
        assert!(ctx.is_anonymous());
        assert_eq!(ctx.strategy_name(), ANONYMOUS);
    }
}
