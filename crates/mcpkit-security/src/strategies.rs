//! Authentication strategies (§4.3 Authentication).

use std::collections::HashSet;
use std::sync::Arc;

use subtle::ConstantTimeEq;

use mcpkit_core::{Identity, RequestContext, SecurityContext};
use mcpkit_protocol::McpError;

/// A pluggable authentication strategy.
pub enum AuthStrategy {
    /// Accepts a fixed set of opaque shared keys.
    SharedKey { keys: HashSet<String> },
    /// Verifies a signed token with a configured secret.
    SignedToken {
        secret: String,
        verify: Arc<dyn Fn(&str, &str) -> Option<Identity> + Send + Sync>,
    },
    /// Invokes a user-supplied predicate on the `RequestContext`.
    Custom(Arc<dyn Fn(&RequestContext) -> Option<Identity> + Send + Sync>),
}

impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SharedKey { keys } => f.debug_struct("SharedKey").field("keys", &keys.len()).finish(),
            Self::SignedToken { .. } => f.debug_struct("SignedToken").finish(),
            Self::Custom(_) => f.debug_struct("Custom").finish(),
        }
    }
}

impl AuthStrategy {
    pub fn shared_key(keys: impl IntoIterator<Item = String>) -> Self {
        Self::SharedKey { keys: keys.into_iter().collect() }
    }

    pub fn signed_token(
        secret: impl Into<String>,
        verify: impl Fn(&str, &str) -> Option<Identity> + Send + Sync + 'static,
    ) -> Self {
        Self::SignedToken { secret: secret.into(), verify: Arc::new(verify) }
    }

    pub fn custom(predicate: impl Fn(&RequestContext) -> Option<Identity> + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    /// The strategy's name, used both for the `SecurityContext` it produces
    /// and for the error detail on failure.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SharedKey { .. } => "shared_key",
            Self::SignedToken { .. } => "signed_token",
            Self::Custom(_) => "custom",
        }
    }

    /// Run this strategy against a request context, yielding a
    /// `SecurityContext` on success.
    pub fn authenticate(&self, ctx: &RequestContext) -> Result<SecurityContext, McpError> {
        match self {
            Self::SharedKey { keys } => {
                let candidate = extract_credential(ctx).ok_or_else(|| {
                    McpError::authentication_required("missing_credential")
                })?;
                if keys.iter().any(|k| constant_time_eq(k, &candidate)) {
                    let mut identity = Identity::new();
                    identity.insert("key".to_string(), serde_json::Value::String(redact(&candidate)));
                    Ok(SecurityContext::authenticated(identity, self.name()))
                } else {
                    Err(McpError::authentication_required("invalid_credential"))
                }
            }
            Self::SignedToken { verify, .. } => {
                let candidate = extract_credential(ctx).ok_or_else(|| {
                    McpError::authentication_required("missing_credential")
                })?;
                match verify(&candidate, self.secret()) {
                    Some(identity) => Ok(SecurityContext::authenticated(identity, self.name())),
                    None => Err(McpError::authentication_required("invalid_or_expired_token")),
                }
            }
            Self::Custom(predicate) => match predicate(ctx) {
                Some(identity) => Ok(SecurityContext::authenticated(identity, self.name())),
                None => Err(McpError::authentication_required("custom_strategy_rejected")),
            },
        }
    }

    fn secret(&self) -> &str {
        match self {
            Self::SignedToken { secret, .. } => secret,
            _ => "",
        }
    }
}

/// Extract a candidate credential from the request context, in the order
/// specified by §4.3: `X-API-Key` header, `Authorization: Bearer `/`API-Key `,
/// then `api_key`/`apikey` query parameters.
pub fn extract_credential(ctx: &RequestContext) -> Option<String> {
    if let Some(v) = ctx.header("X-API-Key") {
        return Some(v.to_string());
    }
    if let Some(auth) = ctx.header("Authorization") {
        if let Some(rest) = auth.strip_prefix("Bearer ") {
            return Some(rest.to_string());
        }
        if let Some(rest) = auth.strip_prefix("API-Key ") {
            return Some(rest.to_string());
        }
    }
    if let Some(v) = ctx.param("api_key").or_else(|| ctx.param("apikey")) {
        return Some(v.to_string());
    }
    None
}

/// Constant-time credential comparison: both inputs are hashed to a fixed
/// width before comparison so timing leaks neither the match point nor the
/// input length (mirrors the teacher's API-key validation approach).
fn constant_time_eq(expected: &str, candidate: &str) -> bool {
    let a: [u8; 32] = blake3::hash(expected.as_bytes()).into();
    let b: [u8; 32] = blake3::hash(candidate.as_bytes()).into();
    a.ct_eq(&b).into()
}

fn redact(candidate: &str) -> String {
    if candidate.len() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", &candidate[candidate.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpkit_core::TransportKind;

    #[test]
    fn shared_key_extracts_from_header() {
        let strategy = AuthStrategy::shared_key(["topsecret".to_string()]);
        let ctx = RequestContext::builder(TransportKind::Http)
            .header("X-API-Key", "topsecret")
            .build();
        assert!(strategy.authenticate(&ctx).is_ok());
    }

    #[test]
    fn shared_key_extracts_from_bearer_auth() {
        let strategy = AuthStrategy::shared_key(["topsecret".to_string()]);
        let ctx = RequestContext::builder(TransportKind::Http)
            .header("Authorization", "Bearer topsecret")
            .build();
        assert!(strategy.authenticate(&ctx).is_ok());
    }

    #[test]
    fn shared_key_extracts_from_query_param() {
        let strategy = AuthStrategy::shared_key(["topsecret".to_string()]);
        let ctx = RequestContext::builder(TransportKind::Http)
            .param("apikey", "topsecret")
            .build();
        assert!(strategy.authenticate(&ctx).is_ok());
    }

    #[test]
    fn shared_key_rejects_wrong_key() {
        let strategy = AuthStrategy::shared_key(["topsecret".to_string()]);
        let ctx = RequestContext::builder(TransportKind::Http)
            .header("X-API-Key", "wrong")
            .build();
        assert!(strategy.authenticate(&ctx).is_err());
    }

    #[test]
    fn custom_strategy_runs_predicate() {
        let strategy = AuthStrategy::custom(|ctx| {
            if ctx.header("X-Debug").is_some() {
                let mut id = Identity::new();
                id.insert("user".into(), serde_json::json!("debug-user"));
                Some(id)
            } else {
                None
            }
        });
        let ctx = RequestContext::builder(TransportKind::Http).header("X-Debug", "1").build();
        let result = strategy.authenticate(&ctx).unwrap();
        assert_eq!(result.identity()["user"], "debug-user");
    }
}
