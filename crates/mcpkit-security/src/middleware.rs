//! The two-stage security middleware that runs before every guarded method
//! (§4.3).

use std::collections::HashMap;

use mcpkit_core::{RequestContext, SecurityContext};
use mcpkit_protocol::McpError;

use crate::authorization::{ActionKind, AuthorizationManager, EntityClass};
use crate::strategies::AuthStrategy;

/// Configuration for the authentication stage.
#[derive(Default)]
pub struct AuthenticationConfig {
    enabled: bool,
    default_strategy: Option<String>,
    strategies: HashMap<String, AuthStrategy>,
}

impl AuthenticationConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enabled(strategies: HashMap<String, AuthStrategy>, default_strategy: impl Into<String>) -> Self {
        Self { enabled: true, default_strategy: Some(default_strategy.into()), strategies }
    }
}

/// The security middleware: authentication then authorization, run once per
/// guarded dispatch (`tools/call`, `resources/read`, `prompts/get`, and each
/// `*/list`).
pub struct SecurityMiddleware {
    authn: AuthenticationConfig,
    authz_enabled: bool,
    authz: AuthorizationManager,
}

impl SecurityMiddleware {
    pub fn new(authn: AuthenticationConfig, authz_enabled: bool, authz: AuthorizationManager) -> Self {
        Self { authn, authz_enabled, authz }
    }

    /// Both authentication and authorization disabled — every request
    /// proceeds as anonymous with full access.
    pub fn disabled() -> Self {
        Self::new(AuthenticationConfig::disabled(), false, AuthorizationManager::new())
    }

    /// Run both stages. `strategy_name` selects a non-default strategy (e.g.
    /// via a transport header); `None` uses the configured default.
    pub fn check(
        &self,
        ctx: &RequestContext,
        strategy_name: Option<&str>,
        class: EntityClass,
        action: ActionKind,
        target: &str,
    ) -> Result<SecurityContext, McpError> {
        let security = self.authenticate(ctx, strategy_name)?;
        self.authorize(&security, class, action, target)?;
        Ok(security)
    }

    fn authenticate(&self, ctx: &RequestContext, strategy_name: Option<&str>) -> Result<SecurityContext, McpError> {
        if !self.authn.enabled {
            return Ok(SecurityContext::anonymous());
        }
        let name = strategy_name
            .or(self.authn.default_strategy.as_deref())
            .ok_or_else(|| McpError::authentication_required("no_strategy_configured"))?;
        let strategy = self
            .authn
            .strategies
            .get(name)
            .ok_or_else(|| McpError::authentication_required("unknown_strategy"))?;
        strategy.authenticate(ctx)
    }

    fn authorize(
        &self,
        security: &SecurityContext,
        class: EntityClass,
        action: ActionKind,
        target: &str,
    ) -> Result<(), McpError> {
        if !self.authz_enabled {
            return Ok(());
        }
        if self.authz.is_allowed(class, security, action, target) {
            Ok(())
        } else {
            Err(McpError::authorization_failed())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpkit_core::TransportKind;
    use std::collections::HashMap;

    #[test]
    fn disabled_middleware_allows_everything_anonymously() {
        let middleware = SecurityMiddleware::disabled();
        let ctx = RequestContext::minimal_stdio();
        let result = middleware
            .check(&ctx, None, EntityClass::Tool, ActionKind::Call, "echo")
            .unwrap();
        assert!(result.is_anonymous());
    }

    #[test]
    fn enabled_authn_rejects_missing_credential() {
        let mut strategies = HashMap::new();
        strategies.insert("shared".to_string(), AuthStrategy::shared_key(["key".to_string()]));
        let middleware = SecurityMiddleware::new(
            AuthenticationConfig::enabled(strategies, "shared"),
            false,
            AuthorizationManager::new(),
        );
        let ctx = RequestContext::builder(TransportKind::Http).build();
        assert!(middleware
            .check(&ctx, None, EntityClass::Tool, ActionKind::Call, "echo")
            .is_err());
    }

    #[test]
    fn enabled_authz_can_deny_after_successful_authn() {
        let mut strategies = HashMap::new();
        strategies.insert("shared".to_string(), AuthStrategy::shared_key(["key".to_string()]));
        let authz = AuthorizationManager::new().with_policy(EntityClass::Tool, |_id, _action, target| target != "dangerous");
        let middleware = SecurityMiddleware::new(
            AuthenticationConfig::enabled(strategies, "shared"),
            true,
            authz,
        );
        let ctx = RequestContext::builder(TransportKind::Http).header("X-API-Key", "key").build();
        assert!(middleware
            .check(&ctx, None, EntityClass::Tool, ActionKind::Call, "dangerous")
            .is_err());
        assert!(middleware
            .check(&ctx, None, EntityClass::Tool, ActionKind::Call, "safe")
            .is_ok());
    }
}
