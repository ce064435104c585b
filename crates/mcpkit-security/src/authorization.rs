//! Policy-based authorization (§4.3 Authorization).

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use mcpkit_core::SecurityContext;

/// The kind of action being authorized against a target entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    List,
    Call,
    Read,
}

/// The class of entity a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Tool,
    Resource,
    Prompt,
    Root,
}

/// A policy function: given the caller's identity, the action, and the
/// target entity's name/URI, decide whether the action is allowed.
pub type Policy = Arc<dyn Fn(&SecurityContext, ActionKind, &str) -> bool + Send + Sync>;

/// Maps entity classes to policy functions. Absence of a policy for a class
/// defaults to allow (§4.3).
#[derive(Default, Clone)]
pub struct AuthorizationManager {
    policies: HashMap<EntityClass, Policy>,
}

impl std::fmt::Debug for AuthorizationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationManager")
            .field("classes_with_policy", &self.policies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AuthorizationManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(
        mut self,
        class: EntityClass,
        policy: impl Fn(&SecurityContext, ActionKind, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.policies.insert(class, Arc::new(policy));
        self
    }

    /// Evaluate the policy for `class`. A raised panic inside the policy is
    /// treated as deny, matching the source's "a raised exception is treated
    /// as deny" rule.
    pub fn is_allowed(
        &self,
        class: EntityClass,
        identity: &SecurityContext,
        action: ActionKind,
        target: &str,
    ) -> bool {
        match self.policies.get(&class) {
            None => true,
            Some(policy) => {
                let policy = Arc::clone(policy);
                panic::catch_unwind(AssertUnwindSafe(|| policy(identity, action, target)))
                    .unwrap_or(false)
            }
        }
    }
}
