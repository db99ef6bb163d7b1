//! Route access evaluation.
//!
//! For a `(module, route)` pair the engine finds the most specific
//! configured [`RouteRule`]:
//!
//! ```text
//! "campaigns/create/step2" → "campaigns/create" → "campaigns" → "" → implicit allow
//! ```
//!
//! A rule with `allow = false` denies outright. Otherwise its policies
//! run in order and the first one that fails denies (AND across the
//! list). Inside a single policy, the role and permission lists are
//! OR'ed. A denial always carries a redirect path.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::RoutingContext;
use crate::error::BoxError;
use crate::hierarchy::RedirectKind;
use crate::identity::{Identity, User};
use crate::registry::{ModuleConfig, RouteRule};

/// Role token satisfied by any signed-in user.
pub const ANY_AUTHENTICATED: &str = "@";

/// Role token satisfied by everyone, including anonymous callers.
pub const PUBLIC: &str = "?";

/// Custom policy predicate: `(user, site, context) -> pass?`.
///
/// An `Err` counts as a failed policy; it is logged and never reaches
/// the caller.
pub type MatchCallback =
    Arc<dyn Fn(Option<&User>, &str, &AccessContext) -> Result<bool, BoxError> + Send + Sync>;

/// Caller-supplied data handed to match callbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessContext {
    /// Concrete path being navigated to, when known.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl AccessContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// One allow/deny condition.
///
/// All present checks must pass. A policy with no checks passes.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRule {
    /// Label reported as `failed_policy` instead of the generated one.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub allow: Option<bool>,
    /// Any one of these roles passes. See [`PUBLIC`] and [`ANY_AUTHENTICATED`].
    #[serde(default)]
    pub roles: Vec<String>,
    /// Any one of these permissions passes.
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(skip)]
    pub match_callback: Option<MatchCallback>,
}

impl PolicyRule {
    pub fn allow_all() -> Self {
        Self {
            allow: Some(true),
            ..Default::default()
        }
    }

    pub fn roles<I>(roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn permissions<I>(permissions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn matching<F>(callback: F) -> Self
    where
        F: Fn(Option<&User>, &str, &AccessContext) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self {
            match_callback: Some(Arc::new(callback)),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Short description used in `failed_policy`.
    pub fn describe(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let mut parts = Vec::new();
        if let Some(allow) = self.allow {
            parts.push(format!("allow:{}", allow));
        }
        if !self.roles.is_empty() {
            parts.push(format!("roles:{}", self.roles.join("|")));
        }
        if !self.permissions.is_empty() {
            parts.push(format!("permissions:{}", self.permissions.join("|")));
        }
        if self.match_callback.is_some() {
            parts.push("callback".to_string());
        }
        if parts.is_empty() {
            "pass-through".to_string()
        } else {
            parts.join("+")
        }
    }
}

impl fmt::Debug for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyRule")
            .field("name", &self.name)
            .field("allow", &self.allow)
            .field("roles", &self.roles)
            .field("permissions", &self.permissions)
            .field("match_callback", &self.match_callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Result of an access evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub allow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_policy: Option<String>,
}

impl AccessDecision {
    pub fn allow() -> Self {
        Self {
            allow: true,
            redirect_to: None,
            failed_policy: None,
        }
    }

    pub fn deny(redirect_to: String, failed_policy: impl Into<String>) -> Self {
        Self {
            allow: false,
            redirect_to: Some(redirect_to),
            failed_policy: Some(failed_policy.into()),
        }
    }
}

/// Find the rule governing `route`: exact key, then decreasing path
/// prefixes, then the `""` default.
pub fn find_route_config<'a>(config: &'a ModuleConfig, route: &str) -> Option<(&'a str, &'a RouteRule)> {
    let mut key = normalize_route(route);
    loop {
        if let Some((k, rule)) = config.protected_routes.get_key_value(key) {
            return Some((k.as_str(), rule));
        }
        match key.rfind('/') {
            Some(pos) => key = &key[..pos],
            None => break,
        }
    }
    config
        .protected_routes
        .get_key_value("")
        .map(|(k, rule)| (k.as_str(), rule))
}

fn normalize_route(route: &str) -> &str {
    route.trim_matches('/')
}

/// Evaluates access against a [`RoutingContext`]'s registrations.
pub struct PolicyEngine<'a> {
    ctx: &'a RoutingContext,
}

impl<'a> PolicyEngine<'a> {
    pub fn new(ctx: &'a RoutingContext) -> Self {
        Self { ctx }
    }

    /// Decide whether `user` may open `route` of `module` in `site`.
    pub fn evaluate_access(
        &self,
        module: &str,
        route: &str,
        user: Option<&User>,
        site: &str,
        access: &AccessContext,
    ) -> AccessDecision {
        let Some(config) = self.ctx.modules().get(module) else {
            warn!("module '{}' not registered, allowing '{}'", module, route);
            return AccessDecision::allow();
        };

        let route = normalize_route(route);
        if config.public_routes.contains(route) {
            debug!("{}/{}: public route", module, route);
            return AccessDecision::allow();
        }

        let Some((key, rule)) = find_route_config(&config, route) else {
            debug!("{}/{}: no rule configured, allowing", module, route);
            return AccessDecision::allow();
        };

        if !rule.allow {
            let redirect = self.redirect_for(rule, module, site);
            debug!("{}/{}: rule '{}' denies, redirect {}", module, route, key, redirect);
            return AccessDecision::deny(redirect, format!("route:{}", key));
        }

        let ttl = config.cache.identity_ttl(self.ctx.sites().get(site).as_deref());
        let mut grants = Grants::new(self.ctx, user, site, ttl);
        for policy in &rule.policies {
            if !self.evaluate_policy_rule(policy, user, site, access, &mut grants) {
                let redirect = self.redirect_for(rule, module, site);
                let failed = policy.describe();
                debug!(
                    "{}/{}: policy '{}' failed under rule '{}', redirect {}",
                    module, route, failed, key, redirect
                );
                return AccessDecision::deny(redirect, failed);
            }
        }

        AccessDecision::allow()
    }

    /// Evaluate one policy. Role/permission grants are looked up at most
    /// once per evaluation through `grants`.
    pub fn evaluate_policy_rule(
        &self,
        policy: &PolicyRule,
        user: Option<&User>,
        site: &str,
        access: &AccessContext,
        grants: &mut Grants<'_>,
    ) -> bool {
        if policy.allow == Some(false) {
            return false;
        }

        if !policy.roles.is_empty() {
            let passed = policy.roles.iter().any(|role| match role.as_str() {
                PUBLIC => true,
                ANY_AUTHENTICATED => user.is_some(),
                name => user.is_some() && grants.get().has_role(name),
            });
            if !passed {
                return false;
            }
        }

        if !policy.permissions.is_empty() {
            if user.is_none() {
                return false;
            }
            let identity = grants.get();
            if !policy.permissions.iter().any(|p| identity.has_permission(p)) {
                return false;
            }
        }

        if let Some(callback) = &policy.match_callback {
            if user.is_none() {
                return false;
            }
            match callback(user, site, access) {
                Ok(passed) => return passed,
                Err(e) => {
                    warn!("match callback '{}' failed: {}", policy.describe(), e);
                    return false;
                }
            }
        }

        true
    }

    fn redirect_for(&self, rule: &RouteRule, module: &str, site: &str) -> String {
        match &rule.redirect_to {
            Some(route) => self.ctx.hierarchy().resolve(route, site, Some(module)),
            None => self.ctx.get_redirect_route(module, RedirectKind::Login, site),
        }
    }
}

/// Lazily resolved grants of the evaluated user.
pub struct Grants<'a> {
    ctx: &'a RoutingContext,
    user: Option<&'a User>,
    site: &'a str,
    ttl: Duration,
    resolved: Option<Arc<Identity>>,
}

impl<'a> Grants<'a> {
    pub fn new(ctx: &'a RoutingContext, user: Option<&'a User>, site: &'a str, ttl: Duration) -> Self {
        Self {
            ctx,
            user,
            site,
            ttl,
            resolved: None,
        }
    }

    fn get(&mut self) -> &Identity {
        let (ctx, user, site, ttl) = (self.ctx, self.user, self.site, self.ttl);
        let identity = self.resolved.get_or_insert_with(|| match user {
            Some(user) => ctx.identity_for(&user.id, site, ttl),
            None => Arc::new(Identity::default()),
        });
        &**identity
    }
}
