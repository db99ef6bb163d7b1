//! Guarded navigation: resolve, check access, then hand the final path
//! to the UI's navigation sink.

use serde::Serialize;
use tracing::debug;

use crate::context::RoutingContext;
use crate::identity::User;
use crate::policy::{AccessContext, AccessDecision};
use crate::scope::Scope;
use crate::segment;

/// Performs the actual UI transition. The core never navigates itself.
pub trait Navigator {
    fn navigate_to(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str),
{
    fn navigate_to(&self, path: &str) {
        self(path)
    }
}

/// What happened to one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationOutcome {
    /// Resolved path of the requested target.
    pub requested: String,
    /// Path handed to the navigator: `requested` or the redirect.
    pub destination: String,
    pub decision: AccessDecision,
}

impl RoutingContext {
    /// Check where `target` would lead from `current_path` without
    /// navigating.
    pub fn check_navigation(
        &self,
        target: &str,
        current_path: &str,
        scope: Scope,
        user: Option<&User>,
        access: &AccessContext,
    ) -> NavigationOutcome {
        let requested = self.resolve_route(target, current_path, scope);
        let segs = segment::segment(&requested);

        // Paths above module level are not governed by module policies.
        let decision = match (segs.site, segs.module) {
            (Some(site), Some(module)) => {
                let route: Vec<&str> = segs.submodule.into_iter().chain(segs.rest).collect();
                self.evaluate_access(module, &route.join("/"), user, site, access)
            }
            _ => AccessDecision::allow(),
        };

        let destination = match (decision.allow, &decision.redirect_to) {
            (false, Some(redirect)) => redirect.clone(),
            _ => requested.clone(),
        };

        NavigationOutcome {
            requested,
            destination,
            decision,
        }
    }

    /// Resolve `target`, evaluate access, and navigate to either the
    /// resolved path or the redirect.
    pub fn navigate(
        &self,
        navigator: &dyn Navigator,
        target: &str,
        current_path: &str,
        scope: Scope,
        user: Option<&User>,
        access: &AccessContext,
    ) -> NavigationOutcome {
        let outcome = self.check_navigation(target, current_path, scope, user, access);
        if outcome.destination != outcome.requested {
            debug!("navigation to {} redirected to {}", outcome.requested, outcome.destination);
        }
        navigator.navigate_to(&outcome.destination);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::identity::StaticIdentityProvider;
    use crate::policy::PolicyRule;
    use crate::registry::{ModuleConfig, RouteRule};

    fn ctx() -> RoutingContext {
        let provider = StaticIdentityProvider::new();
        provider.grant("alice", "acme", ["marketing"], Vec::<String>::new());
        let ctx = RoutingContext::new(Arc::new(provider));
        ctx.register_module(
            ModuleConfig::new("marketing")
                .public_route("landing")
                .protect("", RouteRule::allow().policy(PolicyRule::roles(["marketing"])))
                .protect("campaigns/archive", RouteRule::deny().redirect_to("campaigns")),
        )
        .unwrap();
        ctx
    }

    #[test]
    fn allowed_navigation_reaches_target() {
        let ctx = ctx();
        let visited = Mutex::new(Vec::new());
        let nav = |p: &str| visited.lock().unwrap().push(p.to_string());

        let out = ctx.navigate(
            &nav,
            "edit",
            "/acme/marketing/campaigns/507f1f77bcf86cd799439011",
            Scope::Auto,
            Some(&User::new("alice")),
            &AccessContext::new(),
        );
        assert!(out.decision.allow);
        assert_eq!(out.destination, "/acme/marketing/campaigns/edit");
        assert_eq!(*visited.lock().unwrap(), vec!["/acme/marketing/campaigns/edit"]);
    }

    #[test]
    fn denied_navigation_goes_to_redirect() {
        let ctx = ctx();
        let visited = Mutex::new(Vec::new());
        let nav = |p: &str| visited.lock().unwrap().push(p.to_string());

        let out = ctx.navigate(&nav, "campaigns", "/acme/marketing", Scope::Current, None, &AccessContext::new());
        assert!(!out.decision.allow);
        assert_eq!(out.requested, "/acme/marketing/campaigns");
        assert_eq!(out.destination, "/acme/auth/login");
        assert_eq!(*visited.lock().unwrap(), vec!["/acme/auth/login"]);
    }

    #[test]
    fn route_rule_redirect_is_module_relative() {
        let ctx = ctx();
        let out = ctx.check_navigation(
            "/acme/marketing/campaigns/archive",
            "/acme",
            Scope::Auto,
            Some(&User::new("alice")),
            &AccessContext::new(),
        );
        assert_eq!(out.destination, "/acme/marketing/campaigns");
    }

    #[test]
    fn public_route_and_site_root() {
        let ctx = ctx();
        let out = ctx.check_navigation("landing", "/acme/marketing/x", Scope::Module, None, &AccessContext::new());
        assert!(out.decision.allow);

        let out = ctx.check_navigation("/acme", "/acme/marketing", Scope::Auto, None, &AccessContext::new());
        assert!(out.decision.allow);
        assert_eq!(out.destination, "/acme");
    }

    #[test]
    fn absolute_scope_from_root_treats_relative_path_as_site_absolute() {
        let ctx = ctx();
        let out = ctx.check_navigation("acme/marketing/landing", "/", Scope::Absolute, None, &AccessContext::new());
        assert_eq!(out.requested, "/acme/marketing/landing");
        assert!(out.decision.allow);
    }
}
