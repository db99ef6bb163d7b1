use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::error::NavError;
use crate::hierarchy::{HierarchicalResolver, RedirectKind};
use crate::identity::{Identity, IdentityCache, IdentityProvider, User};
use crate::menu::{MenuNode, MenuNormalizer};
use crate::policy::{AccessContext, AccessDecision, PolicyEngine};
use crate::registry::{ModuleConfig, ModuleRegistry, SiteAuthConfig, SiteAuthRegistry};
use crate::resolve::{self, ResolveOptions};
use crate::scope::Scope;
use crate::segment::{DEFAULT_SUBMODULE_MARKERS, RouteContext};

/// Everything the navigation core needs, built once at startup and
/// passed by reference to every call.
///
/// ```ignore
/// let ctx = RoutingContext::new(Arc::new(StaticIdentityProvider::new()));
/// ctx.register_module(ModuleConfig::new("marketing"))?;
///
/// let path = ctx.resolve_route("edit", "/acme/marketing/items/507f1f77bcf86cd799439011", Scope::Auto);
/// let decision = ctx.evaluate_access("marketing", "items/edit", Some(&user), "acme", &AccessContext::new());
/// ```
pub struct RoutingContext {
    modules: ModuleRegistry,
    sites: SiteAuthRegistry,
    identity: Arc<dyn IdentityProvider>,
    cache: IdentityCache,
}

impl RoutingContext {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            modules: ModuleRegistry::new(),
            sites: SiteAuthRegistry::new(),
            identity,
            cache: IdentityCache::new(),
        }
    }

    // ── Registration ──

    pub fn register_module(&self, config: ModuleConfig) -> Result<(), NavError> {
        self.modules.register(config)
    }

    pub fn register_site_auth_config(&self, site: &str, config: SiteAuthConfig) -> Result<(), NavError> {
        self.sites.register(site, config)
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn sites(&self) -> &SiteAuthRegistry {
        &self.sites
    }

    pub fn identity_cache(&self) -> &IdentityCache {
        &self.cache
    }

    pub fn hierarchy(&self) -> HierarchicalResolver<'_> {
        HierarchicalResolver::new(&self.modules, &self.sites)
    }

    pub fn policy_engine(&self) -> PolicyEngine<'_> {
        PolicyEngine::new(self)
    }

    /// A third segment is a submodule when it is a known marker or a
    /// registered module embedded under another one.
    pub fn is_submodule(&self, segment: &str) -> bool {
        DEFAULT_SUBMODULE_MARKERS.contains(&segment) || self.modules.contains(segment)
    }

    // ── Resolution surface ──

    pub fn route_context(&self, path: &str) -> RouteContext {
        RouteContext::parse(path, |s| self.is_submodule(s))
    }

    pub fn resolve_route(&self, target: &str, current_path: &str, scope: Scope) -> String {
        self.resolve_route_with(target, current_path, scope, ResolveOptions::default())
    }

    pub fn resolve_route_with(
        &self,
        target: &str,
        current_path: &str,
        scope: Scope,
        options: ResolveOptions,
    ) -> String {
        resolve::resolve_in(target, current_path, scope, options, |s| self.is_submodule(s))
    }

    pub fn evaluate_access(
        &self,
        module: &str,
        route: &str,
        user: Option<&User>,
        site: &str,
        access: &AccessContext,
    ) -> AccessDecision {
        self.policy_engine().evaluate_access(module, route, user, site, access)
    }

    pub fn get_redirect_route(&self, module: &str, kind: RedirectKind, site: &str) -> String {
        self.hierarchy().redirect_route(module, kind, site)
    }

    pub fn normalize_menu(&self, items: &[Value], default_scope: Scope, current_path: &str) -> Vec<MenuNode> {
        MenuNormalizer::new(current_path, |s: &str| self.is_submodule(s)).normalize(items, default_scope)
    }

    // ── Identity ──

    /// Resolved grants of `user_id` in `site`, served from cache while
    /// younger than `ttl`. Lookup failures yield an empty identity.
    pub fn identity_for(&self, user_id: &str, site: &str, ttl: Duration) -> Arc<Identity> {
        if let Some(cached) = self.cache.get(user_id, site, ttl) {
            return cached;
        }

        let lookup = self
            .identity
            .user_roles(user_id, site)
            .and_then(|roles| Ok((roles, self.identity.user_permissions(user_id, site)?)));

        match lookup {
            Ok((roles, permissions)) => {
                let identity = Arc::new(Identity {
                    roles: roles.into_iter().collect(),
                    permissions: permissions.into_iter().collect(),
                });
                self.cache.set(user_id, site, Arc::clone(&identity));
                identity
            }
            Err(e) => {
                warn!("identity lookup for '{}' in '{}' failed: {}", user_id, site, e);
                Arc::new(Identity::default())
            }
        }
    }
}
