//! Site/module qualification of redirect targets.
//!
//! Modules declare redirects as if mounted at the root (`/login`,
//! `dashboard`). This resolver mounts them under the current site and,
//! where appropriate, the current module:
//!
//! ```text
//! site=acme module=marketing
//!   "/acme/home"      → "/acme/home"             already qualified
//!   "/banking/start"  → "/acme/banking/start"    first segment is a module
//!   "/signin"         → "/acme/marketing/signin"
//!   "dashboard"       → "/acme/marketing/dashboard"
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NavError;
use crate::registry::{ModuleAuth, ModuleRegistry, SiteAuthConfig, SiteAuthRegistry};
use crate::resolve;
use crate::segment;

/// Which configured redirect to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectKind {
    Login,
    Register,
    Home,
    Unauthorized,
}

impl RedirectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectKind::Login => "login",
            RedirectKind::Register => "register",
            RedirectKind::Home => "home",
            RedirectKind::Unauthorized => "unauthorized",
        }
    }

    fn site_route(&self, site: &SiteAuthConfig) -> Option<String> {
        match self {
            RedirectKind::Login => site.login_route.clone(),
            RedirectKind::Register => site.register_route.clone(),
            RedirectKind::Home => site.home_route.clone(),
            RedirectKind::Unauthorized => site.unauthorized_route.clone(),
        }
    }

    fn module_route(&self, auth: &ModuleAuth) -> Option<String> {
        let route = match self {
            RedirectKind::Login => auth.login_route.as_ref(),
            RedirectKind::Register => auth.register_route.as_ref(),
            RedirectKind::Home => auth.home_route.as_ref(),
            RedirectKind::Unauthorized => auth.unauthorized_route.as_ref(),
        };
        route.or(auth.default_redirect.as_ref()).cloned()
    }

    /// Site-relative fallback when nothing is registered.
    fn fallback(&self) -> &'static str {
        match self {
            RedirectKind::Login => "auth/login",
            RedirectKind::Register => "auth/register",
            RedirectKind::Home => "",
            RedirectKind::Unauthorized => "unauthorized",
        }
    }
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedirectKind {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(RedirectKind::Login),
            "register" => Ok(RedirectKind::Register),
            "home" => Ok(RedirectKind::Home),
            "unauthorized" => Ok(RedirectKind::Unauthorized),
            other => Err(NavError::InvalidConfig(format!("unknown redirect kind '{}'", other))),
        }
    }
}

/// Qualifies routes against the registered modules and sites.
pub struct HierarchicalResolver<'a> {
    modules: &'a ModuleRegistry,
    sites: &'a SiteAuthRegistry,
}

impl<'a> HierarchicalResolver<'a> {
    pub fn new(modules: &'a ModuleRegistry, sites: &'a SiteAuthRegistry) -> Self {
        Self { modules, sites }
    }

    /// Qualify `route` under `site` and, when relevant, `module`.
    pub fn resolve(&self, route: &str, site: &str, module: Option<&str>) -> String {
        let site_root = format!("/{}", site);
        if route == site_root || route.starts_with(&format!("{}/", site_root)) {
            return route.to_string();
        }

        let mut base = vec![site];
        if route.starts_with('/') {
            let first = segment::split(route).first().copied();
            let names_module = first.is_some_and(|f| self.modules.contains(f));
            if let Some(module) = module {
                let in_module = first == Some(module);
                if !names_module && !in_module {
                    base.push(module);
                }
            }
        } else if let Some(module) = module {
            base.push(module);
        }

        resolve::append(&base, route)
    }

    /// Look up a redirect: site override, then module `auth`, then the
    /// hardcoded site default.
    pub fn redirect_route(&self, module: &str, kind: RedirectKind, site: &str) -> String {
        if let Some(route) = self.sites.get(site).and_then(|s| kind.site_route(&s)) {
            return self.resolve(&route, site, None);
        }

        let module_route = self
            .modules
            .get(module)
            .and_then(|m| m.auth.as_ref().and_then(|auth| kind.module_route(auth)));
        if let Some(route) = module_route {
            return self.resolve(&route, site, Some(module));
        }

        debug!("no {} route for {}/{}, using site default", kind, site, module);
        resolve::append(&[site], kind.fallback())
    }
}
