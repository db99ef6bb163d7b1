//! Module and site registrations.
//!
//! Both registries are filled once at bootstrap and read on every
//! navigation. Re-registering a name overwrites the previous entry
//! (last write wins). There is no deregistration.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::NavError;
use crate::policy::PolicyRule;

/// Access rule for one route key within a module.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRule {
    #[serde(default = "default_true")]
    pub allow: bool,
    /// Evaluated in order; the first failing policy denies.
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for RouteRule {
    fn default() -> Self {
        Self {
            allow: true,
            policies: Vec::new(),
            redirect_to: None,
        }
    }
}

impl RouteRule {
    /// A rule that allows, subject to its policies.
    pub fn allow() -> Self {
        Self::default()
    }

    /// A rule that always denies.
    pub fn deny() -> Self {
        Self {
            allow: false,
            ..Default::default()
        }
    }

    pub fn policy(mut self, policy: PolicyRule) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn redirect_to(mut self, route: impl Into<String>) -> Self {
        self.redirect_to = Some(route.into());
        self
    }
}

/// Module-level redirect targets. Routes are written as if the module
/// were mounted at the root; they are qualified at resolution time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleAuth {
    #[serde(default)]
    pub default_redirect: Option<String>,
    #[serde(default)]
    pub login_route: Option<String>,
    #[serde(default)]
    pub register_route: Option<String>,
    #[serde(default)]
    pub home_route: Option<String>,
    #[serde(default)]
    pub unauthorized_route: Option<String>,
}

/// Identity cache windows for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// How long resolved roles/permissions stay fresh.
    #[serde(default = "default_policies_timeout_ms")]
    pub policies_timeout_ms: u64,
    /// Sessions are refreshed at least this often; cached identities
    /// never outlive it.
    #[serde(default = "default_session_refresh_ms")]
    pub session_refresh_ms: u64,
}

impl CacheConfig {
    /// Freshness window for a cached identity: the shortest of the
    /// policies timeout, the session refresh interval and, when the
    /// site declares one, its session timeout.
    pub fn identity_ttl(&self, site: Option<&SiteAuthConfig>) -> Duration {
        let mut ms = self.policies_timeout_ms.min(self.session_refresh_ms);
        if let Some(site) = site {
            ms = ms.min(site.session_timeout_ms);
        }
        Duration::from_millis(ms)
    }
}

fn default_policies_timeout_ms() -> u64 {
    300_000 // 5 min
}

fn default_session_refresh_ms() -> u64 {
    600_000 // 10 min
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policies_timeout_ms: default_policies_timeout_ms(),
            session_refresh_ms: default_session_refresh_ms(),
        }
    }
}

/// Declared configuration of one module.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleConfig {
    #[serde(rename = "name")]
    pub module_name: String,
    #[serde(default)]
    pub public_routes: BTreeSet<String>,
    /// Keyed by route without leading `/`. The empty key is the module default.
    #[serde(default)]
    pub protected_routes: BTreeMap<String, RouteRule>,
    #[serde(default)]
    pub auth: Option<ModuleAuth>,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl ModuleConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module_name: name.into(),
            ..Default::default()
        }
    }

    pub fn public_route(mut self, route: impl Into<String>) -> Self {
        self.public_routes.insert(route.into());
        self
    }

    pub fn protect(mut self, route: impl Into<String>, rule: RouteRule) -> Self {
        self.protected_routes.insert(route.into(), rule);
        self
    }

    pub fn with_auth(mut self, auth: ModuleAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Site-level redirect overrides. Consulted before a module's own `auth`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteAuthConfig {
    #[serde(default)]
    pub login_route: Option<String>,
    #[serde(default)]
    pub register_route: Option<String>,
    #[serde(default)]
    pub home_route: Option<String>,
    #[serde(default)]
    pub unauthorized_route: Option<String>,
    /// Upper bound on how long a user's identity is cached for this site.
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
}

fn default_session_timeout_ms() -> u64 {
    3_600_000 // 1h
}

impl Default for SiteAuthConfig {
    fn default() -> Self {
        Self {
            login_route: None,
            register_route: None,
            home_route: None,
            unauthorized_route: None,
            session_timeout_ms: default_session_timeout_ms(),
        }
    }
}

// ── Registries ──────────────────────────────────────────────────────

/// Module name → configuration.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<HashMap<String, Arc<ModuleConfig>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. An existing entry with the same name is replaced.
    pub fn register(&self, config: ModuleConfig) -> Result<(), NavError> {
        let name = config.module_name.trim().to_string();
        if name.is_empty() || name.contains('/') {
            return Err(NavError::InvalidConfig(format!(
                "invalid module name '{}'",
                config.module_name
            )));
        }

        let mut modules = self.modules.write().unwrap_or_else(|e| e.into_inner());
        if modules.contains_key(&name) {
            warn!("module '{}' re-registered, previous config replaced", name);
        } else {
            debug!("module '{}' registered", name);
        }
        modules.insert(name, Arc::new(config));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModuleConfig>> {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        modules.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        modules.contains_key(name)
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> Vec<String> {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = modules.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Site name → auth override.
#[derive(Default)]
pub struct SiteAuthRegistry {
    sites: RwLock<HashMap<String, Arc<SiteAuthConfig>>>,
}

impl SiteAuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a site override. An existing entry is replaced.
    pub fn register(&self, site: &str, config: SiteAuthConfig) -> Result<(), NavError> {
        let site = site.trim();
        if site.is_empty() || site.contains('/') {
            return Err(NavError::InvalidConfig(format!("invalid site name '{}'", site)));
        }

        let mut sites = self.sites.write().unwrap_or_else(|e| e.into_inner());
        if sites.insert(site.to_string(), Arc::new(config)).is_some() {
            warn!("site '{}' auth config re-registered, previous config replaced", site);
        } else {
            debug!("site '{}' auth config registered", site);
        }
        Ok(())
    }

    pub fn get(&self, site: &str) -> Option<Arc<SiteAuthConfig>> {
        let sites = self.sites.read().unwrap_or_else(|e| e.into_inner());
        sites.get(site).cloned()
    }
}
