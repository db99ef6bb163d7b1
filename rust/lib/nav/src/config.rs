//! Bootstrap configuration file.
//!
//! Declares sites, modules, and (for the in-memory identity provider)
//! users in TOML:
//!
//! ```toml
//! [[sites]]
//! name = "acme"
//! login_route = "/acme/auth/login"
//!
//! [[modules]]
//! name = "marketing"
//! public_routes = ["landing"]
//!
//! [modules.auth]
//! home_route = "dashboard"
//!
//! [modules.protected_routes.""]
//! policies = [{ roles = ["admin", "marketing"] }]
//!
//! [modules.protected_routes."campaigns/archive"]
//! allow = false
//! redirect_to = "campaigns"
//!
//! [[users]]
//! id = "alice"
//!
//! [users.sites.acme]
//! roles = ["marketing"]
//! permissions = ["campaign.create"]
//! ```
//!
//! Callback policies cannot be expressed here; register them in code.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::context::RoutingContext;
use crate::error::NavError;
use crate::identity::StaticIdentityProvider;
use crate::registry::{ModuleConfig, SiteAuthConfig};

/// One `[[sites]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    pub name: String,
    #[serde(flatten)]
    pub auth: SiteAuthConfig,
}

/// Roles and permissions of a user within one site.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteGrants {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// One `[[users]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub id: String,
    #[serde(default)]
    pub sites: BTreeMap<String, SiteGrants>,
}

/// Parsed bootstrap file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NavConfig {
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

impl NavConfig {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self, NavError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, NavError> {
        Ok(toml::from_str(content)?)
    }

    /// Register everything into a fresh [`RoutingContext`] backed by a
    /// [`StaticIdentityProvider`] holding the declared users.
    pub fn into_context(self) -> Result<RoutingContext, NavError> {
        let provider = StaticIdentityProvider::new();
        for user in &self.users {
            if user.id.trim().is_empty() {
                return Err(NavError::InvalidConfig("user with empty id".into()));
            }
            for (site, grants) in &user.sites {
                provider.grant(&user.id, site, grants.roles.iter().cloned(), grants.permissions.iter().cloned());
            }
        }

        let ctx = RoutingContext::new(Arc::new(provider));
        for site in self.sites {
            ctx.register_site_auth_config(&site.name, site.auth)?;
        }
        for module in self.modules {
            ctx.register_module(module)?;
        }
        debug!(
            "navigation context ready: {} modules, {} users",
            ctx.modules().names().len(),
            self.users.len()
        );
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::hierarchy::RedirectKind;
    use crate::identity::User;
    use crate::policy::AccessContext;

    const SAMPLE: &str = r#"
[[sites]]
name = "acme"
unauthorized_route = "/acme/denied"
session_timeout_ms = 900000

[[modules]]
name = "marketing"
public_routes = ["landing"]

[modules.auth]
home_route = "dashboard"

[modules.cache]
policies_timeout_ms = 1000

[modules.protected_routes.""]
policies = [{ roles = ["admin", "marketing"] }]

[modules.protected_routes."campaigns/archive"]
allow = false
redirect_to = "campaigns"

[[modules]]
name = "banking"

[[users]]
id = "alice"

[users.sites.acme]
roles = ["marketing"]
permissions = ["campaign.create"]
"#;

    #[test]
    fn parse_sample() {
        let config = NavConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].auth.session_timeout_ms, 900_000);
        assert_eq!(config.modules.len(), 2);

        let marketing = &config.modules[0];
        assert_eq!(marketing.module_name, "marketing");
        assert_eq!(marketing.cache.policies_timeout_ms, 1000);
        assert_eq!(marketing.cache.session_refresh_ms, 600_000);
        assert_eq!(marketing.protected_routes[""].policies[0].roles, vec!["admin", "marketing"]);
        assert!(marketing.protected_routes[""].allow);
        assert!(!marketing.protected_routes["campaigns/archive"].allow);
        assert!(config.modules[1].auth.is_none());
    }

    #[test]
    fn into_context_registers_everything() {
        let ctx = NavConfig::parse(SAMPLE).unwrap().into_context().unwrap();
        assert_eq!(ctx.modules().names(), vec!["banking", "marketing"]);

        let alice = User::new("alice");
        let access = AccessContext::new();
        assert!(ctx.evaluate_access("marketing", "", Some(&alice), "acme", &access).allow);
        assert!(!ctx.evaluate_access("marketing", "", Some(&User::new("bob")), "acme", &access).allow);

        assert_eq!(ctx.get_redirect_route("marketing", RedirectKind::Home, "acme"), "/acme/marketing/dashboard");
        assert_eq!(ctx.get_redirect_route("marketing", RedirectKind::Unauthorized, "acme"), "/acme/denied");
    }

    #[test]
    fn unknown_policy_field_rejected() {
        let err = NavConfig::parse(
            r#"
[[modules]]
name = "m"
[modules.protected_routes.""]
policies = [{ role = ["admin"] }]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, NavError::Parse(_)));
    }

    #[test]
    fn empty_module_name_rejected() {
        let config = NavConfig::parse("[[modules]]\nname = \"\"\n").unwrap();
        assert!(matches!(config.into_context(), Err(NavError::InvalidConfig(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = NavConfig::load(file.path()).unwrap();
        assert_eq!(config.users[0].id, "alice");
        assert_eq!(config.users[0].sites["acme"].permissions, vec!["campaign.create"]);
    }

    #[test]
    fn load_missing_file() {
        let err = NavConfig::load(Path::new("/nonexistent/nav.toml")).unwrap_err();
        assert!(matches!(err, NavError::Io(_)));
    }
}
