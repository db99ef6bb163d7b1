//! User identity and the role/permission lookup seam.
//!
//! The core never stores users. It only asks an [`IdentityProvider`]
//! for a user's role and permission names within a site, and keeps the
//! answer in an [`IdentityCache`] for the module's configured window.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::NavError;

/// The signed-in user, as far as routing cares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Resolves role and permission names for a user within a site.
pub trait IdentityProvider: Send + Sync + 'static {
    fn user_roles(&self, user_id: &str, site: &str) -> Result<Vec<String>, NavError>;

    fn user_permissions(&self, user_id: &str, site: &str) -> Result<Vec<String>, NavError>;
}

/// Resolved grants of one user in one site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub roles: HashSet<String>,
    pub permissions: HashSet<String>,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

// ── StaticIdentityProvider ──────────────────────────────────────────

/// In-memory provider keyed by `(user, site)`. Used by bootstrap config
/// and tests.
#[derive(Default)]
pub struct StaticIdentityProvider {
    grants: RwLock<HashMap<(String, String), Identity>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant roles and permissions to a user within a site. Adds to any
    /// existing grants.
    pub fn grant<R, P>(&self, user_id: &str, site: &str, roles: R, permissions: P)
    where
        R: IntoIterator,
        R::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let mut grants = self.grants.write().unwrap_or_else(|e| e.into_inner());
        let entry = grants
            .entry((user_id.to_string(), site.to_string()))
            .or_default();
        entry.roles.extend(roles.into_iter().map(Into::into));
        entry.permissions.extend(permissions.into_iter().map(Into::into));
    }

    fn lookup(&self, user_id: &str, site: &str, f: impl Fn(&Identity) -> &HashSet<String>) -> Vec<String> {
        let grants = self.grants.read().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<String> = grants
            .get(&(user_id.to_string(), site.to_string()))
            .map(|id| f(id).iter().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn user_roles(&self, user_id: &str, site: &str) -> Result<Vec<String>, NavError> {
        Ok(self.lookup(user_id, site, |id| &id.roles))
    }

    fn user_permissions(&self, user_id: &str, site: &str) -> Result<Vec<String>, NavError> {
        Ok(self.lookup(user_id, site, |id| &id.permissions))
    }
}

// ── IdentityCache ───────────────────────────────────────────────────

struct CacheEntry {
    identity: Arc<Identity>,
    inserted_at: Instant,
}

/// In-memory cache for `(user, site)` → resolved identity.
///
/// The TTL is supplied per lookup because each module configures its
/// own window.
#[derive(Default)]
pub struct IdentityCache {
    entries: RwLock<HashMap<(String, String), CacheEntry>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached identity younger than `ttl`.
    pub fn get(&self, user_id: &str, site: &str, ttl: Duration) -> Option<Arc<Identity>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(user_id.to_string(), site.to_string()))
            .filter(|entry| entry.inserted_at.elapsed() < ttl)
            .map(|entry| Arc::clone(&entry.identity))
    }

    pub fn set(&self, user_id: &str, site: &str, identity: Arc<Identity>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            (user_id.to_string(), site.to_string()),
            CacheEntry {
                identity,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, user_id: &str, site: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&(user_id.to_string(), site.to_string()));
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}
