//! Contextual routing and access policy for multi-site admin front-ends.
//!
//! Business modules (marketing, banking, wallet, ...) are mounted under
//! sites at `/{site}/{module}/...`, yet each module writes its links,
//! redirects, and access rules as if it were mounted at the root. This
//! crate turns those module-relative declarations into concrete paths
//! and allow/deny decisions.
//!
//! # Pieces
//!
//! - [`segment`]: split paths, spot resource ids, derive [`RouteContext`]
//! - [`resolve`]: relative target + current path + [`Scope`] → path
//! - [`registry`]: module and site registrations
//! - [`policy`]: route rule lookup and policy evaluation
//! - [`hierarchy`]: qualify redirect targets under site/module
//! - [`menu`]: normalize declarative menu trees
//! - [`RoutingContext`]: owns the registries and identity lookup
//!
//! Nothing here performs navigation or I/O itself. The UI supplies a
//! [`Navigator`]; user roles come from an [`IdentityProvider`].
//!
//! # Example
//!
//! ```ignore
//! let provider = StaticIdentityProvider::new();
//! provider.grant("alice", "acme", ["marketing"], Vec::<String>::new());
//!
//! let ctx = RoutingContext::new(Arc::new(provider));
//! ctx.register_module(
//!     ModuleConfig::new("marketing")
//!         .protect("", RouteRule::allow().policy(PolicyRule::roles(["admin", "marketing"]))),
//! )?;
//!
//! let decision = ctx.evaluate_access("marketing", "", Some(&User::new("alice")), "acme", &AccessContext::new());
//! assert!(decision.allow);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod hierarchy;
pub mod identity;
pub mod menu;
pub mod navigate;
pub mod policy;
pub mod registry;
pub mod resolve;
pub mod scope;
pub mod segment;

// Re-export primary types at crate root.
pub use config::NavConfig;
pub use context::RoutingContext;
pub use error::{BoxError, NavError};
pub use hierarchy::{HierarchicalResolver, RedirectKind};
pub use identity::{Identity, IdentityCache, IdentityProvider, StaticIdentityProvider, User};
pub use menu::{MenuNode, MenuNormalizer};
pub use navigate::{NavigationOutcome, Navigator};
pub use policy::{AccessContext, AccessDecision, PolicyEngine, PolicyRule};
pub use registry::{CacheConfig, ModuleAuth, ModuleConfig, RouteRule, SiteAuthConfig};
pub use resolve::{ResolveOptions, resolve, resolve_with};
pub use scope::Scope;
pub use segment::{RouteContext, looks_like_id};
