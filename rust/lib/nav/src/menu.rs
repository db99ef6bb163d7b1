//! Menu normalization.
//!
//! Menus are declared as loose JSON trees with module-relative URLs.
//! Normalizing keeps the known fields, resolves every URL with the same
//! scope rules the router uses, and drops malformed entries so one bad
//! node cannot break the whole menu.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::resolve::{self, ResolveOptions};
use crate::scope::Scope;
use crate::segment::RouteContext;

/// A normalized menu entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuNode {
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

/// Normalizes menu trees for the page at `current_path`.
pub struct MenuNormalizer<'a, F> {
    current_path: &'a str,
    route: RouteContext,
    is_submodule: F,
}

impl<'a, F> MenuNormalizer<'a, F>
where
    F: Fn(&str) -> bool,
{
    pub fn new(current_path: &'a str, is_submodule: F) -> Self {
        let route = RouteContext::parse(current_path, &is_submodule);
        Self {
            current_path,
            route,
            is_submodule,
        }
    }

    /// Normalize `items`, resolving URLs with each node's own scope or
    /// `default_scope`.
    pub fn normalize(&self, items: &[Value], default_scope: Scope) -> Vec<MenuNode> {
        self.normalize_level(items, default_scope, "menu")
    }

    fn normalize_level(&self, items: &[Value], default_scope: Scope, at: &str) -> Vec<MenuNode> {
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| self.normalize_node(item, default_scope, &format!("{}[{}]", at, i)))
            .collect()
    }

    fn normalize_node(&self, item: &Value, default_scope: Scope, at: &str) -> Option<MenuNode> {
        let Some(obj) = item.as_object() else {
            warn!("dropping menu node {}: not an object", at);
            return None;
        };

        let field = |name: &str| {
            obj.get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let (Some(key), Some(label)) = (field("key"), field("label")) else {
            warn!("dropping menu node {}: missing key or label", at);
            return None;
        };

        let scope = field("scope").and_then(|s| match s.parse::<Scope>() {
            Ok(scope) => Some(scope),
            Err(e) => {
                warn!("menu node {} ({}): {}, using {}", at, key, e, default_scope);
                None
            }
        });

        // An empty url is meaningful: the root of its scope.
        let url = obj
            .get("url")
            .and_then(Value::as_str)
            .map(|u| self.resolve_url(u.trim(), scope.unwrap_or(default_scope)));

        let children = match obj.get("children") {
            Some(Value::Array(children)) => {
                self.normalize_level(children, default_scope, &format!("{}.children", at))
            }
            _ => Vec::new(),
        };

        Some(MenuNode {
            key: key.to_string(),
            label: label.to_string(),
            url,
            kind: field("type").map(str::to_string),
            scope,
            icon: obj.get("icon").filter(|v| !v.is_null()).cloned(),
            children,
        })
    }

    fn resolve_url(&self, url: &str, scope: Scope) -> String {
        if has_scheme(url) {
            return url.to_string();
        }
        let scope = match scope {
            Scope::Auto if self.route.is_in_module => Scope::Module,
            Scope::Auto => Scope::Site,
            other => other,
        };
        resolve::resolve_in(
            url,
            self.current_path,
            scope,
            ResolveOptions::default(),
            &self.is_submodule,
        )
    }
}

/// `https://…`, `mailto:…` and the like.
fn has_scheme(url: &str) -> bool {
    match url.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
