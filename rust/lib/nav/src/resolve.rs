//! Contextual route resolution.
//!
//! Turns a link target written relative to "wherever the module is
//! mounted" into a concrete path, given the page the user is on:
//!
//! ```text
//! resolve("edit",    "/acme/marketing/items/507f1f77bcf86cd799439011", Auto)
//!     → "/acme/marketing/items/edit"
//! resolve("reports", "/acme/marketing/auth/users", Module)
//!     → "/acme/marketing/reports"
//! resolve("/acme",   <anything>, <anything but Absolute>)
//!     → "/acme"
//! ```

use crate::scope::Scope;
use crate::segment::{self, DEFAULT_SUBMODULE_MARKERS};

/// Per-call-site resolution switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Treat a leading-`/` target as relative to the scope instead of
    /// returning it unchanged.
    pub contextualize_absolute: bool,
}

/// Resolve `target` against `current_path` with the default options.
pub fn resolve(target: &str, current_path: &str, scope: Scope) -> String {
    resolve_with(target, current_path, scope, ResolveOptions::default())
}

/// Resolve `target` against `current_path`, recognizing submodules by
/// [`DEFAULT_SUBMODULE_MARKERS`].
pub fn resolve_with(
    target: &str,
    current_path: &str,
    scope: Scope,
    options: ResolveOptions,
) -> String {
    resolve_in(target, current_path, scope, options, |s| {
        DEFAULT_SUBMODULE_MARKERS.contains(&s)
    })
}

/// Resolve `target` against `current_path`, asking `is_submodule`
/// whether a third segment names an embedded submodule.
pub fn resolve_in(
    target: &str,
    current_path: &str,
    scope: Scope,
    options: ResolveOptions,
    is_submodule: impl Fn(&str) -> bool,
) -> String {
    if scope == Scope::Absolute {
        return format!("/{}", target.trim_start_matches('/'));
    }

    if target.starts_with('/') && !options.contextualize_absolute {
        return target.to_string();
    }

    let current = segment::split(current_path);
    let base: &[&str] = match scope {
        Scope::Current => &current,
        Scope::Parent => drop_last(&current),
        Scope::Site | Scope::Root => prefix(&current, 1),
        Scope::Module => prefix(&current, 2),
        Scope::Submodule => {
            let in_submodule = current.get(2).is_some_and(|s| is_submodule(s));
            prefix(&current, if in_submodule { 3 } else { 2 })
        }
        Scope::Auto => match current.last() {
            Some(last) if segment::looks_like_id(last) => drop_last(&current),
            _ => &current,
        },
        Scope::Absolute => &[],
    };

    append(base, target)
}

fn drop_last<'a>(segs: &'a [&'a str]) -> &'a [&'a str] {
    &segs[..segs.len().saturating_sub(1)]
}

fn prefix<'a>(segs: &'a [&'a str], n: usize) -> &'a [&'a str] {
    &segs[..segs.len().min(n)]
}

/// Append a relative target to base segments, normalizing slashes.
pub(crate) fn append(base: &[&str], target: &str) -> String {
    let mut segs: Vec<&str> = base.iter().copied().filter(|s| !s.is_empty()).collect();
    segs.extend(segment::split(target));
    segment::join(&segs)
}
