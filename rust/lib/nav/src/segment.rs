//! Path segmentation.
//!
//! A concrete admin path has the shape `/{site}/{module}/{submodule}/{rest...}`:
//! - `/acme`: site root
//! - `/acme/marketing/campaigns`: inside the `marketing` module
//! - `/acme/admin/auth/users`: inside the `auth` submodule of `admin`
//!
//! Everything here is a total function over strings.

use serde::Serialize;

/// Third-segment names that mark an embedded submodule when no registry
/// is consulted.
pub const DEFAULT_SUBMODULE_MARKERS: &[&str] = &["auth"];

/// A path split into its routing positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSegments<'a> {
    pub site: Option<&'a str>,
    pub module: Option<&'a str>,
    pub submodule: Option<&'a str>,
    pub rest: Vec<&'a str>,
}

/// Split a path on `/`, discarding empty segments.
pub fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join segments into an absolute path. No segments yields `/`.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for s in segments {
        out.push('/');
        out.push_str(s.as_ref());
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Split a path into `{site, module, submodule, rest}`.
pub fn segment(path: &str) -> PathSegments<'_> {
    let mut parts = split(path).into_iter();
    PathSegments {
        site: parts.next(),
        module: parts.next(),
        submodule: parts.next(),
        rest: parts.collect(),
    }
}

/// Whether a segment looks like an opaque resource identifier rather
/// than a route name.
///
/// Recognized shapes:
/// - 24 hex chars (document id, e.g. `507f1f77bcf86cd799439011`)
/// - 36-char UUID with hyphens at 8/13/18/23
/// - more than 8 chars of `[0-9a-z_-]`, which includes longer plain
///   words such as `campaigns`
pub fn looks_like_id(segment: &str) -> bool {
    is_document_id(segment) || is_uuid(segment) || is_slug_id(segment)
}

fn is_document_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36
        && s.bytes().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
}

fn is_slug_id(s: &str) -> bool {
    s.len() > 8
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase() || b == b'_' || b == b'-')
}

/// Routing position derived from a concrete path. Recomputed on every
/// call, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteContext {
    pub site: String,
    pub module: Option<String>,
    pub submodule: Option<String>,
    /// `/{site}`
    pub base_path: String,
    /// `/{site}/{module}`, or `base_path` outside a module.
    pub module_path: String,
    /// `/{site}/{module}/{submodule}`, or `module_path` outside a submodule.
    pub full_context: String,
    pub is_in_module: bool,
    pub is_in_submodule: bool,
}

impl RouteContext {
    /// Derive a context using [`DEFAULT_SUBMODULE_MARKERS`].
    pub fn from_path(path: &str) -> Self {
        Self::parse(path, |s| DEFAULT_SUBMODULE_MARKERS.contains(&s))
    }

    /// Derive a context, asking `is_submodule` whether the third segment
    /// names an embedded submodule.
    pub fn parse(path: &str, is_submodule: impl Fn(&str) -> bool) -> Self {
        let segs = segment(path);
        let site = segs.site.unwrap_or_default().to_string();
        let module = segs.module.map(str::to_string);
        let submodule = match (module.as_ref(), segs.submodule) {
            (Some(_), Some(sub)) if is_submodule(sub) => Some(sub.to_string()),
            _ => None,
        };

        let base_path = if site.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", site)
        };
        let module_path = match &module {
            Some(m) => format!("/{}/{}", site, m),
            None => base_path.clone(),
        };
        let full_context = match &submodule {
            Some(sub) => format!("{}/{}", module_path, sub),
            None => module_path.clone(),
        };

        Self {
            is_in_module: module.is_some(),
            is_in_submodule: submodule.is_some(),
            site,
            module,
            submodule,
            base_path,
            module_path,
            full_context,
        }
    }
}
