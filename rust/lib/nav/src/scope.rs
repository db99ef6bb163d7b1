use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NavError;

/// Strategy for turning a relative navigation target into an absolute path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Append to the current path.
    Current,
    /// Drop the last segment of the current path, then append.
    Parent,
    /// Keep only the site segment.
    Site,
    /// Keep site + module, even from inside a submodule.
    Module,
    /// Keep site + module + submodule when inside one, else site + module.
    Submodule,
    /// Alias for [`Scope::Site`].
    Root,
    /// Ignore the current path entirely.
    Absolute,
    /// Replace a trailing resource id, else append to the current path.
    #[default]
    Auto,
}

impl Scope {
    pub const ALL: [Scope; 8] = [
        Scope::Current,
        Scope::Parent,
        Scope::Site,
        Scope::Module,
        Scope::Submodule,
        Scope::Root,
        Scope::Absolute,
        Scope::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Current => "current",
            Scope::Parent => "parent",
            Scope::Site => "site",
            Scope::Module => "module",
            Scope::Submodule => "submodule",
            Scope::Root => "root",
            Scope::Absolute => "absolute",
            Scope::Auto => "auto",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| NavError::InvalidConfig(format!("unknown scope '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_every_name() {
        for scope in Scope::ALL {
            assert_eq!(scope.as_str().parse::<Scope>().unwrap(), scope);
        }
    }

    #[test]
    fn parse_unknown_scope() {
        let err = "sideways".parse::<Scope>().unwrap_err();
        assert_eq!(err.to_string(), "invalid config: unknown scope 'sideways'");
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Scope::Submodule).unwrap(), "\"submodule\"");
        let s: Scope = serde_json::from_str("\"root\"").unwrap();
        assert_eq!(s, Scope::Root);
    }

    #[test]
    fn default_is_auto() {
        assert_eq!(Scope::default(), Scope::Auto);
    }
}
