use thiserror::Error;

/// Boxed error returned by match callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Navigation core error type.
///
/// Only bootstrap (config loading, registration) and the identity
/// provider surface these. Resolution and access evaluation are total
/// and degrade to a logged fallback instead.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("identity: {0}")]
    Identity(String),

    #[error("callback: {0}")]
    Callback(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_by_category() {
        assert_eq!(
            NavError::InvalidConfig("empty module name".into()).to_string(),
            "invalid config: empty module name"
        );
        assert_eq!(
            NavError::Identity("backend down".into()).to_string(),
            "identity: backend down"
        );
        assert_eq!(NavError::Callback("boom".into()).to_string(), "callback: boom");
    }

    #[test]
    fn io_errors_convert() {
        let err: NavError = std::io::Error::new(std::io::ErrorKind::NotFound, "nav.toml").into();
        assert!(matches!(err, NavError::Io(_)));
        assert!(err.to_string().starts_with("io: "));
    }
}
