//! Invocation configuration.

use crate::ProviderId;

/// A bucket plus the prefix prepended to every provider id stored in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub bucket: String,
    pub prefix: String,
}

impl Location {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Location {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Object key for `provider`. Plain concatenation: a prefix without a
    /// trailing separator runs straight into the provider id.
    pub fn key_for(&self, provider: &str) -> String {
        format!("{}{}", self.prefix, provider)
    }
}

/// How the final write stage joins its per-provider writes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WriteJoin {
    /// The first failed write rejects the whole invocation.
    #[default]
    FailFast,
    /// Failed writes are logged and dropped like failures in earlier stages.
    SettleAll,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub providers: Vec<ProviderId>,
    pub source: Location,
    pub destination: Location,
    pub write_join: WriteJoin,
}

impl SyncConfig {
    pub fn new(providers: Vec<ProviderId>, source: Location, destination: Location) -> Self {
        SyncConfig {
            providers,
            source,
            destination,
            write_join: WriteJoin::default(),
        }
    }

    pub fn with_write_join(mut self, write_join: WriteJoin) -> Self {
        self.write_join = write_join;
        self
    }
}

/// Parses the provider list as it is stored in the environment: a JSON array of strings.
pub fn parse_provider_list(raw: &str) -> Result<Vec<ProviderId>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_plain_concatenation() {
        assert_eq!(Location::new("b", "jwks/").key_for("google"), "jwks/google");
        assert_eq!(Location::new("b", "jwks").key_for("google"), "jwksgoogle");
        assert_eq!(Location::new("b", "").key_for("google"), "google");
    }

    #[test]
    fn provider_list_is_a_json_array() {
        let providers = parse_provider_list(r#"["google", "azure"]"#).unwrap();
        assert_eq!(providers, vec!["google".to_string(), "azure".to_string()]);

        assert!(parse_provider_list("[]").unwrap().is_empty());
        assert!(parse_provider_list("google,azure").is_err());
        assert!(parse_provider_list(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn write_join_defaults_to_fail_fast() {
        let config = SyncConfig::new(vec![], Location::new("s", ""), Location::new("d", ""));
        assert_eq!(config.write_join, WriteJoin::FailFast);

        let config = config.with_write_join(WriteJoin::SettleAll);
        assert_eq!(config.write_join, WriteJoin::SettleAll);
    }
}
