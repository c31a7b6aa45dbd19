//! Configuration for content service module

use serde::Deserialize;

/// Content service configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum stored size of one field value in bytes
    #[serde(default = "default_max_value_size")]
    pub max_value_size: usize,

    /// Run `rich_text` values through the sanitizer before storage
    #[serde(default = "default_true")]
    pub sanitize_rich_text: bool,

    /// Ask the media library whether media identifiers exist
    #[serde(default)]
    pub verify_media: bool,

    /// Upper bound applied to every query limit
    #[serde(default = "default_max_query_limit")]
    pub max_query_limit: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_value_size: default_max_value_size(),
            sanitize_rich_text: true,
            verify_media: false,
            max_query_limit: default_max_query_limit(),
        }
    }
}

fn default_max_value_size() -> usize {
    64 * 1024
}

fn default_true() -> bool {
    true
}

fn default_max_query_limit() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_value_size, 65536);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"max_items": 3}"#).is_err());
    }
}
