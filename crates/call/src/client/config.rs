use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::dispatcher::DEFAULT_MAX_REQUESTS;

/// Tunables of a [`Client`](super::Client), loadable from any serde format.
///
/// Missing fields take their defaults: no call timeout and [`DEFAULT_MAX_REQUESTS`]. The call
/// timeout is read from `call_timeout_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(rename = "call_timeout_ms", deserialize_with = "millis")]
    pub call_timeout: Option<Duration>,
    pub max_requests: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { call_timeout: None, max_requests: DEFAULT_MAX_REQUESTS }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ClientConfig;

    #[test]
    fn defaults() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.max_requests, 64);
        assert_eq!(config.call_timeout, None);
    }

    #[test]
    fn full() {
        let config: ClientConfig = serde_json::from_str(r#"{"call_timeout_ms": 3000, "max_requests": 8}"#).unwrap();
        assert_eq!(config.call_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.max_requests, 8);
    }

    #[test]
    fn null_timeout_is_unlimited() {
        let config: ClientConfig = serde_json::from_str(r#"{"call_timeout_ms": null}"#).unwrap();
        assert_eq!(config.call_timeout, None);
    }
}
