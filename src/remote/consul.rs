//! Consul KV source.
//!
//! # Responsibilities
//! - Build the KV listing request for a prefix
//! - Fetch all pairs under the prefix in one round-trip
//! - Decode values and fold keys (prefix stripped) into a nested tree

use std::time::Duration;

use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::config::schema::ConnectionParameters;
use crate::remote::types::{ConfigError, ConfigResult};

const TOKEN_HEADER: &str = "X-Consul-Token";

/// One entry of a `GET /v1/kv/<prefix>?recurse=true` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KvPair {
    pub key: String,
    /// Base64 payload; `null` for folder keys.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub modify_index: u64,
}

/// A configured Consul KV endpoint, ready to be read.
#[derive(Debug, Clone)]
pub struct ConsulSource {
    client: reqwest::Client,
    list_url: Url,
    address: String,
    prefix: String,
    token: Option<String>,
}

impl ConsulSource {
    /// Set up the HTTP client and request URL. Performs no I/O.
    pub fn new(params: &ConnectionParameters) -> ConfigResult<Self> {
        if params.host.trim().is_empty() {
            return Err(ConfigError::InitializationFailed(
                "host must not be empty".to_string(),
            ));
        }
        if params.port == 0 {
            return Err(ConfigError::InitializationFailed(
                "port must be greater than 0".to_string(),
            ));
        }

        let base = format!("{}://{}:{}/", params.scheme, params.url_host(), params.port);
        let mut list_url: Url = base.parse().map_err(|e| {
            ConfigError::InitializationFailed(format!("invalid store address '{}': {}", base, e))
        })?;

        // Each prefix segment is percent-encoded, so `#` or `?` stay part of the key.
        list_url
            .path_segments_mut()
            .map_err(|_| {
                ConfigError::InitializationFailed(format!("store address '{}' has no path", base))
            })?
            .pop_if_empty()
            .extend(["v1", "kv"])
            .extend(params.prefix.trim_start_matches('/').split('/'));
        {
            let mut query = list_url.query_pairs_mut();
            query.append_pair("recurse", "true");
            if let Some(dc) = &params.datacenter {
                query.append_pair("dc", dc);
            }
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(params.timeout_secs))
            .build()
            .map_err(|e| ConfigError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            client,
            list_url,
            address: params.address(),
            prefix: params.prefix.clone(),
            token: params.token.clone(),
        })
    }

    /// `host:port` this source reads from.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Full listing URL.
    pub fn url(&self) -> &Url {
        &self.list_url
    }

    /// Fetch every pair under the prefix. A missing prefix yields no pairs.
    pub async fn list(&self) -> ConfigResult<Vec<KvPair>> {
        let mut request = self.client.get(self.list_url.clone());
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConfigError::load(&self.address, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConfigError::load(
                &self.address,
                format!("store returned {}: {}", status, body.trim()),
            ));
        }

        response
            .json::<Vec<KvPair>>()
            .await
            .map_err(|e| ConfigError::load(&self.address, e))
    }

    /// Fetch and fold into a tree with the prefix stripped from every key.
    pub async fn read(&self) -> ConfigResult<(Value, usize)> {
        let pairs = self.list().await?;
        build_tree(&pairs, &self.prefix).map_err(|reason| ConfigError::load(&self.address, reason))
    }
}

/// Fold KV pairs into a nested JSON object keyed by path segment.
///
/// Returns the tree and the number of value-bearing keys placed in it.
pub fn build_tree(pairs: &[KvPair], prefix: &str) -> Result<(Value, usize), String> {
    let strip = prefix.trim_matches('/');
    let mut root = Map::new();
    let mut count = 0;

    for pair in pairs {
        let Some(encoded) = pair.value.as_deref() else {
            tracing::debug!(key = %pair.key, "Skipping folder key");
            continue;
        };

        let path = relative_path(&pair.key, strip);
        if path.is_empty() {
            tracing::debug!(key = %pair.key, "Skipping key equal to prefix");
            continue;
        }

        let value = decode_value(encoded).map_err(|e| format!("key '{}': {}", pair.key, e))?;
        insert_path(&mut root, &path, value);
        count += 1;
    }

    Ok((Value::Object(root), count))
}

fn relative_path<'a>(key: &'a str, strip: &str) -> Vec<&'a str> {
    let key = key.trim_start_matches('/');
    let rest = key.strip_prefix(strip).unwrap_or(key);
    rest.split('/').filter(|s| !s.is_empty()).collect()
}

/// Decode a base64 KV payload. JSON payloads keep their structure, anything
/// else is kept as a string.
pub fn decode_value(encoded: &str) -> Result<Value, String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| format!("invalid base64 payload: {}", e))?;
    if bytes.is_empty() {
        return Ok(Value::String(String::new()));
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => Ok(value),
        Err(_) => String::from_utf8(bytes)
            .map(Value::String)
            .map_err(|_| "payload is neither JSON nor UTF-8 text".to_string()),
    }
}

fn insert_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((leaf, dirs)) = path.split_last() else {
        return;
    };

    let mut target = root;
    for dir in dirs {
        let entry = target
            .entry(dir.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            // A deeper key wins over a scalar stored at its parent.
            *entry = Value::Object(Map::new());
        }
        let Value::Object(map) = entry else {
            return;
        };
        target = map;
    }

    match (target.get_mut(*leaf), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            existing.extend(incoming);
        }
        (Some(Value::Object(_)), _) => {
            // Children already stored under this node stay reachable.
        }
        (_, value) => {
            target.insert(leaf.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair(key: &str, raw: Option<&str>) -> KvPair {
        KvPair {
            key: key.to_string(),
            value: raw.map(|r| base64::engine::general_purpose::STANDARD.encode(r)),
            modify_index: 1,
        }
    }

    #[test]
    fn test_strips_prefix_and_nests() {
        let pairs = vec![
            pair("micro/config/", None),
            pair("micro/config/mysql", Some(r#"{"host":"10.0.0.1","port":3306}"#)),
            pair("micro/config/redis/addr", Some("127.0.0.1:6379")),
        ];

        let (tree, count) = build_tree(&pairs, "/micro/config").unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            tree,
            json!({
                "mysql": {"host": "10.0.0.1", "port": 3306},
                "redis": {"addr": "127.0.0.1:6379"}
            })
        );
    }

    #[test]
    fn test_empty_prefix_keeps_full_keys() {
        let pairs = vec![pair("app/name", Some(r#""orders""#))];
        let (tree, _) = build_tree(&pairs, "").unwrap();
        assert_eq!(tree, json!({"app": {"name": "orders"}}));
    }

    #[test]
    fn test_object_values_merge_with_children() {
        let pairs = vec![
            pair("cfg/db", Some(r#"{"user":"root"}"#)),
            pair("cfg/db/pool", Some("8")),
        ];
        let (tree, count) = build_tree(&pairs, "cfg").unwrap();
        assert_eq!(count, 2);
        assert_eq!(tree, json!({"db": {"user": "root", "pool": 8}}));
    }

    #[test]
    fn test_request_url() {
        let mut params = ConnectionParameters::new("127.0.0.1", 8500, "/micro/config");
        params.datacenter = Some("dc2".into());
        let source = ConsulSource::new(&params).unwrap();
        assert_eq!(
            source.url().as_str(),
            "http://127.0.0.1:8500/v1/kv/micro/config?recurse=true&dc=dc2"
        );
        assert_eq!(source.address(), "127.0.0.1:8500");
    }

    #[test]
    fn test_prefix_is_percent_encoded() {
        let source = ConsulSource::new(&ConnectionParameters::new("127.0.0.1", 8500, "/app/a#b?c"))
            .unwrap();
        assert_eq!(
            source.url().as_str(),
            "http://127.0.0.1:8500/v1/kv/app/a%23b%3Fc?recurse=true"
        );
        assert_eq!(source.url().fragment(), None);
        assert_eq!(
            source.url().query_pairs().collect::<Vec<_>>(),
            vec![("recurse".into(), "true".into())]
        );

        let source = ConsulSource::new(&ConnectionParameters::new("127.0.0.1", 8500, "")).unwrap();
        assert_eq!(source.url().path(), "/v1/kv/");
    }

    #[test]
    fn test_ipv6_host() {
        let source = ConsulSource::new(&ConnectionParameters::new("::1", 8500, "/micro/config"))
            .unwrap();
        assert_eq!(
            source.url().as_str(),
            "http://[::1]:8500/v1/kv/micro/config?recurse=true"
        );
        assert_eq!(source.address(), "[::1]:8500");

        let source = ConsulSource::new(&ConnectionParameters::new("[::1]", 8500, "cfg")).unwrap();
        assert_eq!(source.url().host_str(), Some("[::1]"));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let err = ConsulSource::new(&ConnectionParameters::new("", 8500, "")).unwrap_err();
        assert!(matches!(err, ConfigError::InitializationFailed(_)));

        let err = ConsulSource::new(&ConnectionParameters::new("localhost", 0, "")).unwrap_err();
        assert!(matches!(err, ConfigError::InitializationFailed(_)));

        let err =
            ConsulSource::new(&ConnectionParameters::new("bad host name", 8500, "")).unwrap_err();
        assert!(matches!(err, ConfigError::InitializationFailed(_)));
    }

    #[test]
    fn test_decode_value() {
        let b64 = |s: &str| base64::engine::general_purpose::STANDARD.encode(s);
        assert_eq!(decode_value(&b64("42")).unwrap(), json!(42));
        assert_eq!(decode_value(&b64("plain text")).unwrap(), json!("plain text"));
        assert_eq!(decode_value("").unwrap(), json!(""));
        assert!(decode_value("@@not base64@@").is_err());
    }
}
