//! Device query clients.
//!
//! Collectors talk to devices through the [`QueryClient`] trait, using
//! RouterOS API sentence syntax for arguments. [`RestClient`] implements it
//! on top of the RouterOS v7 REST API.

use crate::config::DeviceConfig;
use crate::error::{ExporterError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// One reply row: property name to raw value.
pub type PropertyMap = HashMap<String, String>;

/// Reply to a single query, rows in the order the device returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub rows: Vec<PropertyMap>,
}

impl Reply {
    pub fn new(rows: Vec<PropertyMap>) -> Self {
        Self { rows }
    }

    pub fn first(&self) -> Option<&PropertyMap> {
        self.rows.first()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of `property` across all rows, skipping rows where it is
    /// missing or empty.
    pub fn extract_property(&self, property: &str) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(property))
            .filter(|value| !value.is_empty())
            .cloned()
            .collect()
    }
}

/// Transport used by collectors to query a device.
///
/// `args` follow the RouterOS API sentence format: `=name=value` sets an
/// attribute, `=.proplist=a,b` limits the returned properties and `?expr`
/// adds a query filter.
pub trait QueryClient: Send + Sync {
    fn run(&self, command: &str, args: &[&str]) -> Result<Reply>;
}

/// RouterOS REST API client.
pub struct RestClient {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
}

impl RestClient {
    /// Create a client for one device.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mikrotik_exporter::client::RestClient;
    /// use mikrotik_exporter::config::DeviceConfig;
    /// use std::time::Duration;
    ///
    /// let device = DeviceConfig {
    ///     name: "gw".to_string(),
    ///     address: "https://192.168.88.1".to_string(),
    ///     username: "prometheus".to_string(),
    ///     password: "secret".to_string(),
    ///     verify_tls: false,
    /// };
    /// let client = RestClient::new(&device, Duration::from_secs(10)).unwrap();
    /// ```
    pub fn new(config: &DeviceConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.address.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

impl QueryClient for RestClient {
    fn run(&self, command: &str, args: &[&str]) -> Result<Reply> {
        let url = format!("{}/rest{}", self.endpoint, command);
        let body = request_body(args)?;
        debug!("Querying {} with {:?}", url, body);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            warn!("Query {} failed: {}", command, status);
            let detail = serde_json::from_str::<RestError>(&text)
                .map(|e| e.describe())
                .unwrap_or(text);
            return Err(ExporterError::Device(format!("{} ({})", detail, status)));
        }

        parse_reply(&text)
    }
}

/// Error body returned by the REST API.
#[derive(Debug, Deserialize)]
struct RestError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    detail: Option<String>,
}

impl RestError {
    fn describe(&self) -> String {
        match &self.detail {
            Some(detail) if !detail.is_empty() => format!("{}: {}", self.message, detail),
            _ => self.message.clone(),
        }
    }
}

/// Translate API sentence words into a REST request body.
fn request_body(args: &[&str]) -> Result<Map<String, Value>> {
    let mut body = Map::new();
    let mut queries = Vec::new();

    for arg in args {
        if let Some(query) = arg.strip_prefix('?') {
            queries.push(Value::String(query.to_string()));
        } else if let Some(attribute) = arg.strip_prefix('=') {
            let (key, value) = attribute
                .split_once('=')
                .ok_or_else(|| ExporterError::InvalidQuery(arg.to_string()))?;
            if key.is_empty() {
                return Err(ExporterError::InvalidQuery(arg.to_string()));
            }
            let value = if key == ".proplist" {
                Value::Array(
                    value
                        .split(',')
                        .map(|p| Value::String(p.to_string()))
                        .collect(),
                )
            } else {
                Value::String(value.to_string())
            };
            body.insert(key.to_string(), value);
        } else {
            return Err(ExporterError::InvalidQuery(arg.to_string()));
        }
    }

    if !queries.is_empty() {
        body.insert(".query".to_string(), Value::Array(queries));
    }

    Ok(body)
}

fn parse_reply(body: &str) -> Result<Reply> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExporterError::ParseError(format!("{}. Body: {}", e, body)))?;

    let rows = match value {
        Value::Array(items) => items
            .into_iter()
            .map(parse_row)
            .collect::<Result<Vec<_>>>()?,
        Value::Object(_) => vec![parse_row(value)?],
        other => {
            return Err(ExporterError::ParseError(format!(
                "expected array or object, got {}",
                other
            )))
        }
    };

    Ok(Reply::new(rows))
}

fn parse_row(value: Value) -> Result<PropertyMap> {
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(ExporterError::ParseError(format!(
                "expected object row, got {}",
                other
            )))
        }
    };

    Ok(fields
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_translation() {
        let body = request_body(&[
            "?disabled=false",
            "=.proplist=name,rssi",
            "=numbers=lte1",
            "=once=",
        ])
        .unwrap();

        assert_eq!(
            Value::Object(body),
            json!({
                ".query": ["disabled=false"],
                ".proplist": ["name", "rssi"],
                "numbers": "lte1",
                "once": ""
            })
        );
    }

    #[test]
    fn test_request_body_rejects_bare_words() {
        assert!(matches!(
            request_body(&["numbers"]),
            Err(ExporterError::InvalidQuery(_))
        ));
        assert!(request_body(&["=novalue"]).is_err());
    }

    #[test]
    fn test_parse_reply_stringifies_values() {
        let reply = parse_reply(r#"[{"name": "lte1", "mtu": 1500, "running": true, "comment": null}]"#)
            .unwrap();
        let row = reply.first().unwrap();
        assert_eq!(row["name"], "lte1");
        assert_eq!(row["mtu"], "1500");
        assert_eq!(row["running"], "true");
        assert!(!row.contains_key("comment"));
    }

    #[test]
    fn test_parse_reply_single_object() {
        let reply = parse_reply(r#"{"uptime": "1d"}"#).unwrap();
        assert_eq!(reply.rows.len(), 1);
    }

    #[test]
    fn test_extract_property_skips_missing() {
        let reply = Reply::new(vec![
            PropertyMap::from([("name".to_string(), "lte1".to_string())]),
            PropertyMap::new(),
            PropertyMap::from([("name".to_string(), "lte2".to_string())]),
        ]);
        assert_eq!(reply.extract_property("name"), vec!["lte1", "lte2"]);
    }
}
