//! Target-server capability.
//!
//! The executor and extractor consume exactly two operations, `exec` and
//! `query`; everything else about the transport is an implementation
//! detail. The production implementation speaks the ClickHouse HTTP
//! interface over [`reqwest`]; tests substitute an in-memory fake.

use std::time::Duration;

use serde::Deserialize;

use crate::config::ConnectionConfig;
use crate::error::{Result, config_error, runtime_error};

/// The narrow server capability the core depends on.
pub trait ClickHouseExec {
    /// Execute a statement, discarding any result.
    fn exec(&self, sql: &str) -> impl Future<Output = Result<()>> + Send;

    /// Run a query and return its rows as strings.
    fn query(&self, sql: &str) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send;
}

#[derive(Debug, Deserialize)]
struct JsonCompactResponse {
    data: Vec<Vec<serde_json::Value>>
}

/// ClickHouse HTTP interface client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http:     reqwest::Client,
    url:      String,
    username: Option<String>,
    password: Option<String>
}

impl HttpClient {
    /// Build a client from connection config. The per-statement timeout is
    /// enforced at this layer; a timed-out statement surfaces as a runtime
    /// error and takes the executor's partial-save path.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(config_error("clickhouse url is not configured"));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| config_error(format!("cannot build http client: {}", e)))?;
        Ok(Self {
            http,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone()
        })
    }

    async fn post(&self, sql: &str, default_format: Option<&str>) -> Result<String> {
        let mut request = self.http.post(&self.url).body(sql.to_string());
        if let Some(format) = default_format {
            request = request.query(&[("default_format", format)]);
        }
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        let response = request
            .send()
            .await
            .map_err(|e| runtime_error(format!("clickhouse request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| runtime_error(format!("clickhouse response failed: {}", e)))?;
        if !status.is_success() {
            return Err(runtime_error(format!(
                "clickhouse returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(body)
    }
}

impl ClickHouseExec for HttpClient {
    async fn exec(&self, sql: &str) -> Result<()> {
        self.post(sql, None).await.map(|_| ())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Vec<String>>> {
        let body = self.post(sql, Some("JSONCompact")).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let response: JsonCompactResponse = serde_json::from_str(&body)
            .map_err(|e| runtime_error(format!("cannot decode clickhouse response: {}", e)))?;
        Ok(response
            .data
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|value| match value {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Null => String::new(),
                        other => other.to_string()
                    })
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_config_error() {
        let config = ConnectionConfig {
            url: String::new(),
            ..Default::default()
        };
        let err = HttpClient::connect(&config).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config { .. }));
    }

    #[test]
    fn json_compact_rows_decode_to_strings() {
        let body = r#"{"meta":[],"data":[["app","Atomic"],["other","Lazy"]],"rows":2}"#;
        let response: JsonCompactResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0][0], "app");
    }
}
