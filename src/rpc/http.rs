//! HTTP transport for Kodi's JSON-RPC endpoint.

use super::{RpcError, RpcRequest, Transport, Verb, unwrap_response};
use crate::config::Config;
use serde_json::Value;
use std::time::Duration;

/// Transport that talks to `http://<host>:<port>/jsonrpc`.
///
/// Credentials are sent as an HTTP Basic `Authorization` header rather than
/// being embedded in the URL.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    username: String,
    password: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for the given configuration.
    pub fn new(config: &Config) -> Result<Self, RpcError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("kodi-control/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RpcError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn build(&self, request: &RpcRequest) -> reqwest::blocking::RequestBuilder {
        let builder = match request.verb {
            Verb::Get => self
                .client
                .get(&self.endpoint)
                .query(&[("request", request.to_json())]),
            Verb::Post => self
                .client
                .post(&self.endpoint)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(request.to_json()),
        };

        if self.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.username, self.password.as_deref())
        }
    }
}

impl Transport for HttpTransport {
    fn call(&self, request: &RpcRequest) -> Result<Value, RpcError> {
        tracing::debug!(method = request.method, verb = ?request.verb, "JSON-RPC request");

        let response = self
            .build(request)
            .send()
            .map_err(|e| RpcError::Request(e.to_string()))?;

        // Ensure request was successful
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(method = request.method, status = status.as_u16(), "Kodi HTTP error");
            return Err(RpcError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        // Parse the JSON response
        let body: Value = response
            .json()
            .map_err(|e| RpcError::Parse(e.to_string()))?;

        unwrap_response(body)
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
    use serde_json::json;

    fn transport(username: &str, password: Option<&str>) -> HttpTransport {
        let config = Config {
            username: username.to_string(),
            password: password.map(str::to_string),
            ..Config::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_get_puts_payload_in_query() {
        let request = RpcRequest::query("VideoLibrary.GetMovies", json!({"properties": ["file"]}));
        let built = transport("kodi", Some("abc")).build(&request).build().unwrap();

        assert_eq!(*built.method(), reqwest::Method::GET);
        assert_eq!(built.url().path(), "/jsonrpc");
        let payload = built
            .url()
            .query_pairs()
            .find(|(key, _)| key == "request")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        assert_eq!(payload, request.to_json());
        assert!(built.body().is_none());
    }

    #[test]
    fn test_post_sends_json_body() {
        let request = RpcRequest::command("Player.PlayPause", json!({"playerid": 1}));
        let built = transport("kodi", None).build(&request).build().unwrap();

        assert_eq!(*built.method(), reqwest::Method::POST);
        assert!(built.url().query().is_none());
        assert_eq!(built.headers()[CONTENT_TYPE], "application/json");

        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        let sent: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent["method"], "Player.PlayPause");
        assert_eq!(sent["params"]["playerid"], 1);
    }

    #[test]
    fn test_credentials_go_in_header() {
        let request = RpcRequest::query("JSONRPC.Ping", Value::Null);
        let built = transport("kodi", Some("abc")).build(&request).build().unwrap();

        assert_eq!(built.headers()[AUTHORIZATION], "Basic a29kaTphYmM=");
        assert_eq!(built.url().username(), "");
        assert!(built.url().password().is_none());
        assert!(!built.url().as_str().contains("abc"));
    }

    #[test]
    fn test_empty_username_sends_no_auth() {
        let request = RpcRequest::query("JSONRPC.Ping", Value::Null);
        let built = transport("", Some("abc")).build(&request).build().unwrap();
        assert!(built.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_describe_is_endpoint() {
        assert_eq!(transport("kodi", None).describe(), "http://localhost:8080/jsonrpc");
    }
}
