//! JSON-RPC plumbing for talking to Kodi
//!
//! This module provides the request type used by every other component and
//! the `Transport` trait that carries those requests to the media player.
//! The HTTP implementation lives in `http`; tests use an in-memory fake.
mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpTransport;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors that can occur while performing a JSON-RPC call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The endpoint could not be reached
    #[error("Request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success HTTP status
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// The response body was not valid JSON-RPC
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Kodi answered with a JSON-RPC error object
    #[error("Kodi returned error {code}: {message}")]
    Remote { code: i64, message: String },
}

impl RpcError {
    /// Builds a `Remote` error from the `error` member of a JSON-RPC response.
    pub(crate) fn from_error_object(error: &Value) -> Self {
        RpcError::Remote {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        }
    }

    /// True for failures where the server never produced a usable answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Request(_) | RpcError::Http { .. })
    }
}

/// How a request is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Payload URL-encoded into the `request` query parameter
    Get,
    /// Payload sent as the JSON body
    Post,
}

/// A single JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    jsonrpc: &'static str,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
    pub id: Value,
    #[serde(skip)]
    pub verb: Verb,
}

impl RpcRequest {
    /// A read-only request, sent as GET.
    pub fn query(method: &'static str, params: Value) -> Self {
        Self::new(method, params, Verb::Get)
    }

    /// A request that changes player state, sent as POST.
    pub fn command(method: &'static str, params: Value) -> Self {
        Self::new(method, params, Verb::Post)
    }

    fn new(method: &'static str, params: Value, verb: Verb) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id: json!(1),
            verb,
        }
    }

    /// Replaces the request id (Kodi echoes it back unchanged).
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = id.into();
        self
    }

    /// The JSON payload as it goes on the wire.
    pub fn to_json(&self) -> String {
        // Serializing a struct of strings and `Value`s cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Trait for anything that can deliver a JSON-RPC request to Kodi.
///
/// Implementors return the `result` member of the response, or
/// `RpcError::Remote` if the response carried an `error` member instead.
/// A response with neither yields `Value::Null`.
pub trait Transport {
    /// Sends the request and returns the decoded `result`.
    fn call(&self, request: &RpcRequest) -> Result<Value, RpcError>;

    /// Human-readable description of where requests go, for messages.
    fn describe(&self) -> String;
}

/// Splits a full JSON-RPC response into its `result` or its `error`.
pub(crate) fn unwrap_response(response: Value) -> Result<Value, RpcError> {
    if let Some(error) = response.get("error") {
        if !error.is_null() {
            return Err(RpcError::from_error_object(error));
        }
    }

    Ok(response.get("result").cloned().unwrap_or(Value::Null))
}

/// Checks that Kodi is reachable and speaking JSON-RPC.
pub fn ping<T: Transport + ?Sized>(transport: &T) -> Result<(), RpcError> {
    let result = transport.call(&RpcRequest::query("JSONRPC.Ping", Value::Null))?;
    tracing::debug!(%result, "Ping answered");
    Ok(())
}
