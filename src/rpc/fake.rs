//! In-memory transport for unit tests
//!
//! Responses are registered per JSON-RPC method. Each call pops the next
//! queued response for its method; the last one keeps being replayed.
//! Every request is recorded so tests can assert on what was sent.

use super::{RpcError, RpcRequest, Transport, unwrap_response};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
enum Canned {
    /// A full JSON-RPC response body
    Body(Value),
    /// The server could not be reached
    Unreachable,
}

#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: RefCell<HashMap<&'static str, VecDeque<Canned>>>,
    requests: RefCell<Vec<RpcRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response carrying `result`.
    pub fn with_result(self, method: &'static str, result: Value) -> Self {
        self.with_body(
            method,
            serde_json::json!({"id": 1, "jsonrpc": "2.0", "result": result}),
        )
    }

    /// Queues a JSON-RPC error response.
    pub fn with_error(self, method: &'static str) -> Self {
        self.with_body(
            method,
            serde_json::json!({
                "id": 1,
                "jsonrpc": "2.0",
                "error": {"code": -32100, "message": "Failed to execute method."}
            }),
        )
    }

    /// Queues an arbitrary response body, well-formed or not.
    pub fn with_body(self, method: &'static str, body: Value) -> Self {
        self.push(method, Canned::Body(body));
        self
    }

    /// Makes `method` fail as if the server were down.
    pub fn unreachable(self, method: &'static str) -> Self {
        self.push(method, Canned::Unreachable);
        self
    }

    fn push(&self, method: &'static str, canned: Canned) {
        self.responses
            .borrow_mut()
            .entry(method)
            .or_default()
            .push_back(canned);
    }

    /// All requests sent so far, in order.
    pub fn requests(&self) -> Vec<RpcRequest> {
        self.requests.borrow().clone()
    }

    /// Requests sent for one method.
    pub fn requests_for(&self, method: &str) -> Vec<RpcRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }
}

impl Transport for FakeTransport {
    fn call(&self, request: &RpcRequest) -> Result<Value, RpcError> {
        self.requests.borrow_mut().push(request.clone());

        let canned = {
            let mut responses = self.responses.borrow_mut();
            match responses.get_mut(request.method) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match canned {
            Some(Canned::Body(body)) => unwrap_response(body),
            Some(Canned::Unreachable) => Err(RpcError::Request("connection refused".to_string())),
            None => Err(RpcError::Remote {
                code: -32601,
                message: format!("Method not found: {}", request.method),
            }),
        }
    }

    fn describe(&self) -> String {
        "fake://kodi/jsonrpc".to_string()
    }
}
