//! Raw wire shapes for DAP messages. Requests are deserialized loosely
//! (arguments stay a [`serde_json::Value`] until the command handler
//! pulls out the fields it needs); responses and events are constructed
//! directly by the adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RawRequest {
    pub seq: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub command: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Serialize)]
pub struct RawResponse {
    pub seq: u32,
    pub request_seq: i64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub success: bool,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RawEvent {
    pub seq: u32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}
