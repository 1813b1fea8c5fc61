//! Wire envelope for the camera's batched command protocol.
//!
//! # Design
//! The device accepts a JSON array of command objects in a single POST and
//! answers with a JSON array of response objects, one per command, in
//! matching order. Parameter payloads are opaque `serde_json::Value`s at
//! this layer: typed parameter and result shapes belong to the endpoint
//! callers, the envelope only guarantees the array framing and the
//! omit-when-default field rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// How much detail a command asks the device to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionMode {
    /// Current values only (`action: 0`).
    #[default]
    ValueOnly,
    /// Current values plus defaults and valid ranges (`action: 1`).
    WithRange,
}

impl ActionMode {
    pub(crate) fn as_int(self) -> i32 {
        match self {
            ActionMode::ValueOnly => 0,
            ActionMode::WithRange => 1,
        }
    }
}

/// One named operation in a request batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    /// Command name, e.g. `GetDevInfo`.
    #[serde(rename = "cmd")]
    pub name: String,
    /// 0 = values only, 1 = values plus defaults and ranges. Omitted when 0.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub action: i32,
    /// Command-specific payload; omitted for commands that take none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<Value>,
    /// Session token. `None` means the dispatcher attaches the session's
    /// current token; an explicit value is sent untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Command {
    /// Command with no parameter payload.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            action: 0,
            param: None,
            token: None,
        }
    }

    /// Command with a parameter payload.
    pub fn with_param(name: &str, mode: ActionMode, param: Value) -> Self {
        Self {
            name: name.to_string(),
            action: mode.as_int(),
            param: Some(param),
            token: None,
        }
    }
}

fn is_zero(action: &i32) -> bool {
    *action == 0
}

/// Device-reported failure detail for one command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Fine-grained device error code, distinct from the top-level `code`.
    #[serde(rename = "rspCode")]
    pub code: i32,
    /// Human-readable text; devices sometimes leave it empty.
    #[serde(default)]
    pub detail: String,
}

/// One entry of a response batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandResponse {
    /// Name of the command this entry answers.
    #[serde(rename = "cmd", default)]
    pub command: String,
    /// Top-level status code; 0 on success.
    #[serde(default)]
    pub code: i32,
    /// Result payload; present only on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Device failure detail; present only when the command failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    /// Factory defaults; populated when the command's action was 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<Value>,
    /// Valid ranges; populated when the command's action was 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,
}

/// Serialize an ordered command batch to the wire format.
pub fn encode(commands: &[Command]) -> Result<Vec<u8>> {
    serde_json::to_vec(commands).map_err(Error::Serialize)
}

/// Deserialize a wire payload into an ordered response sequence.
///
/// Fails with [`Error::Protocol`] when the payload is not a well-formed JSON
/// array of response objects. Pairing the entries against the commands that
/// produced them is the dispatcher's job, not the codec's.
pub fn decode(bytes: &[u8]) -> Result<Vec<CommandResponse>> {
    serde_json::from_slice(bytes)
        .map_err(|e| Error::Protocol(format!("malformed response envelope: {e}")))
}
