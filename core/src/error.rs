//! Unified error type and the per-response classifier.
//!
//! # Design
//! Every failure a call can produce funnels into [`Error`], so callers match
//! one enum no matter where the round trip broke. Device-reported failures
//! are never constructed ad hoc: [`classify`] is the only place a
//! [`DeviceError`] is born, which keeps the mapping rules in one spot.

use std::fmt;

use crate::codes;
use crate::envelope::CommandResponse;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure: DNS, connect, TLS, interrupted I/O.
    #[error("network error: {0}")]
    Network(#[source] ureq::Error),

    /// The per-call deadline or configured timeout elapsed first.
    #[error("request deadline exceeded")]
    Timeout,

    /// The call context was cancelled before a response was produced.
    #[error("request cancelled")]
    Cancelled,

    /// The peer answered, but not with a well-formed response batch.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The device processed the batch and rejected this command.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A typed command parameter could not be serialized.
    #[error("failed to serialize command parameters: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A command result could not be deserialized into the requested type.
    #[error("failed to deserialize command result: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// A command the device rejected or failed to execute.
///
/// Carries the originating command name, the top-level status code, the
/// fine-grained device code and the device's own detail text. Two values
/// compare equal when they carry the same device code: callers branch on
/// the code, never on wording.
#[derive(Debug, Clone)]
pub struct DeviceError {
    /// Name of the command the device answered.
    pub command: String,
    /// Top-level per-command status code.
    pub status: i32,
    /// Fine-grained device error code.
    pub code: i32,
    /// Device-provided text; often empty.
    pub detail: String,
}

impl DeviceError {
    /// Functional group of the device code, when the table documents it.
    pub fn category(&self) -> Option<codes::Category> {
        codes::lookup(self.code).map(|(_, category)| category)
    }

    /// Canned description of the device code from the documented table.
    pub fn description(&self) -> String {
        codes::describe(self.code)
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "command {} failed (status {}, device code {}): ",
            self.command, self.status, self.code
        )?;
        if self.detail.is_empty() {
            write!(f, "{}", self.description())
        } else {
            write!(f, "{}", self.detail)
        }
    }
}

impl std::error::Error for DeviceError {}

impl PartialEq for DeviceError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for DeviceError {}

/// Decide whether a response entry reports success or a device failure.
///
/// A populated `error` object always wins, whatever the top-level code says.
/// A non-zero top-level code without an `error` object still counts as a
/// failure; the code doubles as the device code in that case. Returns `None`
/// exactly when the entry is a success.
pub fn classify(response: &CommandResponse) -> Option<DeviceError> {
    if let Some(detail) = &response.error {
        return Some(DeviceError {
            command: response.command.clone(),
            status: response.code,
            code: detail.code,
            detail: detail.detail.clone(),
        });
    }
    if response.code != 0 {
        return Some(DeviceError {
            command: response.command.clone(),
            status: response.code,
            code: response.code,
            detail: String::new(),
        });
    }
    None
}
