//! Synchronous client core for the JSON command protocol spoken by network
//! cameras over HTTP(S).
//!
//! # Overview
//! The device exposes one CGI endpoint that accepts a JSON array of command
//! objects per POST and answers with an array of response objects in the
//! same order. Sessions are token based: `Login` issues a leased token, the
//! dispatcher attaches it to every subsequent command, and an expired lease
//! surfaces reactively as a device error on the next call.
//!
//! # Design
//! - [`Client::execute`] is the single generic primitive; typed endpoint
//!   wrappers are one-liners on top of it and live with their callers.
//! - Calls block the calling thread. Concurrency is the caller's choice:
//!   share the client behind an `Arc` and call from as many threads as
//!   needed; the token cell is the only guarded state.
//! - One error enum covers the whole round trip: transport, deadline,
//!   cancellation, malformed envelopes and device-reported failures.
//! - No retries, no token refresh, no re-login. Every recovery decision
//!   belongs to the caller.
//! - The mock camera defines its wire DTOs independently from this crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod codes;
pub mod context;
pub mod envelope;
pub mod error;
pub mod session;

pub use client::{Client, ClientBuilder, Ranged};
pub use codes::Category;
pub use context::{CallContext, CancelHandle};
pub use envelope::{decode, encode, ActionMode, Command, CommandResponse, ErrorDetail};
pub use error::{classify, DeviceError, Error, Result};
pub use session::Session;
