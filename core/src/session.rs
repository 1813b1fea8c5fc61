//! Session state: connection target, credentials and the guarded token cell.
//!
//! # Design
//! The token is the only field mutated after construction, so it lives alone
//! behind a reader/writer lock and concurrent dispatches never observe a torn
//! value. There is no background refresh: the lease is stored verbatim and
//! expiry surfaces reactively, as a device error on the next call.

use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Connection target plus authentication state for one client.
pub struct Session {
    host: String,
    https: bool,
    port: Option<u16>,
    username: String,
    password: String,
    token: RwLock<TokenCell>,
}

#[derive(Debug, Default)]
struct TokenCell {
    token: Option<String>,
    lease_seconds: Option<u32>,
}

impl Session {
    pub(crate) fn new(
        host: String,
        https: bool,
        port: Option<u16>,
        username: String,
        password: String,
    ) -> Self {
        Self {
            host,
            https,
            port,
            username,
            password,
            token: RwLock::new(TokenCell::default()),
        }
    }

    /// Store a freshly issued token and its lease, replacing any previous one.
    pub fn set_token(&self, token: &str, lease_seconds: u32) {
        let mut cell = self.write_cell();
        cell.token = Some(token.to_string());
        cell.lease_seconds = Some(lease_seconds);
    }

    /// Adopt an externally issued token with no known lease.
    pub(crate) fn seed_token(&self, token: String) {
        let mut cell = self.write_cell();
        cell.token = Some(token);
        cell.lease_seconds = None;
    }

    /// Forget the stored token; subsequent commands go out unauthenticated.
    pub fn clear_token(&self) {
        let mut cell = self.write_cell();
        cell.token = None;
        cell.lease_seconds = None;
    }

    /// The token commands are currently sent with, if any.
    pub fn current_token(&self) -> Option<String> {
        self.read_cell().token.clone()
    }

    /// Lease duration the device granted with the current token, in seconds.
    /// `None` for preset tokens and unauthenticated sessions.
    pub fn token_lease(&self) -> Option<u32> {
        self.read_cell().lease_seconds
    }

    /// Whether a token is currently held. Says nothing about whether the
    /// device still honors it.
    pub fn is_authenticated(&self) -> bool {
        self.read_cell().token.is_some()
    }

    /// Device address this session talks to, verbatim as given to
    /// [`Client::builder`](crate::Client::builder).
    pub fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Full URL of the device's command endpoint.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{scheme}://{host}:{port}/cgi-bin/api.cgi", host = self.host),
            None => format!("{scheme}://{host}/cgi-bin/api.cgi", host = self.host),
        }
    }

    // Both fields are written under a single guard, so a panicking writer
    // cannot leave the cell half updated; poison is recovered, not spread.
    fn read_cell(&self) -> std::sync::RwLockReadGuard<'_, TokenCell> {
        self.token.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cell(&self) -> std::sync::RwLockWriteGuard<'_, TokenCell> {
        self.token.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("https", &self.https)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
