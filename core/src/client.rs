//! Client construction, the dispatcher, and the generic execute primitive.
//!
//! # Design
//! Every operation in this protocol is the same round trip: shape typed
//! parameters into a [`Command`], POST the batch to the device's CGI
//! endpoint, pair responses to commands by position, classify each entry and
//! decode the value payload into a typed result. [`Client::execute`] is that
//! single path; `login` and `logout` are the only named operations the core
//! ships, because they own the session lifecycle. There are no retries and
//! no transparent re-authentication: a login-required device code reaches
//! the caller like any other [`DeviceError`](crate::error::DeviceError).

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::CallContext;
use crate::envelope::{self, ActionMode, Command, CommandResponse};
use crate::error::{classify, Error, Result};
use crate::session::Session;

/// Configuration surface for [`Client`].
///
/// Options compose; when one is set twice the later call wins. A custom
/// [`ureq::Agent`] replaces the assembled transport entirely, so the timeout
/// and TLS options are ignored with one.
pub struct ClientBuilder {
    host: String,
    username: String,
    password: String,
    https: bool,
    port: Option<u16>,
    timeout: Option<Duration>,
    insecure_skip_verify: bool,
    tls_config: Option<ureq::tls::TlsConfig>,
    agent: Option<ureq::Agent>,
    preset_token: Option<String>,
    login_version: Option<String>,
    debug: bool,
}

impl ClientBuilder {
    fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            username: String::new(),
            password: String::new(),
            https: false,
            port: None,
            timeout: None,
            insecure_skip_verify: false,
            tls_config: None,
            agent: None,
            preset_token: None,
            login_version: None,
            debug: false,
        }
    }

    /// Username and password used by [`Client::login`].
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    /// Talk to the device over TLS.
    pub fn https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Non-default device port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Timeout applied to every request's entire round trip. A per-call
    /// deadline never relaxes it; whichever bound is tighter wins.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Skip TLS certificate verification. Cameras almost always present
    /// self-signed certificates.
    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    /// Full TLS configuration; takes precedence over `insecure_skip_verify`.
    pub fn tls_config(mut self, tls: ureq::tls::TlsConfig) -> Self {
        self.tls_config = Some(tls);
        self
    }

    /// Caller-built transport, used instead of assembling one.
    pub fn agent(mut self, agent: ureq::Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Start the session holding an already-issued token instead of logging
    /// in. The token's remaining lease is unknown to the client.
    pub fn preset_token(mut self, token: &str) -> Self {
        self.preset_token = Some(token.to_string());
        self
    }

    /// `Version` field sent in the Login parameter, for firmware that
    /// expects one.
    pub fn login_version(mut self, version: &str) -> Self {
        self.login_version = Some(version.to_string());
        self
    }

    /// Log full request and response bodies at debug level. Login passwords
    /// are redacted before they reach the log.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Assemble the client. Never fails: no connection is attempted until
    /// the first call.
    pub fn build(self) -> Client {
        let custom_agent = self.agent.is_some();
        let agent = self.agent.unwrap_or_else(|| {
            let mut config = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(self.timeout);
            if let Some(tls) = self.tls_config {
                config = config.tls_config(tls);
            } else if self.insecure_skip_verify {
                config = config.tls_config(
                    ureq::tls::TlsConfig::builder()
                        .disable_verification(true)
                        .build(),
                );
            }
            config.build().new_agent()
        });

        let session = Session::new(self.host, self.https, self.port, self.username, self.password);
        if let Some(token) = self.preset_token {
            session.seed_token(token);
        }

        Client {
            agent,
            session,
            timeout: if custom_agent { None } else { self.timeout },
            login_version: self.login_version,
            debug: self.debug,
        }
    }
}

/// Client for one camera.
///
/// Cheap to share behind a reference or `Arc`; calls may run concurrently
/// from any number of threads. Each call blocks its calling thread until the
/// device answers, its deadline expires or its context is cancelled.
pub struct Client {
    agent: ureq::Agent,
    session: Session,
    timeout: Option<Duration>,
    login_version: Option<String>,
    debug: bool,
}

/// Typed value plus the defaults and valid ranges the device reports for it.
#[derive(Debug, Clone)]
pub struct Ranged<T> {
    pub value: T,
    /// Factory defaults, verbatim from the device.
    pub initial: Option<Value>,
    /// Valid ranges, verbatim from the device.
    pub range: Option<Value>,
}

impl Client {
    /// Start configuring a client for `host`.
    pub fn builder(host: &str) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    /// Session state shared by every call on this client.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send an ordered command batch and return the responses in the same
    /// order.
    ///
    /// Commands whose `token` field is `None` get the session's current
    /// token attached; explicit tokens are sent untouched. The batch must
    /// not be empty, and the device must answer with exactly one response
    /// per command; anything else is [`Error::Protocol`]. Entries are
    /// returned unclassified, failures included, so multi-command callers
    /// decide per entry what to do.
    pub fn dispatch(
        &self,
        ctx: &CallContext,
        mut commands: Vec<Command>,
    ) -> Result<Vec<CommandResponse>> {
        if commands.is_empty() {
            return Err(Error::Protocol("empty command batch".to_string()));
        }
        check_context(ctx)?;

        attach_token(&mut commands, self.session.current_token());
        let body = envelope::encode(&commands)?;
        let url = self.session.endpoint_url();

        debug!(url = %url, commands = commands.len(), "dispatching batch");
        if self.debug {
            debug!(body = %redacted(&commands), "request body");
        }

        let mut request = self.agent.post(&url);
        if let Some(bound) = effective_timeout(ctx.remaining(), self.timeout) {
            request = request
                .config()
                .timeout_global(Some(bound))
                .build();
        }
        let mut response = request
            .content_type("application/json")
            .send(&body[..])
            .map_err(map_transport_error)?;

        if ctx.cancelled() {
            return Err(Error::Cancelled);
        }

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "unexpected http status from device");
            return Err(Error::Protocol(format!("unexpected HTTP status {status}")));
        }

        let text = response
            .body_mut()
            .read_to_string()
            .map_err(map_transport_error)?;
        if self.debug {
            debug!(body = %text, "response body");
        }

        let responses = envelope::decode(text.as_bytes())?;
        if responses.is_empty() {
            return Err(Error::Protocol("empty response".to_string()));
        }
        if responses.len() != commands.len() {
            return Err(Error::Protocol(format!(
                "response count {} does not match command count {}",
                responses.len(),
                commands.len()
            )));
        }
        Ok(responses)
    }

    /// Run one command end to end: shape `param`, dispatch, classify, decode
    /// the value into `T`.
    ///
    /// This is the single primitive every typed endpoint wrapper rides.
    /// Commands that return no value decode cleanly into [`Value`] or any
    /// type whose fields are all optional.
    pub fn execute<P, T>(
        &self,
        ctx: &CallContext,
        name: &str,
        mode: ActionMode,
        param: Option<&P>,
    ) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute_response(ctx, name, mode, param)?;
        decode_value(response.value)
    }

    /// Like [`Client::execute`], but asks the device for defaults and valid
    /// ranges and returns them alongside the value.
    pub fn execute_ranged<P, T>(
        &self,
        ctx: &CallContext,
        name: &str,
        param: Option<&P>,
    ) -> Result<Ranged<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute_response(ctx, name, ActionMode::WithRange, param)?;
        let CommandResponse { value, initial, range, .. } = response;
        Ok(Ranged {
            value: decode_value(value)?,
            initial,
            range,
        })
    }

    fn execute_response<P>(
        &self,
        ctx: &CallContext,
        name: &str,
        mode: ActionMode,
        param: Option<&P>,
    ) -> Result<CommandResponse>
    where
        P: Serialize + ?Sized,
    {
        let param = match param {
            Some(param) => Some(serde_json::to_value(param).map_err(Error::Serialize)?),
            None => None,
        };
        let command = Command {
            name: name.to_string(),
            action: mode.as_int(),
            param,
            token: None,
        };

        let mut responses = self.dispatch(ctx, vec![command])?;
        let response = match responses.pop() {
            Some(response) => response,
            None => return Err(Error::Protocol("empty response".to_string())),
        };
        if let Some(device_error) = classify(&response) {
            debug!(command = name, code = device_error.code, "device rejected command");
            return Err(Error::Device(device_error));
        }
        Ok(response)
    }

    /// Authenticate with the session's credentials and store the issued
    /// token for subsequent calls.
    ///
    /// Any previously held token is discarded first, so the login itself
    /// goes out unauthenticated. On failure the session stays that way.
    pub fn login(&self, ctx: &CallContext) -> Result<()> {
        self.session.clear_token();
        let param = LoginParam {
            user: LoginUser {
                user_name: self.session.username().to_string(),
                password: self.session.password().to_string(),
                version: self.login_version.clone(),
            },
        };
        let value: LoginValue = self.execute(ctx, "Login", ActionMode::ValueOnly, Some(&param))?;
        self.session.set_token(&value.token.name, value.token.lease_time);
        debug!(lease = value.token.lease_time, "login succeeded");
        Ok(())
    }

    /// Invalidate the device-side session and clear the stored token.
    ///
    /// The local token is cleared even when the device rejects the command;
    /// the device-side lease runs out on its own.
    pub fn logout(&self, ctx: &CallContext) -> Result<()> {
        let result: Result<Value> = self.execute(ctx, "Logout", ActionMode::ValueOnly, None::<&Value>);
        self.session.clear_token();
        result.map(|_| ())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Pre-flight check, repeated at every dispatcher state transition.
fn check_context(ctx: &CallContext) -> Result<()> {
    if ctx.cancelled() {
        return Err(Error::Cancelled);
    }
    if ctx.expired() {
        return Err(Error::Timeout);
    }
    Ok(())
}

/// Fill in the session token on every command that does not carry an
/// explicit override.
fn attach_token(commands: &mut [Command], token: Option<String>) {
    for command in commands {
        if command.token.is_none() {
            command.token = token.clone();
        }
    }
}

/// Per-request timeout override: the deadline's remaining time capped by the
/// configured timeout. `None` leaves the agent's own timeout in force.
fn effective_timeout(remaining: Option<Duration>, configured: Option<Duration>) -> Option<Duration> {
    match (remaining, configured) {
        (Some(remaining), Some(configured)) => Some(remaining.min(configured)),
        (Some(remaining), None) => Some(remaining),
        (None, _) => None,
    }
}

fn map_transport_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Timeout(_) => Error::Timeout,
        other => Error::Network(other),
    }
}

fn decode_value<T: DeserializeOwned>(value: Option<Value>) -> Result<T> {
    serde_json::from_value(value.unwrap_or(Value::Null)).map_err(Error::Deserialize)
}

/// Render a batch for debug logging with login passwords masked.
fn redacted(commands: &[Command]) -> String {
    let mut masked = Vec::with_capacity(commands.len());
    for command in commands {
        let mut copy = command.clone();
        if copy.name == "Login" {
            if let Some(Value::Object(param)) = copy.param.as_mut() {
                if let Some(Value::Object(user)) = param.get_mut("User") {
                    if user.contains_key("password") {
                        user.insert("password".to_string(), Value::String("<redacted>".to_string()));
                    }
                }
            }
        }
        masked.push(copy);
    }
    serde_json::to_string(&masked).unwrap_or_else(|_| "<unencodable batch>".to_string())
}

#[derive(Debug, Serialize)]
struct LoginParam {
    #[serde(rename = "User")]
    user: LoginUser,
}

#[derive(Debug, Serialize)]
struct LoginUser {
    #[serde(rename = "userName")]
    user_name: String,
    password: String,
    #[serde(rename = "Version", skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginValue {
    #[serde(rename = "Token")]
    token: LoginToken,
}

#[derive(Debug, Deserialize)]
struct LoginToken {
    name: String,
    #[serde(rename = "leaseTime")]
    lease_time: u32,
}
