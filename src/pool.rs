//! The seam to the keep-alive socket pool that owns the connections.

use std::time::Duration;

use crate::request::RequestContext;

const FREE_SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

/// Plain or TLS sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Https,
}

impl Transport {
    pub fn from_https(https: bool) -> Self {
        if https {
            Transport::Https
        } else {
            Transport::Http
        }
    }
}

/// Pool tuning handed to the pool unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    pub keep_alive: bool,
    /// Idle time after which a free socket is closed.
    pub free_socket_timeout: Duration,
    /// Inactivity timeout of a socket in use.
    pub timeout: Duration,
    pub max_sockets: Option<usize>,
    pub max_free_sockets: Option<usize>,
    /// Upper bound on how long any free socket is kept, however busy.
    pub free_socket_retention: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            keep_alive: true,
            free_socket_timeout: FREE_SOCKET_TIMEOUT,
            timeout: FREE_SOCKET_TIMEOUT * 2,
            max_sockets: None,
            max_free_sockets: None,
            free_socket_retention: None,
        }
    }
}

/// A keyed request ready for the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Socket bucket.
    pub key: String,
    /// Whether the socket should be kept warm after this request.
    pub keep_alive: bool,
    /// Host the transport connects to; an IP address when one was known.
    pub connect_host: String,
    /// The host the caller asked for.
    pub host: String,
    pub port: Option<u16>,
    pub local_address: Option<String>,
    pub family: Option<u8>,
}

impl From<RequestContext> for Submission {
    fn from(ctx: RequestContext) -> Self {
        let key = match ctx.key() {
            Some(key) => key.to_string(),
            None => crate::agent_key::build_key(ctx.options().host_name(), None, ctx.options()),
        };
        let options = ctx.options();
        Submission {
            key,
            keep_alive: ctx.keep_alive(),
            connect_host: ctx.connect_host().to_string(),
            host: options.host_name().to_string(),
            port: options.port,
            local_address: options.local_address.clone(),
            family: options.family,
        }
    }
}

/// The underlying socket pool.
pub trait ConnectionPool: Send + Sync {
    type Request: Send;

    /// Takes a request whose pool key is final.
    fn add_request(&self, request: Self::Request, submission: Submission);
}
