//! The address lookup primitive the resolver is built on.
//!
//! A [`Lookup`] turns a host name plus [`LookupHints`] into a single
//! [`LookupAnswer`]. [`SystemLookup`] goes through `getaddrinfo`;
//! [`StaticLookup`] answers from a fixed table.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Mutex;

use dns_lookup::AddrInfoHints;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::errors::{AgentError, Result};

#[cfg(unix)]
mod sys {
    pub const AF_INET: i32 = libc::AF_INET;
    pub const AF_INET6: i32 = libc::AF_INET6;
    pub const AI_ADDRCONFIG: i32 = libc::AI_ADDRCONFIG;
}

// Winsock values from ws2def.h; dns-lookup only targets unix and windows.
#[cfg(windows)]
mod sys {
    pub const AF_INET: i32 = 2;
    pub const AF_INET6: i32 = 23;
    pub const AI_ADDRCONFIG: i32 = 0x0400;
}

/// Only return addresses of a family the host has configured.
pub const ADDRCONFIG: i32 = sys::AI_ADDRCONFIG;

/// Address family of a resolved address, in its numeric 4 / 6 form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Family {
    V4 = 4,
    V6 = 6,
}

impl Family {
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }

    /// Parses the numeric form, rejecting anything but 4 and 6.
    pub fn parse(value: u8) -> Result<Self> {
        Family::try_from(value).map_err(|_| AgentError::InvalidFamily(value))
    }

    fn to_sys(self) -> i32 {
        match self {
            Family::V4 => sys::AF_INET,
            Family::V6 => sys::AF_INET6,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Family restriction and raw `getaddrinfo` flags for one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LookupHints {
    pub family: Option<Family>,
    pub flags: i32,
}

impl LookupHints {
    pub fn new(family: Option<Family>, flags: i32) -> Self {
        Self { family, flags }
    }

    /// Hints for a request that may or may not have asked for something.
    ///
    /// With neither a family nor flags given, the lookup is restricted to
    /// configured address families, as the OS resolver conventionally does.
    /// Anything the caller did give passes through unchanged.
    pub fn for_request(family: Option<Family>, flags: Option<i32>) -> Self {
        let flags = flags.unwrap_or(0);
        if family.is_none() && flags == 0 {
            return Self::new(None, ADDRCONFIG);
        }
        Self::new(family, flags)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupAnswer {
    pub ip: IpAddr,
    pub family: Family,
}

impl LookupAnswer {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            family: Family::of(&ip),
        }
    }
}

pub type LookupFuture = Pin<Box<dyn Future<Output = Result<LookupAnswer>> + Send>>;

/// Asynchronous `lookup(host, hints) -> (ip, family)`.
pub trait Lookup: Send + Sync {
    fn lookup(&self, host: String, hints: LookupHints) -> LookupFuture;
}

/// `getaddrinfo` on tokio's blocking pool. The first answer wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLookup;

impl Lookup for SystemLookup {
    fn lookup(&self, host: String, hints: LookupHints) -> LookupFuture {
        Box::pin(async move {
            tokio::task::spawn_blocking(move || first_address(&host, hints))
                .await
                .map_err(|e| AgentError::LookupTask(e.to_string()))?
        })
    }
}

fn first_address(host: &str, hints: LookupHints) -> Result<LookupAnswer> {
    let sys_hints = AddrInfoHints {
        address: hints.family.map_or(0, Family::to_sys),
        flags: hints.flags,
        ..AddrInfoHints::default()
    };

    let to_error = |source: std::io::Error| AgentError::Lookup {
        host: host.to_string(),
        source,
    };

    let mut answers = dns_lookup::getaddrinfo(Some(host), None, Some(sys_hints))
        .map_err(|e| to_error(e.into()))?;

    match answers.next() {
        Some(info) => {
            let info = info.map_err(to_error)?;
            Ok(LookupAnswer::new(info.sockaddr.ip()))
        }
        None => Err(AgentError::NoAddress(host.to_string())),
    }
}

/// Answers from a fixed host table and counts every call it receives.
///
/// Hosts missing from the table fail with a `NotFound` lookup error.
#[derive(Debug, Default)]
pub struct StaticLookup {
    answers: HashMap<String, IpAddr>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>, ip: IpAddr) -> Self {
        self.answers.insert(host.into(), ip);
        self
    }

    /// Number of lookups made for `host` so far.
    pub fn calls(&self, host: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(host)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .sum()
    }
}

impl Lookup for StaticLookup {
    fn lookup(&self, host: String, hints: LookupHints) -> LookupFuture {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(host.clone())
            .or_insert(0) += 1;

        let answer = self
            .answers
            .get(&host)
            .copied()
            .filter(|ip| hints.family.map_or(true, |family| family == Family::of(ip)));

        Box::pin(async move {
            match answer {
                Some(ip) => Ok(LookupAnswer::new(ip)),
                None => Err(AgentError::Lookup {
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no static address for {}", host),
                    ),
                    host,
                }),
            }
        })
    }
}
