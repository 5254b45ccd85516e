use crate::agent_key::build_key;
use crate::dns_cache::ResolutionRecord;
use crate::lookup::{Family, LookupHints};

/// Identity used when a request names no host.
pub const DEFAULT_HOST: &str = "localhost";

/// Connection options the caller supplies for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub local_address: Option<String>,
    /// Requested address family, in the numeric form (4 or 6).
    pub family: Option<u8>,
    /// Raw lookup flags.
    pub hints: Option<i32>,
}

impl RequestOptions {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_local_address(mut self, local_address: impl Into<String>) -> Self {
        self.local_address = Some(local_address.into());
        self
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.family = Some(family);
        self
    }

    pub fn with_hints(mut self, hints: i32) -> Self {
        self.hints = Some(hints);
        self
    }

    /// The requested host name; also the key the DNS cache is consulted under.
    pub fn host_name(&self) -> &str {
        self.host
            .as_deref()
            .filter(|host| !host.is_empty())
            .unwrap_or(DEFAULT_HOST)
    }

    pub fn address_family(&self) -> Option<Family> {
        self.family.and_then(|family| Family::try_from(family).ok())
    }

    pub fn lookup_hints(&self) -> LookupHints {
        LookupHints::for_request(self.address_family(), self.hints)
    }
}

/// Where a request's pool key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// A fresh cache record.
    Cached,
    /// A lookup made for this request.
    Resolved,
    /// No address: the lookup failed or was left to run in the background.
    Unresolved,
}

/// Per-request dispatch state.
///
/// The pool key and keep-alive flag are decided at most once; later queries
/// return the memoized key.
#[derive(Debug, Clone)]
pub struct RequestContext {
    options: RequestOptions,
    key: Option<String>,
    keep_alive: bool,
    connect_host: Option<String>,
    source: Option<KeySource>,
}

impl RequestContext {
    pub fn new(options: RequestOptions) -> Self {
        Self {
            options,
            key: None,
            keep_alive: false,
            connect_host: None,
            source: None,
        }
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn source(&self) -> Option<KeySource> {
        self.source
    }

    /// The host the transport should connect to: the resolved address once
    /// one is known, otherwise the requested host.
    pub fn connect_host(&self) -> &str {
        self.connect_host
            .as_deref()
            .unwrap_or_else(|| self.options.host_name())
    }

    pub(crate) fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    /// Keys the request by a known address and points the transport at it.
    pub(crate) fn key_by_record(&mut self, record: &ResolutionRecord, source: KeySource) -> String {
        self.connect_host = Some(record.ip.clone());
        self.keep_alive = true;
        self.memoize(Some(&record.ip), source)
    }

    /// Keys the request by host name alone.
    pub(crate) fn key_unresolved(&mut self) -> String {
        self.keep_alive = false;
        self.memoize(None, KeySource::Unresolved)
    }

    fn memoize(&mut self, ip: Option<&str>, source: KeySource) -> String {
        let key = build_key(self.options.host_name(), ip, &self.options);
        self.key = Some(key.clone());
        self.source = Some(source);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::ADDRCONFIG;
    use tokio::time::Instant;

    #[test]
    fn missing_host_uses_placeholder() {
        assert_eq!(RequestOptions::default().host_name(), DEFAULT_HOST);
        assert_eq!(RequestOptions::new("").host_name(), DEFAULT_HOST);
        assert_eq!(RequestOptions::new("foo").host_name(), "foo");
    }

    #[test]
    fn hints_follow_family_and_flags() {
        assert_eq!(RequestOptions::new("foo").lookup_hints(), LookupHints::new(None, ADDRCONFIG));
        assert_eq!(
            RequestOptions::new("foo").with_family(4).lookup_hints(),
            LookupHints::new(Some(Family::V4), 0)
        );
        // Not a real family, so it is not a restriction.
        assert_eq!(
            RequestOptions::new("foo").with_family(9).lookup_hints(),
            LookupHints::new(None, ADDRCONFIG)
        );
    }

    #[test]
    fn keyed_by_record_rewrites_connect_host() {
        let mut ctx = RequestContext::new(RequestOptions::new("foo").with_port(80));
        assert_eq!(ctx.connect_host(), "foo");
        assert_eq!(ctx.key(), None);

        let record = ResolutionRecord::new("foo", "10.0.0.1", Family::V4, Instant::now());
        let key = ctx.key_by_record(&record, KeySource::Cached);

        assert_eq!(key, "foo+ip:10.0.0.1+port:80");
        assert_eq!(ctx.key(), Some(key.as_str()));
        assert_eq!(ctx.connect_host(), "10.0.0.1");
        assert!(ctx.keep_alive());
        assert_eq!(ctx.source(), Some(KeySource::Cached));
        assert_eq!(ctx.options().host_name(), "foo");
    }

    #[test]
    fn unresolved_keeps_host() {
        let mut ctx = RequestContext::new(RequestOptions::default());
        let key = ctx.key_unresolved();

        assert_eq!(key, "localhost+ip:_none_");
        assert_eq!(ctx.connect_host(), DEFAULT_HOST);
        assert!(!ctx.keep_alive());
        assert_eq!(ctx.source(), Some(KeySource::Unresolved));
    }
}
