//! Per-request pool-key decisions.
//!
//! Two dispatch protocols share the cache and key format:
//!
//! * [`DispatchMode::Immediate`] never waits. A cache miss keys the request by
//!   host name and starts a background lookup that only helps later requests.
//! * [`DispatchMode::Scheduled`] holds the request back on a miss until the
//!   lookup settles, so every request reaches the pool with its final key.
//!
//! A failed lookup never fails the request; it only keys it by host name.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::dns_cache::{DnsCache, ResolutionRecord};
use crate::errors::Result;
use crate::lookup::Lookup;
use crate::request::{KeySource, RequestContext, RequestOptions};
use crate::resolver::Resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Key from whatever the cache holds right now.
    #[default]
    Immediate,
    /// Wait for a lookup on a cache miss before keying.
    Scheduled,
}

#[derive(Clone)]
pub struct Coordinator {
    resolver: Resolver,
    mode: DispatchMode,
}

impl Coordinator {
    pub fn new(cache: Arc<DnsCache>, lookup: Arc<dyn Lookup>, expiry: Duration, mode: DispatchMode) -> Self {
        Self {
            resolver: Resolver::new(cache, lookup, expiry),
            mode,
        }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn cache(&self) -> &Arc<DnsCache> {
        self.resolver.cache()
    }

    pub fn expiry(&self) -> Duration {
        self.resolver.ttl()
    }

    /// Resolves `host` with the family and hints of `options`, caching the answer.
    pub async fn pre_lookup(&self, host: &str, options: &RequestOptions) -> Result<ResolutionRecord> {
        self.resolver.resolve(host, options.lookup_hints()).await
    }

    /// Background [`Coordinator::pre_lookup`]; `None` outside a tokio runtime.
    pub fn spawn_pre_lookup(
        &self,
        host: &str,
        options: &RequestOptions,
    ) -> Option<JoinHandle<Result<ResolutionRecord>>> {
        self.resolver.spawn(host, options.lookup_hints())
    }

    fn cached_key(&self, ctx: &mut RequestContext) -> Option<String> {
        let record = self.cache().fresh(ctx.options().host_name())?;
        Some(ctx.key_by_record(&record, KeySource::Cached))
    }

    /// Pool key without waiting on any lookup.
    pub fn get_name(&self, ctx: &mut RequestContext) -> String {
        if let Some(key) = ctx.key() {
            return key.to_string();
        }

        if let Some(key) = self.cached_key(ctx) {
            return key;
        }

        let host = ctx.options().host_name().to_string();
        self.spawn_pre_lookup(&host, ctx.options());
        ctx.key_unresolved()
    }

    /// Pool key, resolving first if the cache has nothing fresh.
    pub async fn get_name_async(&self, ctx: &mut RequestContext) -> String {
        if let Some(key) = ctx.key() {
            let key = key.to_string();
            ctx.set_keep_alive(true);
            return key;
        }

        if let Some(key) = self.cached_key(ctx) {
            return key;
        }

        let host = ctx.options().host_name().to_string();
        match self.pre_lookup(&host, ctx.options()).await {
            Ok(record) => ctx.key_by_record(&record, KeySource::Resolved),
            Err(_) => ctx.key_unresolved(),
        }
    }

    /// Keys `ctx` with the configured protocol.
    pub async fn key_request(&self, ctx: &mut RequestContext) -> String {
        match self.mode {
            DispatchMode::Immediate => self.get_name(ctx),
            DispatchMode::Scheduled => self.get_name_async(ctx).await,
        }
    }
}
