use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::dns_cache::{DnsCache, ResolutionRecord};
use crate::errors::Result;
use crate::lookup::{Lookup, LookupHints};

/// How long a resolved address is trusted.
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

/// Added to every record's expiry so records written together do not all
/// expire on the same tick.
pub const EXPIRY_SKEW: Duration = Duration::from_millis(50);

/// Expiry used when `ttl` reaches past what the clock can represent.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .and_then(|expiry| expiry.checked_add(EXPIRY_SKEW))
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Runs lookups and records their answers in a [`DnsCache`].
#[derive(Clone)]
pub struct Resolver {
    cache: Arc<DnsCache>,
    lookup: Arc<dyn Lookup>,
    ttl: Duration,
}

impl Resolver {
    pub fn new(cache: Arc<DnsCache>, lookup: Arc<dyn Lookup>, ttl: Duration) -> Self {
        Self { cache, lookup, ttl }
    }

    pub fn cache(&self) -> &Arc<DnsCache> {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Looks `host` up and caches the answer under `host`.
    ///
    /// A failed lookup leaves the cache untouched. Either way the cache gets a
    /// chance to sweep expired records.
    pub async fn resolve(&self, host: &str, hints: LookupHints) -> Result<ResolutionRecord> {
        log::debug!("DNS cache miss: host={}, resolving...", host);
        let outcome = match self.lookup.lookup(host.to_string(), hints).await {
            Ok(answer) => {
                let record = ResolutionRecord::new(
                    host,
                    answer.ip.to_string(),
                    answer.family,
                    expiry_after(Instant::now(), self.ttl),
                );
                log::debug!("DNS cache insert: host={}, ip={}", host, record.ip);
                self.cache.put(host, record.clone());
                Ok(record)
            }
            Err(e) => {
                log::warn!("DNS lookup for {} failed: {}", host, e);
                Err(e)
            }
        };
        self.cache.sweep_if_due();
        outcome
    }

    /// Starts [`Resolver::resolve`] in the background.
    ///
    /// Returns `None` when called outside a tokio runtime, in which case no
    /// lookup happens.
    pub fn spawn(&self, host: &str, hints: LookupHints) -> Option<JoinHandle<Result<ResolutionRecord>>> {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("No tokio runtime, skipping background lookup for {}", host);
                return None;
            }
        };
        let resolver = self.clone();
        let host = host.to_string();
        Some(handle.spawn(async move { resolver.resolve(&host, hints).await }))
    }
}
