use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use tokio::time::Instant;

use crate::lookup::Family;

/// Minimum time between two sweeps of expired records.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(5000);

/// Last known address for one host name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRecord {
    pub host: String,
    pub ip: String,
    pub family: Family,
    pub expiry: Instant,
}

impl ResolutionRecord {
    pub fn new(host: impl Into<String>, ip: impl Into<String>, family: Family, expiry: Instant) -> Self {
        Self {
            host: host.into(),
            ip: ip.into(),
            family,
            expiry,
        }
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now < self.expiry
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        !self.is_fresh_at(now)
    }
}

struct SweepClock {
    interval: Duration,
    last_sweep: Instant,
}

/// Host-keyed store of resolution records plus the clock that rate-limits
/// sweeping them.
///
/// Records are never expired by the store itself: stale entries stay visible
/// to [`DnsCache::get`] until a sweep or [`DnsCache::clear`] removes them, so
/// readers that care must use [`DnsCache::fresh`].
pub struct DnsCache {
    records: Cache<String, ResolutionRecord>,
    clock: Mutex<SweepClock>,
}

impl DnsCache {
    pub fn new_default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }

    pub fn new(sweep_interval: Duration) -> Self {
        let records = Cache::builder().build();
        Self {
            records,
            clock: Mutex::new(SweepClock {
                interval: sweep_interval,
                last_sweep: Instant::now(),
            }),
        }
    }

    /// The process-wide cache shared by agents that are not given their own.
    pub fn shared() -> Arc<DnsCache> {
        static SHARED: OnceLock<Arc<DnsCache>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(DnsCache::new_default())).clone()
    }

    pub fn get(&self, host: &str) -> Option<ResolutionRecord> {
        self.records.get(host)
    }

    /// Like [`DnsCache::get`], but only if the record has not expired yet.
    pub fn fresh(&self, host: &str) -> Option<ResolutionRecord> {
        let record = self.records.get(host)?;
        if record.is_fresh_at(Instant::now()) {
            log::debug!("DNS cache hit: host={}, ip={}", host, record.ip);
            Some(record)
        } else {
            log::debug!("DNS cache stale: host={}", host);
            None
        }
    }

    pub fn put(&self, host: impl Into<String>, record: ResolutionRecord) {
        self.records.insert(host.into(), record);
    }

    pub fn delete(&self, host: &str) {
        self.records.invalidate(host);
    }

    pub fn clear(&self) {
        for (host, _) in self.records.iter() {
            self.records.invalidate(host.as_str());
        }
    }

    /// All records currently held, expired or not, ordered by host.
    pub fn snapshot(&self) -> Vec<(String, ResolutionRecord)> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(host, record)| (host.as_ref().clone(), record))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.records.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sweep_interval(&self) -> Duration {
        self.clock.lock().unwrap_or_else(|e| e.into_inner()).interval
    }

    pub fn set_sweep_interval(&self, interval: Duration) {
        self.clock.lock().unwrap_or_else(|e| e.into_inner()).interval = interval;
    }

    /// Deletes expired records unless the last sweep was less than the sweep
    /// interval ago. Returns whether a sweep pass ran.
    pub fn sweep_if_due(&self) -> bool {
        let now = Instant::now();
        {
            let mut clock = self.clock.lock().unwrap_or_else(|e| e.into_inner());
            if now.saturating_duration_since(clock.last_sweep) < clock.interval {
                return false;
            }
            clock.last_sweep = now;
        }

        let mut removed = 0usize;
        for (host, record) in self.records.iter() {
            if record.is_fresh_at(now) {
                continue;
            }
            // The record may have been replaced since iteration read it.
            let result = self
                .records
                .entry_by_ref(host.as_str())
                .and_compute_with(|entry| match entry {
                    Some(entry) if entry.value().is_expired_at(now) => Op::Remove,
                    _ => Op::Nop,
                });
            if let CompResult::Removed(_) = result {
                removed += 1;
            }
        }

        log::debug!("DNS cache sweep: removed={}", removed);
        true
    }
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(host: &str, expiry: Instant) -> ResolutionRecord {
        ResolutionRecord::new(host, "10.0.0.1", Family::V4, expiry)
    }

    fn hosts(cache: &DnsCache) -> Vec<String> {
        cache.snapshot().into_iter().map(|(host, _)| host).collect()
    }

    #[tokio::test]
    async fn put_get_delete_clear() {
        let cache = DnsCache::new_default();
        let expiry = Instant::now() + Duration::from_secs(5);

        cache.put("foo", record("foo", expiry));
        cache.put("bar", record("bar", expiry));
        assert_eq!(cache.get("foo"), Some(record("foo", expiry)));
        assert_eq!(hosts(&cache), vec!["bar", "foo"]);

        cache.delete("foo");
        assert_eq!(cache.get("foo"), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = DnsCache::new_default();
        let expiry = Instant::now() + Duration::from_secs(5);

        cache.put("foo", record("foo", expiry));
        cache.put("foo", ResolutionRecord::new("foo", "10.0.0.2", Family::V4, expiry));
        assert_eq!(cache.get("foo").unwrap().ip, "10.0.0.2");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fresh_ignores_expired_records() {
        tokio::time::pause();
        let cache = DnsCache::new_default();
        cache.put("foo", record("foo", Instant::now() + Duration::from_millis(100)));

        assert!(cache.fresh("foo").is_some());
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(cache.fresh("foo").is_none());
        // Still held until swept.
        assert!(cache.get("foo").is_some());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sweep_keeps_only_unexpired_records() {
        tokio::time::pause();
        let cache = DnsCache::new(Duration::from_millis(20));
        let now = Instant::now();
        let ms = Duration::from_millis;

        cache.put("a", record("a", now + ms(5000)));
        cache.put("d1", record("d1", now));
        cache.put("d2", record("d2", now));
        cache.put("x1", record("x1", now + ms(1000)));
        cache.put("d3", record("d3", now));
        cache.put("d4", record("d4", now));
        cache.put("x2", record("x2", now + ms(2000)));

        tokio::time::advance(ms(30)).await;
        assert!(cache.sweep_if_due());
        assert_eq!(hosts(&cache), vec!["a", "x1", "x2"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sweep_keeps_record_replaced_by_fresh_one() {
        tokio::time::pause();
        let cache = DnsCache::new(Duration::from_millis(20));
        let now = Instant::now();

        cache.put("foo", record("foo", now));
        tokio::time::advance(Duration::from_millis(30)).await;
        let replacement = ResolutionRecord::new("foo", "10.0.0.2", Family::V4, Instant::now() + Duration::from_secs(5));
        cache.put("foo", replacement.clone());

        assert!(cache.sweep_if_due());
        assert_eq!(cache.get("foo"), Some(replacement));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sweep_is_rate_limited() {
        tokio::time::pause();
        let cache = DnsCache::new(Duration::from_millis(20));

        // Not due yet: the clock starts when the cache is built.
        cache.put("d1", record("d1", Instant::now()));
        assert!(!cache.sweep_if_due());
        assert_eq!(cache.len(), 1);

        tokio::time::advance(Duration::from_millis(25)).await;
        assert!(cache.sweep_if_due());
        assert!(cache.is_empty());

        cache.put("d2", record("d2", Instant::now()));
        tokio::time::advance(Duration::from_millis(5)).await;
        assert!(!cache.sweep_if_due());
        assert_eq!(hosts(&cache), vec!["d2"]);

        tokio::time::advance(Duration::from_millis(20)).await;
        assert!(cache.sweep_if_due());
        assert!(cache.is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sweep_interval_can_be_changed() {
        tokio::time::pause();
        let cache = DnsCache::new_default();
        assert_eq!(cache.sweep_interval(), DEFAULT_SWEEP_INTERVAL);

        cache.set_sweep_interval(Duration::from_millis(10));
        cache.put("d1", record("d1", Instant::now()));
        tokio::time::advance(Duration::from_millis(10)).await;
        assert!(cache.sweep_if_due());
        assert!(cache.is_empty());
    }
}
