use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::coordinator::{Coordinator, DispatchMode};
use crate::dns_cache::{DnsCache, ResolutionRecord};
use crate::errors::Result;
use crate::lookup::{Lookup, SystemLookup};
use crate::pool::{ConnectionPool, PoolOptions, Submission, Transport};
use crate::request::{RequestContext, RequestOptions};
use crate::resolver::DEFAULT_TTL;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// How long a resolved address is used before it is looked up again.
    pub expiry: Duration,
    pub https: bool,
    /// Minimum time between sweeps of the DNS cache. `None` keeps the
    /// cache's current setting, which matters for the shared cache.
    pub check_expired_dns_interval: Option<Duration>,
    pub dispatch: DispatchMode,
    pub pool: PoolOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            expiry: DEFAULT_TTL,
            https: false,
            check_expired_dns_interval: None,
            dispatch: DispatchMode::default(),
            pool: PoolOptions::default(),
        }
    }
}

/// A connection pool whose sockets are bucketed by resolved address.
pub struct KeepAliveAgent<P> {
    coordinator: Coordinator,
    transport: Transport,
    pool: P,
}

impl<P: ConnectionPool> KeepAliveAgent<P> {
    /// Builds an agent on the process-wide DNS cache and the system resolver.
    ///
    /// `make_pool` receives the transport flavor and the pool options from
    /// `config` as given.
    pub fn new<F>(config: AgentConfig, make_pool: F) -> Self
    where
        F: FnOnce(Transport, PoolOptions) -> P,
    {
        Self::with_lookup(config, DnsCache::shared(), Arc::new(SystemLookup), make_pool)
    }

    pub fn with_lookup<F>(config: AgentConfig, cache: Arc<DnsCache>, lookup: Arc<dyn Lookup>, make_pool: F) -> Self
    where
        F: FnOnce(Transport, PoolOptions) -> P,
    {
        if let Some(interval) = config.check_expired_dns_interval {
            cache.set_sweep_interval(interval);
        }
        let transport = Transport::from_https(config.https);
        let pool = make_pool(transport, config.pool);

        log::info!(
            "Keep-alive agent created: transport={:?}, dispatch={:?}, expiry_ms={}, sweep_interval_ms={}",
            transport,
            config.dispatch,
            config.expiry.as_millis(),
            cache.sweep_interval().as_millis()
        );

        KeepAliveAgent {
            coordinator: Coordinator::new(cache, lookup, config.expiry, config.dispatch),
            transport,
            pool,
        }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn https(&self) -> bool {
        self.transport == Transport::Https
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn get_name(&self, ctx: &mut RequestContext) -> String {
        self.coordinator.get_name(ctx)
    }

    pub async fn get_name_async(&self, ctx: &mut RequestContext) -> String {
        self.coordinator.get_name_async(ctx).await
    }

    pub async fn pre_lookup(&self, host: &str, options: &RequestOptions) -> Result<ResolutionRecord> {
        self.coordinator.pre_lookup(host, options).await
    }

    pub fn spawn_pre_lookup(
        &self,
        host: &str,
        options: &RequestOptions,
    ) -> Option<JoinHandle<Result<ResolutionRecord>>> {
        self.coordinator.spawn_pre_lookup(host, options)
    }

    /// Keys the request with the configured dispatch protocol, then hands it
    /// to the pool.
    pub async fn add_request(&self, request: P::Request, options: RequestOptions) -> Submission {
        let mut ctx = RequestContext::new(options);
        self.coordinator.key_request(&mut ctx).await;
        let submission = Submission::from(ctx);
        log::debug!(
            "Submitting request: key={}, keep_alive={}",
            submission.key,
            submission.keep_alive
        );
        self.pool.add_request(request, submission.clone());
        submission
    }

    pub fn clear_cache(&self) {
        self.coordinator.cache().clear();
    }

    /// Current DNS cache contents, expired records included.
    pub fn dns_cache(&self) -> Vec<(String, ResolutionRecord)> {
        self.coordinator.cache().snapshot()
    }
}
