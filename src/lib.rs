pub mod agent;
pub mod agent_key;
pub mod cli;
pub mod coordinator;
pub mod dns_cache;
pub mod errors;
pub mod lookup;
pub mod pool;
pub mod request;
pub mod resolver;

pub use agent::{AgentConfig, KeepAliveAgent};
pub use agent_key::{build_key, NO_IP};
pub use coordinator::{Coordinator, DispatchMode};
pub use dns_cache::{DnsCache, ResolutionRecord};
pub use errors::{AgentError, Result};
pub use lookup::{Family, Lookup, LookupAnswer, LookupHints, StaticLookup, SystemLookup};
pub use pool::{ConnectionPool, PoolOptions, Submission, Transport};
pub use request::{KeySource, RequestContext, RequestOptions};
