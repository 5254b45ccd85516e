
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {

    #[error("DNS lookup for {host} failed: {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("DNS lookup for {0} returned no usable address")]
    NoAddress(String),

    #[error("DNS lookup task failed: {0}")]
    LookupTask(String),

    #[error("Unsupported address family: {0}")]
    InvalidFamily(u8),


}


pub type Result<T> = std::result::Result<T, AgentError>;
