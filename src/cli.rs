use clap::Parser;
#[derive(Parser, Debug)]
#[command(version, about = "Show the pool keys a keep-alive agent assigns to hosts", long_about = None)]
pub struct CliArgs {

    /// Hosts to request
    #[arg(required = true)]
    pub hosts: Vec<String>,

    /// Target port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Local address to bind outgoing sockets to
    #[arg(short, long)]
    pub local_address: Option<String>,

    /// Address family to resolve (4 or 6)
    #[arg(short, long)]
    pub family: Option<u8>,

    /// DNS cache TTL in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub expiry_ms: u64,

    /// Minimum milliseconds between sweeps of expired DNS records
    #[arg(long, default_value_t = 5000)]
    pub sweep_interval_ms: u64,

    /// Use the TLS transport flavor
    #[arg(long, default_value_t = false)]
    pub https: bool,

    /// Wait for DNS resolution before keying each request
    #[arg(short, long, default_value_t = false)]
    pub scheduled: bool,

    /// Number of request rounds per host
    #[arg(short, long, default_value_t = 2)]
    pub repeat: usize,

    /// Pause between rounds in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,
}
