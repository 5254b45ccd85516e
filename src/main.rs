use std::time::Duration;

use clap::Parser;
use env_logger::{Builder, Env};
use rusk_keepalive::cli::CliArgs;
use rusk_keepalive::{
    AgentConfig, ConnectionPool, DispatchMode, Family, KeepAliveAgent, RequestOptions, Submission,
};

/// Prints every submission instead of opening sockets.
struct PrintPool;

impl ConnectionPool for PrintPool {
    type Request = usize;

    fn add_request(&self, round: usize, submission: Submission) {
        println!(
            "round {} {} -> {} (connect {}, keep_alive={})",
            round, submission.host, submission.key, submission.connect_host, submission.keep_alive
        );
    }
}

#[tokio::main]
async fn main() {

    init_logger();

    let args = CliArgs::parse();

    if let Some(family) = args.family {
        if let Err(e) = Family::parse(family) {
            log::error!("{}", e);
            std::process::exit(2);
        }
    }

    let config = AgentConfig {
        expiry: Duration::from_millis(args.expiry_ms),
        https: args.https,
        check_expired_dns_interval: Some(Duration::from_millis(args.sweep_interval_ms)),
        dispatch: if args.scheduled {
            DispatchMode::Scheduled
        } else {
            DispatchMode::Immediate
        },
        ..AgentConfig::default()
    };

    let agent = KeepAliveAgent::new(config, |_, _| PrintPool);

    for round in 0..args.repeat {
        if round > 0 {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
        }
        for host in &args.hosts {
            let options = RequestOptions {
                host: Some(host.clone()),
                port: args.port,
                local_address: args.local_address.clone(),
                family: args.family,
                hints: None,
            };
            agent.add_request(round, options).await;
        }
    }

    for (host, record) in agent.dns_cache() {
        log::info!("DNS cache: {} -> {} (family {})", host, record.ip, record.family);
    }


}


fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .init();
}
