use clap::Parser;
use std::time::Duration;
use tracing::Level;

/// Command-line configuration for the terminal companion.
#[derive(Parser, Debug, Clone)]
#[command(name = "parle", version, about = "Practise French conversation with Paul from the terminal")]
pub struct Args {
    /// Base URL of a running parle-api server.
    #[arg(long, env = "PARLE_SERVER_URL", default_value = "http://localhost:3001")]
    pub server_url: String,

    /// Upper bound on one chat round trip, in seconds.
    #[arg(long, env = "PARLE_TIMEOUT_SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Start with spoken replies muted.
    #[arg(long)]
    pub muted: bool,

    #[arg(long, env = "PARLE_LOG_LEVEL", default_value = "warn")]
    pub log_level: Level,
}

impl Args {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
