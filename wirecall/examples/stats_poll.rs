//! Poll a v2ray stats service for inbound uplink traffic once a second.
//!
//! ```text
//! RUST_LOG=debug cargo run -p wirecall --example stats_poll -- http://127.0.0.1:15480
//! ```

use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wirecall::Channel;

const DEFAULT_URL: &str = "http://127.0.0.1:15480";
const SERVICE: &str = "v2ray.core.app.stats.command.StatsService";
const METHOD: &str = "GetStats";
const UPLINK_QUERY: &[u8] = b"\n'inbound>>>socks-in-1>>>traffic>>>uplink";
const INTERVAL: Duration = Duration::from_secs(1);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string());
    let channel = Channel::new(&url)?;
    info!(endpoint = %channel.endpoint(), "polling {SERVICE}/{METHOD}");

    loop {
        match channel.call(METHOD, SERVICE, UPLINK_QUERY).into_result() {
            Ok(payload) => info!(len = payload.len(), ?payload, "stats"),
            Err(e) => warn!(error = %e, "call failed"),
        }
        std::thread::sleep(INTERVAL);
    }
}
