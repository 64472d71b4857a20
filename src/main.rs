//! BitLaunch provider plugin entry point.
//!
//! Prints the handshake line on stdout and serves the provider protocol
//! until SIGTERM or SIGINT. Logs go to stderr; set `RUST_LOG` to adjust.

use hemmer_provider_bitlaunch::{init_logging, serve, BitLaunchProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    serve(BitLaunchProvider::new()).await
}
