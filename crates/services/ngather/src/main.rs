//! ngather
//!
//! Copies files and gathers CLI output from one or more devices under test
//! to document a test run.
//!
//! ```bash
//! # Before the test, one device
//! ngather 1.1.1-bgp-failover pre -d 192.0.2.1
//!
//! # After the test, every device in duts.txt, archived into 1.1.1-bgp-failover.tgz
//! ngather 1.1.1-bgp-failover post -f duts.txt -z
//! ```

use clap::Parser;
use ngather::cli::Cli;
use ngather::commands::handle_gather;
use ngather::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ngather=info,ng_device=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let result = handle_gather(cli).await;

    if let Err(ref e) = result {
        tracing::error!("Error: {}", e);
    }

    result
}
