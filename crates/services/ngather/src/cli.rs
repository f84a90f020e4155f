//! Command-line interface for ngather.

use clap::Parser;
use std::path::PathBuf;

/// Gather router CLI output and copy log files off one or more devices.
///
/// Every file in the commands directory holds CLI commands, one per line.
/// The output of each file's commands is stored, per device, in a result
/// file of the same name under `<TEST_ID>/<PHASE>/<DEVICE>/`.
#[derive(Parser, Debug)]
#[command(name = "ngather")]
#[command(about = "Gather router CLI output and copy log files off devices to document testing")]
pub struct Cli {
    /// Name of the test being executed, e.g. '1.1.1-bgp-failover'
    pub test_id: String,

    /// When the output is gathered, e.g. 'pre', 'during' or 'post' test execution
    pub phase: String,

    /// Single device (hostname or IP) being tested
    #[arg(short, long, conflicts_with = "device_file")]
    pub device: Option<String>,

    /// File listing the devices to test, one per line
    #[arg(short = 'f', long)]
    pub device_file: Option<PathBuf>,

    /// Archive the results into <TEST_ID>.tgz and remove the result directory
    #[arg(short = 'z', long)]
    pub archive: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Login used on every device (overrides the configuration file)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Stop at the first device that fails instead of moving on to the next one
    #[arg(long)]
    pub fail_fast: bool,
}
