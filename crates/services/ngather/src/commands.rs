//! Command handlers for ngather.
//!
//! Resolves the configuration from the CLI and the optional config file,
//! then runs the gather against real devices over SSH.

use std::io::stdout;
use std::time::Duration;

use ng_config::{GatherConfig, GatherUserConfig, TestRun};
use ng_device::ssh::SshConnector;
use tracing::info;

use crate::cli::Cli;
use crate::gather::{DeviceSelection, GatherRequest, gather};
use crate::prelude::*;

/// Merge the config file (if any) with the CLI overrides.
pub fn resolve_config(cli: &Cli) -> Result<GatherConfig> {
    let user_config = match &cli.config {
        Some(path) => GatherUserConfig::from_file(path)?,
        None => GatherUserConfig::default(),
    };
    let mut config = GatherConfig::from_user_config(user_config)?;
    if let Some(user) = &cli.user {
        config.user = Some(user.clone());
    }
    if cli.fail_fast {
        config.fail_fast = true;
    }
    Ok(config)
}

/// Build the run request described by the CLI.
pub fn build_request(cli: &Cli) -> Result<GatherRequest> {
    Ok(GatherRequest {
        run: TestRun::new(cli.test_id.clone(), cli.phase.clone())?,
        devices: DeviceSelection::from_args(cli.device.clone(), cli.device_file.clone()),
        archive: cli.archive,
    })
}

/// Handles a gather invocation end to end.
pub async fn handle_gather(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let request = build_request(&cli)?;
    let mut connector = SshConnector::new(config.user.clone(), config.ssh.clone());
    if let Some(secs) = config.ssh.command_timeout_secs {
        connector = connector.with_command_timeout(Duration::from_secs(secs));
    }

    let outcome = gather(&connector, &config, &request, &mut stdout()).await?;
    if let Some(archive) = &outcome.archive {
        info!("Results archived to {:?}", archive);
    }
    outcome.into_result()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn cli_overrides_config_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "user = \"from-file\"\nfail_fast = false")?;
        let path = file.path().display().to_string();

        let cli = Cli::parse_from([
            "ngather",
            "t",
            "pre",
            "-d",
            "r1",
            "-c",
            path.as_str(),
            "-u",
            "cli",
            "--fail-fast",
        ]);
        let config = resolve_config(&cli)?;
        assert_eq!(config.user.as_deref(), Some("cli"));
        assert!(config.fail_fast);
        Ok(())
    }

    #[test]
    fn rejects_phase_with_separator() {
        let cli = Cli::parse_from(["ngather", "t", "pre/post", "-d", "r1"]);
        assert!(matches!(build_request(&cli), Err(Error::Config(_))));
    }
}
