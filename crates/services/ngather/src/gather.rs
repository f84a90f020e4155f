//! Run orchestration.
//!
//! Handles one test run from start to finish:
//!
//! 1. Creates the `test_id/phase/` directory, refusing to start when an
//!    archive was requested and `test_id.tgz` already exists
//! 2. Resolves the target devices (a single device or a device list file)
//! 3. Loads the command files and the transfer manifest
//! 4. Gathers each device in turn, one session at a time
//! 5. Writes the run summary
//! 6. Optionally archives `test_id/` into `test_id.tgz`
//!
//! A failing device is recorded and the run moves on to the next one, unless
//! `fail_fast` is set in which case the remaining devices are skipped.

use std::io::Write;
use std::path::PathBuf;

use ng_config::{DeviceTarget, GatherConfig, TestRun};
use ng_device::DeviceConnector;
use tracing::{error, info, warn};

use crate::archive::archive_test_run;
use crate::command_file::{self, CommandSet};
use crate::prelude::*;
use crate::report::write_run_banner;
use crate::session::gather_device;
use crate::summary::RunSummary;
use crate::transfer::validate_manifest;

/// Inputs shared by every device of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatherPlan {
    /// Command file name to its commands.
    pub commands: CommandSet,
    /// Remote log paths, relative to the remote log directory.
    pub manifest: Vec<String>,
}

impl GatherPlan {
    /// Load the command files and the manifest named by `config`.
    pub fn load(config: &GatherConfig) -> Result<Self> {
        let commands = command_file::read_dir(&config.commands_dir, config.comment_marker)?;
        let manifest = command_file::read_file(&config.manifest, config.comment_marker)?;
        validate_manifest(&manifest)?;
        info!(
            "Loaded {} command files and {} manifest entries",
            commands.len(),
            manifest.len()
        );
        Ok(Self { commands, manifest })
    }
}

/// Which devices a run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelection {
    Single(String),
    ListFile(PathBuf),
    Unspecified,
}

impl DeviceSelection {
    pub fn from_args(device: Option<String>, device_file: Option<PathBuf>) -> Self {
        match (device, device_file) {
            (Some(device), _) => Self::Single(device),
            (None, Some(path)) => Self::ListFile(path),
            (None, None) => Self::Unspecified,
        }
    }

    pub fn resolve(&self) -> Result<Vec<DeviceTarget>> {
        match self {
            Self::Single(device) => Ok(vec![DeviceTarget::new(device.trim())?]),
            Self::ListFile(path) => {
                let contents =
                    std::fs::read_to_string(path).map_err(|source| Error::ReadInput {
                        path: path.clone(),
                        source,
                    })?;
                Ok(DeviceTarget::parse_list(&contents)?)
            }
            Self::Unspecified => Err(Error::NoDeviceSpecified),
        }
    }
}

/// One invocation of the gatherer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherRequest {
    pub run: TestRun,
    pub devices: DeviceSelection,
    pub archive: bool,
}

/// Result of a run that got as far as the device loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherOutcome {
    pub summary: RunSummary,
    /// Devices never attempted because of `fail_fast`.
    pub skipped: Vec<DeviceTarget>,
    /// Path of the archive, when one was requested.
    pub archive: Option<PathBuf>,
}

impl GatherOutcome {
    /// Turn device failures into an error so the process exits non-zero.
    pub fn into_result(self) -> Result<Self> {
        let failed = self.summary.failed();
        if failed > 0 {
            return Err(Error::DevicesFailed(
                failed,
                self.summary.devices.len() + self.skipped.len(),
            ));
        }
        Ok(self)
    }
}

/// Run the whole gather for `request`.
///
/// `operator` receives the human readable progress (stdout from the CLI).
pub async fn gather<C, W>(
    connector: &C,
    config: &GatherConfig,
    request: &GatherRequest,
    operator: &mut W,
) -> Result<GatherOutcome>
where
    C: DeviceConnector,
    W: Write,
{
    let run = &request.run;
    let archive_path = run.archive_path(&config.output_root);
    if request.archive && archive_path.exists() {
        return Err(Error::ArchiveExists(archive_path));
    }
    let phase_dir = run.phase_dir(&config.output_root);
    std::fs::create_dir_all(&phase_dir)?;
    write_run_banner(&mut *operator, &phase_dir)?;

    let devices = request.devices.resolve()?;
    let plan = GatherPlan::load(config)?;

    info!(
        "Gathering {} for {} devices using {}",
        run,
        devices.len(),
        connector.name()
    );

    let mut summary = RunSummary::new(run);
    let mut skipped = Vec::new();
    let device_count = devices.len();
    let mut remaining = devices.into_iter().enumerate();
    while let Some((idx, device)) = remaining.next() {
        info!("Device {}/{}: {}", idx + 1, device_count, device);
        let mut session = connector.session(&device);
        match gather_device(&mut session, run, &device, config, &plan, operator).await {
            Ok(report) => {
                info!(
                    "{} - {} result files and {} logs written to {:?}",
                    device, report.result_files, report.logs, report.directory
                );
                summary.record_success(&report);
            }
            Err(err) => {
                error!("{} - Gather failed: {}", device, err);
                summary.record_failure(&device, &err);
                if config.fail_fast {
                    skipped = remaining.by_ref().map(|(_, device)| device).collect();
                    warn!("Fail fast set, skipping {} remaining devices", skipped.len());
                    break;
                }
            }
        }
    }

    summary.finish();
    let summary_path = summary.write(&phase_dir)?;
    info!("Run summary written to {:?}", summary_path);

    let archive = if request.archive {
        writeln!(operator, "{}\nzipping test results", "=".repeat(100))?;
        Some(archive_test_run(run, &config.output_root)?)
    } else {
        None
    };

    Ok(GatherOutcome {
        summary,
        skipped,
        archive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_prefers_single_device() {
        assert_eq!(
            DeviceSelection::from_args(Some("r1".into()), None),
            DeviceSelection::Single("r1".into())
        );
        assert_eq!(
            DeviceSelection::from_args(None, Some(PathBuf::from("duts.txt"))),
            DeviceSelection::ListFile(PathBuf::from("duts.txt"))
        );
        assert_eq!(
            DeviceSelection::from_args(None, None),
            DeviceSelection::Unspecified
        );
    }

    #[test]
    fn unspecified_selection_is_an_error() {
        assert!(matches!(
            DeviceSelection::Unspecified.resolve(),
            Err(Error::NoDeviceSpecified)
        ));
    }

    #[test]
    fn missing_device_file_is_an_error() {
        let selection = DeviceSelection::ListFile(PathBuf::from("/nonexistent/duts.txt"));
        assert!(matches!(selection.resolve(), Err(Error::ReadInput { .. })));
    }
}
