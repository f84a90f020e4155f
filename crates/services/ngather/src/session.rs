//! Per-device gather session.
//!
//! Drives one device through its full sequence:
//!
//! 1. Creates the device's result directory
//! 2. Opens the device session
//! 3. Prints identity, chassis alarms and load averages for the operator
//! 4. Copies the manifest's log files
//! 5. Runs every command file and writes one result file per command file
//! 6. Closes the session, on every exit path
//!
//! Command output is stored verbatim: a command the device rejects still
//! produces a record holding the device's error text.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ng_config::{DeviceTarget, GatherConfig, TestRun};
use ng_device::DeviceSession;
use tracing::{error, info, warn};

use crate::gather::GatherPlan;
use crate::prelude::*;
use crate::report::write_device_health;
use crate::transfer::fetch_logs;

/// What a completed device session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    pub device: DeviceTarget,
    pub directory: PathBuf,
    pub result_files: usize,
    pub logs: usize,
}

/// Write one `(command, output)` record of a result file.
pub fn write_record<W: Write>(
    mut writer: W,
    separator: &str,
    command: &str,
    output: &str,
) -> std::io::Result<()> {
    writeln!(writer, "{separator}")?;
    writeln!(writer, "{command}")?;
    writer.write_all(output.as_bytes())
}

/// Run `commands` in order and write the transcript to `path`, replacing any previous file.
pub async fn write_result_file<S: DeviceSession + ?Sized>(
    session: &mut S,
    path: &Path,
    separator: &str,
    commands: &[String],
) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    for command in commands {
        let output = session.cli(command).await?;
        write_record(&mut file, separator, command, &output)?;
    }
    file.flush()?;
    Ok(())
}

/// Gather everything for one device.
///
/// `operator` receives the device health summary (stdout when run from the CLI).
pub async fn gather_device<S, W>(
    session: &mut S,
    run: &TestRun,
    device: &DeviceTarget,
    config: &GatherConfig,
    plan: &GatherPlan,
    operator: &mut W,
) -> Result<DeviceReport>
where
    S: DeviceSession + ?Sized,
    W: Write,
{
    let directory = run.device_dir(&config.output_root, device);
    std::fs::create_dir_all(&directory)?;

    session.open().await?;
    let body = drive_session(session, config, plan, &directory, operator).await;
    let closed = session.close().await;

    let (result_files, logs) = match (body, closed) {
        (Ok(counts), Ok(())) => counts,
        (Ok(_), Err(err)) => return Err(err.into()),
        (Err(err), Ok(())) => return Err(err),
        (Err(err), Err(close_err)) => {
            warn!("{} - Failed to close session: {}", device, close_err);
            return Err(err);
        }
    };

    Ok(DeviceReport {
        device: device.clone(),
        directory,
        result_files,
        logs,
    })
}

async fn drive_session<S, W>(
    session: &mut S,
    config: &GatherConfig,
    plan: &GatherPlan,
    directory: &Path,
    operator: &mut W,
) -> Result<(usize, usize)>
where
    S: DeviceSession + ?Sized,
    W: Write,
{
    let host = session.host().to_string();

    let facts = session.facts().await?;
    let alarms = session.alarms().await?;
    let load = session.load_averages().await?;
    write_device_health(&mut *operator, &facts, &alarms, &load)?;
    if !alarms.is_empty() {
        warn!("{} - {} active chassis alarms", host, alarms.0.len());
    }

    let logs = fetch_logs(session, config, &plan.manifest, directory).await?;

    for (index, (name, commands)) in plan.commands.iter().enumerate() {
        info!(
            "{} - Command file {}/{}: executing {} commands from {}",
            host,
            index + 1,
            plan.commands.len(),
            commands.len(),
            name
        );
        let path = directory.join(name);
        if let Err(err) = write_result_file(session, &path, &config.separator, commands).await {
            error!("{} - {} failed: {}", host, name, err);
            return Err(err);
        }
        info!("{} - {} commands written to {:?}", host, name, path);
    }

    Ok((plan.commands.len(), logs))
}
