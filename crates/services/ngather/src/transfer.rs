//! Log file retrieval.
//!
//! Copies every manifest entry from the device's remote log directory into
//! the device's result directory, keeping the file's base name. The first
//! failed copy aborts the remaining ones.

use std::collections::HashMap;
use std::path::Path;

use ng_config::GatherConfig;
use ng_device::DeviceSession;
use tracing::{debug, info};

use crate::prelude::*;

/// Local file name for a manifest entry: its last path component.
pub fn local_name(entry: &str) -> &str {
    entry
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(entry)
}

/// Check that every manifest entry maps to its own local file.
///
/// Entries whose base name is `.` or `..`, or collides with an earlier
/// entry's base name, are rejected.
pub fn validate_manifest(manifest: &[String]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for entry in manifest {
        let name = local_name(entry);
        if name == "." || name == ".." {
            return Err(Error::InvalidManifest {
                entry: entry.clone(),
                reason: format!("'{name}' is not a file name"),
            });
        }
        if let Some(previous) = seen.insert(name, entry) {
            return Err(Error::InvalidManifest {
                entry: entry.clone(),
                reason: format!("would overwrite '{previous}' as '{name}'"),
            });
        }
    }
    Ok(())
}

/// Fetch the manifest's files from an open session into `device_dir`.
///
/// The transfer context is closed whether or not every copy succeeded.
pub async fn fetch_logs<S: DeviceSession + ?Sized>(
    session: &mut S,
    config: &GatherConfig,
    manifest: &[String],
    device_dir: &Path,
) -> Result<usize> {
    if manifest.is_empty() {
        debug!("Nothing to copy off {}", session.host());
        return Ok(0);
    }
    let host = session.host().to_string();
    info!("Copying {} log files off {}", manifest.len(), host);

    let mut transfer = session.open_transfer().await?;
    let mut copied = 0;
    let mut result: Result<()> = Ok(());
    for entry in manifest {
        let remote = config.remote_log_path(entry);
        let local = device_dir.join(local_name(entry));
        if let Err(err) = transfer.get(&remote, &local).await {
            result = Err(err.into());
            break;
        }
        debug!("{}: {} -> {:?}", host, remote, local);
        copied += 1;
    }
    let closed = transfer.close().await;

    result?;
    closed?;
    Ok(copied)
}
