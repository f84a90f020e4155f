use std::fs;
use std::path::{Path, PathBuf};

use ng_config::{GatherConfig, TestRun};
use ng_device::stub::{StubConnector, StubDevice};
use ngather::gather::{DeviceSelection, GatherOutcome, GatherRequest, gather};
use ngather::prelude::*;
use tempfile::TempDir;

pub const TEST_ID: &str = "1.1.1-bgp-failover";

/// Scratch workspace holding the command files, the manifest and the results.
pub struct TestContext {
    pub dir: TempDir,
    pub config: GatherConfig,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = GatherConfig {
            output_root: dir.path().join("results"),
            commands_dir: dir.path().join("output_commands"),
            manifest: dir.path().join("scp.txt"),
            ..GatherConfig::default()
        };
        fs::create_dir_all(&config.output_root).expect("Failed to create output root");
        fs::create_dir_all(&config.commands_dir).expect("Failed to create commands dir");
        fs::write(&config.manifest, "").expect("Failed to create manifest");
        Self { dir, config }
    }

    pub fn with_command_file(self, name: &str, contents: &str) -> Self {
        fs::write(self.config.commands_dir.join(name), contents)
            .expect("Failed to write command file");
        self
    }

    pub fn with_manifest(self, contents: &str) -> Self {
        fs::write(&self.config.manifest, contents).expect("Failed to write manifest");
        self
    }

    pub fn device_file(&self, devices: &[&str]) -> PathBuf {
        let path = self.dir.path().join("duts.txt");
        fs::write(&path, devices.join("\n")).expect("Failed to write device file");
        path
    }

    pub fn root(&self) -> &Path {
        &self.config.output_root
    }

    pub fn phase_dir(&self, phase: &str) -> PathBuf {
        self.root().join(TEST_ID).join(phase)
    }

    pub fn request(&self, phase: &str, devices: DeviceSelection, archive: bool) -> GatherRequest {
        GatherRequest {
            run: TestRun::new(TEST_ID, phase).expect("Invalid test run"),
            devices,
            archive,
        }
    }

    pub async fn run(
        &self,
        connector: &StubConnector,
        request: &GatherRequest,
    ) -> (Result<GatherOutcome>, String) {
        let mut operator = Vec::new();
        let result = gather(connector, &self.config, request, &mut operator).await;
        (result, String::from_utf8_lossy(&operator).into_owned())
    }
}

/// A device answering the standard command files and holding the standard logs.
pub fn lab_device(hostname: &str) -> StubDevice {
    StubDevice::new(hostname)
        .with_output("show bgp summary", "Peer: 1 Up")
        .with_output("show system uptime", format!("{hostname} up 12 days\n"))
        .with_output("show chassis hardware", "Chassis MX204\n")
        .with_file("/var/log/messages", format!("{hostname} messages"))
        .with_file("/var/log/chassisd", format!("{hostname} chassisd"))
}

/// Sorted list of the files under `dir`, relative to it.
pub fn list_files(dir: &Path) -> Vec<String> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).expect("Failed to read dir") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let relative = path.strip_prefix(base).expect("Path outside base");
                out.push(relative.display().to_string());
            }
        }
    }
    let mut files = Vec::new();
    walk(dir, dir, &mut files);
    files.sort();
    files
}
