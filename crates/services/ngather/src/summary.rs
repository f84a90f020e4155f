//! Run summary written next to the device directories.
//!
//! `summary.json` is the completion marker of a run: a device directory is
//! only complete when its entry says so. Anything else (a failed entry or no
//! entry at all because the run was interrupted) means partial results.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ng_config::{DeviceTarget, TestRun};
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::session::DeviceReport;

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Complete,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOutcome {
    pub device: DeviceTarget,
    pub status: DeviceStatus,
    pub result_files: usize,
    pub logs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub test_id: String,
    pub phase: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub devices: Vec<DeviceOutcome>,
}

impl RunSummary {
    pub fn new(run: &TestRun) -> Self {
        Self {
            test_id: run.test_id.clone(),
            phase: run.phase.clone(),
            started_at: Utc::now(),
            finished_at: None,
            devices: Vec::new(),
        }
    }

    pub fn record_success(&mut self, report: &DeviceReport) {
        self.devices.push(DeviceOutcome {
            device: report.device.clone(),
            status: DeviceStatus::Complete,
            result_files: report.result_files,
            logs: report.logs,
            error: None,
        });
    }

    pub fn record_failure(&mut self, device: &DeviceTarget, error: &Error) {
        self.devices.push(DeviceOutcome {
            device: device.clone(),
            status: DeviceStatus::Failed,
            result_files: 0,
            logs: 0,
            error: Some(error.to_string()),
        });
    }

    pub fn failed(&self) -> usize {
        self.devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Failed)
            .count()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Write the summary into `phase_dir`.
    pub fn write(&self, phase_dir: &Path) -> Result<PathBuf> {
        let path = phase_dir.join(SUMMARY_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read(phase_dir: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(phase_dir.join(SUMMARY_FILE))?;
        Ok(serde_json::from_str(&contents)?)
    }
}
