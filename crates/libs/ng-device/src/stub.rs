//! In-memory devices for exercising the gather flow without a network.
//!
//! A [`StubConnector`] knows a set of [`StubDevice`]s by hostname. Sessions
//! to unknown hosts fail to open, every open, close, command and transfer is
//! recorded in a shared [`StubLog`].

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use ng_config::DeviceTarget;
use serde_json::{Value, json};

use crate::prelude::*;
use crate::records::{
    ChassisAlarm, LoadAverages, SHOW_CHASSIS_ALARMS, SHOW_ROUTE_ENGINE, SHOW_VERSION,
};
use crate::session::{DeviceConnector, DeviceSession, FileTransfer};

/// Junos JSON leaf: `[{"data": text}]`.
fn leaf(text: &str) -> Value {
    json!([{ "data": text }])
}

fn opt_leaf(text: Option<&str>) -> Value {
    text.map(leaf).unwrap_or(Value::Null)
}

/// Scripted behaviour of one device.
#[derive(Debug, Clone, Default)]
pub struct StubDevice {
    pub hostname: String,
    pub version: String,
    pub alarms: Vec<ChassisAlarm>,
    pub load: LoadAverages,
    /// CLI command to output text.
    pub outputs: HashMap<String, String>,
    /// Remote path to file contents.
    pub files: HashMap<String, Vec<u8>>,
    /// Commands that can't be issued at all.
    pub broken_commands: HashSet<String>,
}

impl StubDevice {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            version: String::from("21.4R3-S5.4"),
            load: LoadAverages {
                one: Some(String::from("0.10")),
                five: Some(String::from("0.20")),
                fifteen: Some(String::from("0.30")),
            },
            ..Default::default()
        }
    }

    pub fn with_output(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.outputs.insert(command.into(), output.into());
        self
    }

    pub fn with_file(mut self, remote: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(remote.into(), contents.into());
        self
    }

    pub fn with_alarm(mut self, class: &str, description: &str) -> Self {
        self.alarms.push(ChassisAlarm {
            class: Some(class.to_string()),
            description: description.to_string(),
        });
        self
    }

    pub fn with_broken_command(mut self, command: impl Into<String>) -> Self {
        self.broken_commands.insert(command.into());
        self
    }

    fn document(&self, rpc: &str) -> Option<Value> {
        match rpc {
            SHOW_VERSION => Some(json!({
                "software-information": [{
                    "host-name": leaf(&self.hostname),
                    "junos-version": leaf(&self.version),
                }]
            })),
            SHOW_CHASSIS_ALARMS => {
                let details: Vec<Value> = self
                    .alarms
                    .iter()
                    .map(|alarm| {
                        json!({
                            "alarm-class": opt_leaf(alarm.class.as_deref()),
                            "alarm-description": leaf(&alarm.description),
                        })
                    })
                    .collect();
                Some(json!({ "alarm-information": [{ "alarm-detail": details }] }))
            }
            SHOW_ROUTE_ENGINE => Some(json!({
                "route-engine-information": [{
                    "route-engine": [{
                        "load-average-one": opt_leaf(self.load.one.as_deref()),
                        "load-average-five": opt_leaf(self.load.five.as_deref()),
                        "load-average-fifteen": opt_leaf(self.load.fifteen.as_deref()),
                    }]
                }]
            })),
            _ => None,
        }
    }
}

/// Everything the stub sessions were asked to do, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubLog {
    /// Hosts a connection was attempted to.
    pub connect_attempts: Vec<String>,
    pub opened: Vec<String>,
    pub closed: Vec<String>,
    /// `(host, command)` for every CLI command.
    pub commands: Vec<(String, String)>,
    /// `(host, remote path)` for every successful transfer.
    pub transfers: Vec<(String, String)>,
}

fn lock(log: &Mutex<StubLog>) -> MutexGuard<'_, StubLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Connector handing out sessions to the registered stub devices.
#[derive(Debug, Clone, Default)]
pub struct StubConnector {
    devices: HashMap<String, StubDevice>,
    log: Arc<Mutex<StubLog>>,
}

impl StubConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `device` under `host`. Unregistered hosts are unreachable.
    pub fn with_device(mut self, host: impl Into<String>, device: StubDevice) -> Self {
        self.devices.insert(host.into(), device);
        self
    }

    /// Snapshot of the activity so far.
    pub fn log(&self) -> StubLog {
        lock(&self.log).clone()
    }
}

impl DeviceConnector for StubConnector {
    type Session = StubSession;

    fn session(&self, device: &DeviceTarget) -> StubSession {
        StubSession {
            host: device.as_str().to_string(),
            device: self.devices.get(device.as_str()).cloned(),
            log: Arc::clone(&self.log),
            open: false,
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Session to a [`StubDevice`].
#[derive(Debug)]
pub struct StubSession {
    host: String,
    device: Option<StubDevice>,
    log: Arc<Mutex<StubLog>>,
    open: bool,
}

impl StubSession {
    fn device(&self) -> Result<&StubDevice> {
        match (&self.device, self.open) {
            (Some(device), true) => Ok(device),
            _ => Err(Error::NotOpen(self.host.clone())),
        }
    }
}

#[async_trait]
impl DeviceSession for StubSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn open(&mut self) -> Result<()> {
        lock(&self.log).connect_attempts.push(self.host.clone());
        if self.device.is_none() {
            return Err(Error::Connection {
                host: self.host.clone(),
                reason: String::from("No route to host"),
            });
        }
        self.open = true;
        lock(&self.log).opened.push(self.host.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            lock(&self.log).closed.push(self.host.clone());
        }
        Ok(())
    }

    async fn query(&mut self, rpc: &str) -> Result<Value> {
        self.device()?.document(rpc).ok_or_else(|| Error::Query {
            rpc: rpc.to_string(),
            reason: String::from("unknown rpc"),
        })
    }

    async fn cli(&mut self, command: &str) -> Result<String> {
        let device = self.device()?;
        if device.broken_commands.contains(command) {
            return Err(Error::Command {
                command: command.to_string(),
                reason: String::from("session channel closed"),
            });
        }
        let output = device
            .outputs
            .get(command)
            .cloned()
            .unwrap_or_else(|| format!("\nerror: syntax error: {command}\n"));
        lock(&self.log)
            .commands
            .push((self.host.clone(), command.to_string()));
        Ok(output)
    }

    async fn open_transfer<'a>(&'a mut self) -> Result<Box<dyn FileTransfer + 'a>> {
        self.device()?;
        Ok(Box::new(StubTransfer { session: self }))
    }
}

/// Transfer context of a [`StubSession`].
pub struct StubTransfer<'a> {
    session: &'a StubSession,
}

#[async_trait]
impl FileTransfer for StubTransfer<'_> {
    async fn get(&mut self, remote: &str, local: &Path) -> Result<()> {
        let contents = self
            .session
            .device()?
            .files
            .get(remote)
            .cloned()
            .ok_or_else(|| Error::Transfer {
                path: remote.to_string(),
                reason: String::from("No such file or directory"),
            })?;
        tokio::fs::write(local, contents).await?;
        lock(&self.session.log)
            .transfers
            .push((self.session.host.clone(), remote.to_string()));
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ChassisAlarms;

    fn target(name: &str) -> DeviceTarget {
        DeviceTarget::new(name).unwrap()
    }

    #[tokio::test]
    async fn typed_queries_round_trip_through_documents() -> Result<()> {
        let connector = StubConnector::new().with_device(
            "r1",
            StubDevice::new("edge-r1").with_alarm("Major", "PEM 0 Not OK"),
        );
        let mut session = connector.session(&target("r1"));
        session.open().await?;

        let facts = session.facts().await?;
        assert_eq!(facts.hostname.as_deref(), Some("edge-r1"));

        let alarms: ChassisAlarms = session.alarms().await?;
        assert_eq!(alarms.0.len(), 1);
        assert_eq!(alarms.0[0].description, "PEM 0 Not OK");

        let load = session.load_averages().await?;
        assert_eq!(load.fifteen.as_deref(), Some("0.30"));

        session.close().await?;
        assert_eq!(connector.log().closed, vec!["r1".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_host_is_unreachable() {
        let connector = StubConnector::new();
        let mut session = connector.session(&target("nowhere"));
        assert!(matches!(
            session.open().await,
            Err(Error::Connection { .. })
        ));
        assert_eq!(connector.log().connect_attempts, vec!["nowhere".to_string()]);
        assert!(connector.log().opened.is_empty());
    }

    #[tokio::test]
    async fn unknown_commands_return_device_error_text() -> Result<()> {
        let connector = StubConnector::new().with_device("r1", StubDevice::new("r1"));
        let mut session = connector.session(&target("r1"));
        session.open().await?;
        let output = session.cli("show bogus").await?;
        assert!(output.contains("syntax error"));
        Ok(())
    }

    #[tokio::test]
    async fn transfers_write_local_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let connector = StubConnector::new()
            .with_device("r1", StubDevice::new("r1").with_file("/var/log/messages", "boot"));
        let mut session = connector.session(&target("r1"));
        session.open().await?;

        let mut transfer = session.open_transfer().await?;
        transfer
            .get("/var/log/messages", &dir.path().join("messages"))
            .await?;
        assert!(
            transfer
                .get("/var/log/missing", &dir.path().join("missing"))
                .await
                .is_err()
        );
        transfer.close().await?;

        assert_eq!(std::fs::read_to_string(dir.path().join("messages"))?, "boot");
        Ok(())
    }
}
