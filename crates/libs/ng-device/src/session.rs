//! Device session and file transfer abstractions.

use std::path::Path;

use async_trait::async_trait;
use ng_config::DeviceTarget;
use serde_json::Value;

use crate::prelude::*;
use crate::records::{
    ChassisAlarms, DeviceFacts, LoadAverages, SHOW_CHASSIS_ALARMS, SHOW_ROUTE_ENGINE,
    SHOW_VERSION,
};

/// A management session with one device.
///
/// A session starts closed. Callers must pair every successful [`open`] with
/// a [`close`], on every exit path.
///
/// [`open`]: DeviceSession::open
/// [`close`]: DeviceSession::close
#[async_trait]
pub trait DeviceSession: Send {
    /// Host this session talks to.
    fn host(&self) -> &str;

    /// Connect and authenticate.
    async fn open(&mut self) -> Result<()>;

    /// Tear the connection down. Closing a closed session is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Run a structured query and return the parsed document.
    async fn query(&mut self, rpc: &str) -> Result<Value>;

    /// Run a CLI command and return whatever text the device printed.
    ///
    /// Errors reported by the device (unknown command, syntax error) are part
    /// of the returned text, not an `Err`.
    async fn cli(&mut self, command: &str) -> Result<String>;

    /// Enter a file transfer context bound to this session.
    async fn open_transfer<'a>(&'a mut self) -> Result<Box<dyn FileTransfer + 'a>>;

    /// Hostname and software version.
    async fn facts(&mut self) -> Result<DeviceFacts> {
        let doc = self.query(SHOW_VERSION).await?;
        Ok(DeviceFacts::from_document(&doc))
    }

    /// Active chassis alarms.
    async fn alarms(&mut self) -> Result<ChassisAlarms> {
        let doc = self.query(SHOW_CHASSIS_ALARMS).await?;
        Ok(ChassisAlarms::from_document(&doc))
    }

    /// Routing engine load averages.
    async fn load_averages(&mut self) -> Result<LoadAverages> {
        let doc = self.query(SHOW_ROUTE_ENGINE).await?;
        Ok(LoadAverages::from_document(&doc))
    }
}

/// A scoped file transfer context, valid while its session is open.
#[async_trait]
pub trait FileTransfer: Send {
    /// Copy `remote` from the device to `local`.
    async fn get(&mut self, remote: &str, local: &Path) -> Result<()>;

    /// Leave the transfer context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Factory for device sessions.
pub trait DeviceConnector {
    /// The session type this connector produces.
    type Session: DeviceSession;

    /// Create a closed session for `device`.
    fn session(&self, device: &DeviceTarget) -> Self::Session;

    /// Human-readable name for this backend.
    fn name(&self) -> &'static str;
}
