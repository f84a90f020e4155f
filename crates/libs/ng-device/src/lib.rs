//! Device sessions for netgather.
//!
//! Defines the seams the gatherer talks to ([`DeviceConnector`],
//! [`DeviceSession`], [`FileTransfer`]), the typed records read from the
//! device's structured queries, and two backends:
//!
//! - [`ssh`]: the system OpenSSH client, one control master per device
//! - [`stub`]: scripted in-memory devices
//!
//! # Usage
//!
//! ```rust
//! use ng_config::DeviceTarget;
//! use ng_device::stub::{StubConnector, StubDevice};
//! use ng_device::{DeviceConnector, DeviceSession};
//!
//! #[tokio::main]
//! async fn main() -> ng_device::prelude::Result<()> {
//!     let connector = StubConnector::new().with_device(
//!         "r1",
//!         StubDevice::new("edge-r1").with_output("show bgp summary", "Peer: 1 Up"),
//!     );
//!
//!     let mut session = connector.session(&DeviceTarget::new("r1").unwrap());
//!     session.open().await?;
//!     let output = session.cli("show bgp summary").await?;
//!     session.close().await?;
//!
//!     assert_eq!(output, "Peer: 1 Up");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod prelude;
pub mod process;
pub mod records;
pub mod session;
pub mod ssh;
pub mod stub;

pub use records::{ChassisAlarm, ChassisAlarms, DeviceFacts, LoadAverages};
pub use session::{DeviceConnector, DeviceSession, FileTransfer};
