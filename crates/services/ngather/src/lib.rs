//! ngather: gather CLI output and log files from network devices for a test run.
//!
//! Output is laid out as `<test_id>/<phase>/<device>/`, holding one result
//! file per command file plus the log files copied off the device. The
//! library entry point is [`gather::gather`], which works against any
//! [`ng_device::DeviceConnector`].

pub mod archive;
pub mod cli;
pub mod command_file;
pub mod commands;
pub mod error;
pub mod gather;
pub mod prelude;
pub mod report;
pub mod session;
pub mod summary;
pub mod transfer;
