//! Configuration management for netgather.
//!
//! Provides the gather settings (loaded from TOML, with defaults for every
//! key) and the naming rules for test runs and devices.
//!
//! # Usage
//!
//! ```rust
//! use ng_config::{GatherConfig, GatherUserConfig, TestRun};
//!
//! let user_config = GatherUserConfig::from_toml("user = \"netops\"").unwrap();
//! let config = GatherConfig::from_user_config(user_config).unwrap();
//!
//! let run = TestRun::new("1.1.1-bgp", "pre").unwrap();
//! let phase_dir = run.phase_dir(&config.output_root);
//! assert!(phase_dir.ends_with("1.1.1-bgp/pre"));
//! ```

pub mod error;
pub mod gather_config;
pub mod prelude;
pub mod ssh;
pub mod test_run;

pub use gather_config::{GatherConfig, GatherUserConfig};
pub use ssh::SshConfig;
pub use test_run::{DeviceTarget, TestRun};
