#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::error::Error),

    #[error("No device specified. Use -d <device> or -f <device file>")]
    NoDeviceSpecified,

    #[error("Failed to read {path:?}: {source}")]
    ReadInput {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ng_config::error::Error),

    #[error(transparent)]
    Device(#[from] ng_device::error::Error),

    #[error("Invalid manifest entry '{entry}': {reason}")]
    InvalidManifest { entry: String, reason: String },

    #[error("Archive {0:?} already exists, move it away or run without -z")]
    ArchiveExists(std::path::PathBuf),

    #[error("Failed to archive {path:?}: {source}")]
    Archive {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("{0} of {1} devices failed")]
    DevicesFailed(usize, usize),
}
