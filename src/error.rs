use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop the kiosk before the frame loop starts.
#[derive(Debug, Error)]
pub enum KioskError {
    #[error("could not open camera {index}: {reason}")]
    CameraUnavailable { index: u32, reason: String },

    #[error("could not load overlay asset {path}: {source}")]
    OverlayAsset {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not load face model {path}: {source}")]
    FaceModel {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("resolution tiers must be non-empty and strictly increasing in area")]
    InvalidTiers,

    #[error("threshold levels must be non-empty")]
    InvalidThresholds,

    #[error("bluetooth scan failed: {0}")]
    Discovery(String),

    #[error("no bluetooth device was selected")]
    NoDeviceSelected,
}
