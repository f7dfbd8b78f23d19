use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SelfieError>;

#[derive(Error, Debug)]
pub enum SelfieError {
    #[error("Unable to load {name} cascade from {path:?}")]
    ModelLoad { name: &'static str, path: String },
    #[error("Unable to access camera {0}")]
    CameraUnavailable(i32),
    #[error("Unable to read from the camera")]
    FrameRead,
    #[error("Failed to write image to {0:?}")]
    Write(PathBuf),
    #[error("OpenCV error {0:?}")]
    OpenCv(#[from] opencv::Error),
    #[error("IO error {0:?}")]
    Io(#[from] std::io::Error),
}

impl SelfieError {
    /// Only a failed write lets the capture loop keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SelfieError::Write(_))
    }
}
