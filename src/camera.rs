use crate::config::CaptureConfig;
use crate::error::{Result, SelfieError};
use log::{info, warn};
use opencv::prelude::*;
use opencv::videoio;

/// Source of colour frames.
pub trait FrameSource {
    /// Next frame; `SelfieError::FrameRead` when the device stops
    /// producing them.
    fn next_frame(&mut self) -> Result<Mat>;

    /// Gives the device back. Must be safe to call more than once.
    fn release(&mut self) -> Result<()>;
}

/// Webcam owned for the lifetime of this value, released on drop.
pub struct CameraSource {
    capture: videoio::VideoCapture,
    index: i32,
    released: bool,
}

impl CameraSource {
    pub fn new(index: i32) -> Result<Self> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(SelfieError::CameraUnavailable(index));
        }
        Ok(Self {
            capture,
            index,
            released: false,
        })
    }

    /// Opens the configured camera and requests its resolution and frame
    /// rate. Drivers are free to ignore the request.
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        let mut camera = Self::new(config.camera_index)?;
        let requests = [
            (videoio::CAP_PROP_FRAME_WIDTH, config.frame_width as f64),
            (videoio::CAP_PROP_FRAME_HEIGHT, config.frame_height as f64),
            (videoio::CAP_PROP_FPS, config.fps as f64),
        ];
        for (property, value) in requests {
            if !camera.capture.set(property, value)? {
                warn!("Camera {} ignored property {} = {}", camera.index, property, value);
            }
        }
        Ok(camera)
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        let read = self.capture.read(&mut frame)?;
        if !read || frame.size()?.width == 0 {
            return Err(SelfieError::FrameRead);
        }
        Ok(frame)
    }

    fn release(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.capture.release()?;
            info!("Released camera {}", self.index);
        }
        Ok(())
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("Failed to release camera {}: {}", self.index, err);
        }
    }
}
