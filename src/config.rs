use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SELFIE_DIR: &str = "selfies";
pub const DEFAULT_FACE_CASCADE: &str = "haarcascades/haarcascade_frontalface_default.xml";
pub const DEFAULT_SMILE_CASCADE: &str = "haarcascades/haarcascade_smile.xml";
pub const DEFAULT_WINDOW_TITLE: &str = "Smile Detection - Selfie Camera";

/// Everything the capture process needs to start.
///
/// Cascade paths are looked up through OpenCV's data search path unless
/// they point at an existing file.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub camera_index: i32,
    pub selfie_dir: PathBuf,
    pub cooldown: Duration,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
    pub face_cascade: String,
    pub smile_cascade: String,
    pub window_title: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            selfie_dir: PathBuf::from(DEFAULT_SELFIE_DIR),
            cooldown: Duration::from_secs(2),
            frame_width: 640,
            frame_height: 480,
            fps: 30,
            face_cascade: DEFAULT_FACE_CASCADE.to_owned(),
            smile_cascade: DEFAULT_SMILE_CASCADE.to_owned(),
            window_title: DEFAULT_WINDOW_TITLE.to_owned(),
        }
    }
}
