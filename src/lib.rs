pub mod annotate;
pub mod camera;
pub mod capture_loop;
pub mod config;
pub mod cooldown;
pub mod detector;
pub mod display;
pub mod error;
pub mod logging;
pub mod persistence;

pub use camera::{CameraSource, FrameSource};
pub use capture_loop::{CaptureLoop, Clock, LoopState, StopReason, SystemClock};
pub use config::CaptureConfig;
pub use cooldown::CooldownGate;
pub use detector::{Detector, PatternDetector};
pub use display::{FrameSink, HighGuiWindow, KeyCommand};
pub use error::SelfieError;
