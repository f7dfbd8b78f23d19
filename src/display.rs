use crate::error::Result;
use log::warn;
use opencv::highgui;
use opencv::prelude::*;

/// Keys understood while the preview window has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Quit,
    ManualCapture,
}

impl KeyCommand {
    /// Maps a raw `wait_key` code, only the low byte is significant.
    pub fn from_key_code(code: i32) -> Option<Self> {
        if code < 0 {
            return None;
        }
        match (code & 0xFF) as u8 {
            b'q' => Some(KeyCommand::Quit),
            b's' => Some(KeyCommand::ManualCapture),
            _ => None,
        }
    }
}

/// Where annotated frames go and where key presses come from.
pub trait FrameSink {
    fn show(&mut self, frame: &Mat) -> Result<()>;

    /// Waits a short bounded time for a key press.
    fn poll_key(&mut self) -> Result<Option<KeyCommand>>;

    /// Must be safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

/// OpenCV preview window, destroyed on close or drop.
pub struct HighGuiWindow {
    title: String,
    wait: i32,
    open: bool,
}

impl HighGuiWindow {
    pub fn new(title: &str) -> Result<Self> {
        highgui::named_window_def(title)?;
        Ok(Self {
            title: title.to_owned(),
            wait: 1,
            open: true,
        })
    }
}

impl FrameSink for HighGuiWindow {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        highgui::imshow(&self.title, frame)?;
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<KeyCommand>> {
        let code = highgui::wait_key(self.wait)?;
        Ok(KeyCommand::from_key_code(code))
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            highgui::destroy_all_windows()?;
        }
        Ok(())
    }
}

impl Drop for HighGuiWindow {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("Failed to close window {}: {}", self.title, err);
        }
    }
}
