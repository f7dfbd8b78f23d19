use crate::annotate::{annotate, FaceObservation, FaceStatus};
use crate::camera::FrameSource;
use crate::cooldown::CooldownGate;
use crate::detector::{convert_to_grayscale, mouth_region, Detector};
use crate::display::{FrameSink, KeyCommand};
use crate::error::{Result, SelfieError};
use crate::persistence;
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use opencv::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Why the loop left `Running`.
#[derive(Debug)]
pub enum StopReason {
    Quit,
    Interrupted,
    CameraLost,
    Failed(SelfieError),
}

impl StopReason {
    pub fn is_success(&self) -> bool {
        matches!(self, StopReason::Quit | StopReason::Interrupted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

enum Flow {
    Continue,
    Stop(StopReason),
}

/// Owns the camera, the display and all mutable capture state.
pub struct CaptureLoop<C: FrameSource, D: FrameSink, K: Clock> {
    camera: C,
    display: D,
    clock: K,
    detector: Detector,
    gate: CooldownGate,
    selfie_dir: PathBuf,
    saved_count: usize,
    interrupt: Arc<AtomicBool>,
    state: LoopState,
    last_observations: Vec<FaceObservation>,
}

impl<C: FrameSource, D: FrameSink, K: Clock> CaptureLoop<C, D, K> {
    pub fn new(
        camera: C,
        display: D,
        clock: K,
        detector: Detector,
        gate: CooldownGate,
        selfie_dir: &Path,
    ) -> Self {
        Self {
            camera,
            display,
            clock,
            detector,
            gate,
            selfie_dir: selfie_dir.to_owned(),
            saved_count: persistence::count(selfie_dir),
            interrupt: Arc::new(AtomicBool::new(false)),
            state: LoopState::Idle,
            last_observations: Vec::new(),
        }
    }

    /// Flag that, once set, stops the loop like the quit key.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    pub fn saved_count(&self) -> usize {
        self.saved_count
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Faces and their status from the last frame that got as far as
    /// rendering.
    pub fn last_observations(&self) -> &[FaceObservation] {
        &self.last_observations
    }

    /// Runs until quit, interrupt, camera loss or an error, then releases
    /// the camera and closes the display whatever the reason.
    pub fn run(&mut self) -> StopReason {
        self.state = LoopState::Running;
        let reason = loop {
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(reason)) => break reason,
                Err(SelfieError::FrameRead) => {
                    error!("Unable to read from the camera");
                    break StopReason::CameraLost;
                }
                Err(err) => {
                    error!("Unexpected error: {}", err);
                    break StopReason::Failed(err);
                }
            }
        };
        self.cleanup();
        self.state = LoopState::Stopped;
        reason
    }

    // One frame: detect, decide per face, render, poll keys. These stages
    // are only an ordering inside this call, not separate `LoopState`s.
    fn step(&mut self) -> Result<Flow> {
        if self.interrupt.load(Ordering::SeqCst) {
            info!("Interrupted by user");
            return Ok(Flow::Stop(StopReason::Interrupted));
        }

        let frame = self.camera.next_frame()?;
        let now = self.clock.now();
        let gray = convert_to_grayscale(&frame)?;

        let faces = self.detector.detect_faces(&gray)?;
        let mut observations = Vec::with_capacity(faces.len());
        for face in faces {
            let smiles = self.detector.detect_smiles(&gray, mouth_region(face))?;
            debug!(
                "Face detected at ({},{}), Smiles found: {}",
                face.x,
                face.y,
                smiles.len()
            );
            let status = if smiles.is_empty() {
                FaceStatus::NoSmile
            } else {
                self.auto_capture(&frame, now)?
            };
            observations.push(FaceObservation {
                face,
                smiles,
                status,
            });
        }

        let debug_frame = annotate(&frame, &observations, self.saved_count)?;
        self.last_observations = observations;
        self.display.show(&debug_frame)?;

        match self.display.poll_key()? {
            Some(KeyCommand::Quit) => {
                info!("Exiting smile detection...");
                return Ok(Flow::Stop(StopReason::Quit));
            }
            Some(KeyCommand::ManualCapture) => self.manual_capture(&frame)?,
            None => {}
        }
        Ok(Flow::Continue)
    }

    fn auto_capture(&mut self, frame: &Mat, now: DateTime<Local>) -> Result<FaceStatus> {
        if !self.gate.may_capture(now) {
            return Ok(FaceStatus::CoolingDown {
                remaining: self.gate.remaining(now),
            });
        }
        match persistence::save_at(frame, &self.selfie_dir, now) {
            Ok(_) => {
                self.gate.record_capture(now);
                self.refresh_saved_count();
                Ok(FaceStatus::Captured)
            }
            Err(err) if err.is_recoverable() => {
                warn!("Failed to save selfie: {}", err);
                Ok(FaceStatus::CaptureFailed)
            }
            Err(err) => Err(err),
        }
    }

    // ignores the cooldown and leaves it untouched
    fn manual_capture(&mut self, frame: &Mat) -> Result<()> {
        match persistence::save_at(frame, &self.selfie_dir, self.clock.now()) {
            Ok(_) => {
                self.refresh_saved_count();
                info!("Manual selfie saved!");
            }
            Err(err) if err.is_recoverable() => warn!("Manual selfie failed: {}", err),
            Err(err) => return Err(err),
        }
        Ok(())
    }

    // same-second saves overwrite, so count what is actually on disk
    fn refresh_saved_count(&mut self) {
        self.saved_count = persistence::count(&self.selfie_dir);
    }

    fn cleanup(&mut self) {
        info!("Cleaning up resources...");
        if let Err(err) = self.camera.release() {
            warn!("Failed to release camera: {}", err);
        }
        if let Err(err) = self.display.close() {
            warn!("Failed to close display: {}", err);
        }
        info!("Cleanup complete!");
    }
}
