use chrono::{DateTime, Local, TimeZone};
use opencv::core::{self, Rect, Scalar};
use opencv::prelude::*;
use smile_selfie::annotate::FaceStatus;
use smile_selfie::{
    persistence, CaptureLoop, Clock, CooldownGate, Detector, FrameSink, FrameSource, KeyCommand,
    LoopState, PatternDetector, SelfieError, StopReason,
};
use std::cell::Cell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn base() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 1, 15, 14, 30, 22)
        .single()
        .unwrap()
}

fn at_ms(ms: i64) -> DateTime<Local> {
    base() + chrono::Duration::milliseconds(ms)
}

struct ManualClock(Rc<Cell<DateTime<Local>>>);

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.0.get()
    }
}

/// Yields bright frames for smiles and dim ones otherwise, moving the clock
/// to each frame's timestamp.
struct ScriptedCamera {
    frames: VecDeque<(i64, bool)>,
    clock: Rc<Cell<DateTime<Local>>>,
    released: Rc<Cell<bool>>,
    read: Rc<Cell<usize>>,
}

impl FrameSource for ScriptedCamera {
    fn next_frame(&mut self) -> smile_selfie::error::Result<Mat> {
        let (ms, smiling) = self.frames.pop_front().ok_or(SelfieError::FrameRead)?;
        self.clock.set(at_ms(ms));
        self.read.set(self.read.get() + 1);
        let level = if smiling { 255.0 } else { 60.0 };
        Ok(Mat::new_rows_cols_with_default(
            480,
            640,
            core::CV_8UC3,
            Scalar::all(level),
        )?)
    }

    fn release(&mut self) -> smile_selfie::error::Result<()> {
        self.released.set(true);
        Ok(())
    }
}

struct ScriptedDisplay {
    keys: VecDeque<Option<KeyCommand>>,
    shown: Rc<Cell<usize>>,
    closed: Rc<Cell<bool>>,
}

impl FrameSink for ScriptedDisplay {
    fn show(&mut self, _frame: &Mat) -> smile_selfie::error::Result<()> {
        self.shown.set(self.shown.get() + 1);
        Ok(())
    }

    fn poll_key(&mut self) -> smile_selfie::error::Result<Option<KeyCommand>> {
        Ok(self.keys.pop_front().flatten())
    }

    fn close(&mut self) -> smile_selfie::error::Result<()> {
        self.closed.set(true);
        Ok(())
    }
}

struct FixedFace;

impl PatternDetector for FixedFace {
    fn detect(&mut self, _image: &Mat) -> smile_selfie::error::Result<Vec<Rect>> {
        Ok(vec![Rect::new(200, 100, 200, 200)])
    }
}

struct TwoFaces;

impl PatternDetector for TwoFaces {
    fn detect(&mut self, _image: &Mat) -> smile_selfie::error::Result<Vec<Rect>> {
        Ok(vec![Rect::new(20, 100, 200, 200), Rect::new(400, 100, 200, 200)])
    }
}

struct BrightSmile;

impl PatternDetector for BrightSmile {
    fn detect(&mut self, image: &Mat) -> smile_selfie::error::Result<Vec<Rect>> {
        if *image.at_2d::<u8>(0, 0)? > 128 {
            Ok(vec![Rect::new(20, 20, 60, 30)])
        } else {
            Ok(Vec::new())
        }
    }
}

struct BrokenFace;

impl PatternDetector for BrokenFace {
    fn detect(&mut self, _image: &Mat) -> smile_selfie::error::Result<Vec<Rect>> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "detector crashed").into())
    }
}

struct Harness {
    capture_loop: CaptureLoop<ScriptedCamera, ScriptedDisplay, ManualClock>,
    released: Rc<Cell<bool>>,
    closed: Rc<Cell<bool>>,
    shown: Rc<Cell<usize>>,
    read: Rc<Cell<usize>>,
}

fn harness(
    dir: &Path,
    frames: Vec<(i64, bool)>,
    keys: Vec<Option<KeyCommand>>,
    face: Box<dyn PatternDetector>,
) -> Harness {
    let clock = Rc::new(Cell::new(base()));
    let released = Rc::new(Cell::new(false));
    let closed = Rc::new(Cell::new(false));
    let shown = Rc::new(Cell::new(0));
    let read = Rc::new(Cell::new(0));
    let camera = ScriptedCamera {
        frames: frames.into(),
        clock: clock.clone(),
        released: released.clone(),
        read: read.clone(),
    };
    let display = ScriptedDisplay {
        keys: keys.into(),
        shown: shown.clone(),
        closed: closed.clone(),
    };
    let capture_loop = CaptureLoop::new(
        camera,
        display,
        ManualClock(clock),
        Detector::new(face, Box::new(BrightSmile)),
        CooldownGate::new(Duration::from_secs(2)),
        dir,
    );
    Harness {
        capture_loop,
        released,
        closed,
        shown,
        read,
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = persistence::list(dir)
        .iter()
        .map(|path: &PathBuf| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn continuous_smile_is_captured_once_per_cooldown() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames: Vec<(i64, bool)> = (0..10).map(|i| (i * 100, false)).collect();
    frames.extend((0..=82).map(|i| (1_000 + i * 50, true)));
    let frame_count = frames.len();

    let mut h = harness(dir.path(), frames, Vec::new(), Box::new(FixedFace));
    assert_eq!(h.capture_loop.state(), LoopState::Idle);

    let reason = h.capture_loop.run();

    assert!(matches!(reason, StopReason::CameraLost));
    assert!(!reason.is_success());
    assert_eq!(
        file_names(dir.path()),
        vec![
            "selfie_20240115-143023.png",
            "selfie_20240115-143025.png",
            "selfie_20240115-143027.png",
        ]
    );
    assert_eq!(h.capture_loop.saved_count(), 3);
    assert_eq!(h.capture_loop.gate().last_capture(), Some(at_ms(5_100)));
    assert_eq!(h.shown.get(), frame_count);
    assert_eq!(h.capture_loop.state(), LoopState::Stopped);
    assert!(h.released.get());
    assert!(h.closed.get());
}

#[test]
fn no_smile_means_no_capture() {
    let dir = tempfile::tempdir().unwrap();
    let frames = (0..20).map(|i| (i * 100, false)).collect();

    let mut h = harness(dir.path(), frames, Vec::new(), Box::new(FixedFace));
    h.capture_loop.run();

    assert_eq!(persistence::count(dir.path()), 0);
    assert_eq!(h.capture_loop.gate().last_capture(), None);
}

#[test]
fn quit_key_stops_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let frames = (0..10).map(|i| (i * 100, false)).collect();
    let keys = vec![None, None, Some(KeyCommand::Quit)];

    let mut h = harness(dir.path(), frames, keys, Box::new(FixedFace));
    let reason = h.capture_loop.run();

    assert!(matches!(reason, StopReason::Quit));
    assert!(reason.is_success());
    assert_eq!(h.read.get(), 3);
    assert!(h.released.get());
    assert!(h.closed.get());
}

#[test]
fn manual_capture_ignores_and_keeps_cooldown() {
    let dir = tempfile::tempdir().unwrap();
    let frames = vec![(0, true), (1_500, false), (1_600, false)];
    let keys = vec![
        None,
        Some(KeyCommand::ManualCapture),
        Some(KeyCommand::Quit),
    ];

    let mut h = harness(dir.path(), frames, keys, Box::new(FixedFace));
    let reason = h.capture_loop.run();

    assert!(matches!(reason, StopReason::Quit));
    assert_eq!(
        file_names(dir.path()),
        vec!["selfie_20240115-143022.png", "selfie_20240115-143023.png"]
    );
    assert_eq!(h.capture_loop.gate().last_capture(), Some(base()));
    assert_eq!(h.capture_loop.saved_count(), 2);
}

#[test]
fn failed_write_leaves_cooldown_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("not-created");
    let frames = (0..5).map(|i| (i * 100, true)).collect();

    let mut h = harness(&missing, frames, Vec::new(), Box::new(FixedFace));
    let before = h.capture_loop.gate().clone();
    let reason = h.capture_loop.run();

    // write errors are not fatal, the loop runs until the camera is done
    assert!(matches!(reason, StopReason::CameraLost));
    assert_eq!(h.read.get(), 5);
    assert_eq!(h.capture_loop.gate(), &before);
    assert_eq!(h.capture_loop.saved_count(), 0);
    assert_eq!(persistence::count(&missing), 0);
}

#[test]
fn interrupt_is_treated_as_quit() {
    let dir = tempfile::tempdir().unwrap();
    let frames = (0..10).map(|i| (i * 100, true)).collect();

    let mut h = harness(dir.path(), frames, Vec::new(), Box::new(FixedFace));
    h.capture_loop.interrupt_handle().store(true, Ordering::SeqCst);
    let reason = h.capture_loop.run();

    assert!(matches!(reason, StopReason::Interrupted));
    assert!(reason.is_success());
    assert_eq!(h.read.get(), 0);
    assert!(h.released.get());
    assert!(h.closed.get());
}

#[test]
fn detector_error_stops_with_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let frames = (0..10).map(|i| (i * 100, true)).collect();

    let mut h = harness(dir.path(), frames, Vec::new(), Box::new(BrokenFace));
    let reason = h.capture_loop.run();

    assert!(matches!(reason, StopReason::Failed(SelfieError::Io(_))));
    assert!(!reason.is_success());
    assert_eq!(h.read.get(), 1);
    assert_eq!(h.shown.get(), 0);
    assert!(h.released.get());
    assert!(h.closed.get());
}

#[test]
fn saved_counter_starts_from_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("selfie_20240101-120000.png"), b"png").unwrap();
    std::fs::write(dir.path().join("selfie_20240101-120005.png"), b"png").unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"txt").unwrap();

    let h = harness(dir.path(), Vec::new(), Vec::new(), Box::new(FixedFace));
    assert_eq!(h.capture_loop.saved_count(), 2);
}

fn statuses(h: &Harness) -> Vec<FaceStatus> {
    h.capture_loop
        .last_observations()
        .iter()
        .map(|observation| observation.status.clone())
        .collect()
}

#[test]
fn first_smile_is_reported_captured() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(dir.path(), vec![(0, true)], Vec::new(), Box::new(FixedFace));
    h.capture_loop.run();

    assert_eq!(statuses(&h), vec![FaceStatus::Captured]);
    assert_eq!(h.capture_loop.last_observations()[0].smiles.len(), 1);
}

#[test]
fn smile_during_cooldown_reports_remaining_wait() {
    let dir = tempfile::tempdir().unwrap();
    let frames = vec![(0, true), (1_500, true)];
    let mut h = harness(dir.path(), frames, Vec::new(), Box::new(FixedFace));
    h.capture_loop.run();

    assert_eq!(
        statuses(&h),
        vec![FaceStatus::CoolingDown {
            remaining: Duration::from_millis(500)
        }]
    );
    assert_eq!(persistence::count(dir.path()), 1);
}

#[test]
fn no_smile_reports_encouragement() {
    let dir = tempfile::tempdir().unwrap();
    let frames = vec![(0, true), (500, false)];
    let mut h = harness(dir.path(), frames, Vec::new(), Box::new(FixedFace));
    h.capture_loop.run();

    assert_eq!(statuses(&h), vec![FaceStatus::NoSmile]);
}

#[test]
fn unwritable_directory_reports_capture_failed() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("not-created");
    let mut h = harness(&missing, vec![(0, true)], Vec::new(), Box::new(FixedFace));
    h.capture_loop.run();

    assert_eq!(statuses(&h), vec![FaceStatus::CaptureFailed]);
    assert_eq!(h.capture_loop.gate().last_capture(), None);
}

#[test]
fn second_smiling_face_sees_fresh_cooldown() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(dir.path(), vec![(0, true)], Vec::new(), Box::new(TwoFaces));
    h.capture_loop.run();

    assert_eq!(
        statuses(&h),
        vec![
            FaceStatus::Captured,
            FaceStatus::CoolingDown {
                remaining: Duration::from_secs(2)
            },
        ]
    );
    assert_eq!(persistence::count(dir.path()), 1);
}
