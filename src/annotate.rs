use crate::error::Result;
use opencv::core::{Point, Rect, Scalar};
use opencv::imgproc;
use opencv::prelude::*;
use std::time::Duration;

// BGR
const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const CYAN: (f64, f64, f64) = (255.0, 255.0, 0.0);
const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);

/// What happened for one face in this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceStatus {
    NoSmile,
    CoolingDown { remaining: Duration },
    Captured,
    CaptureFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    pub face: Rect,
    /// Smile boxes in frame coordinates.
    pub smiles: Vec<Rect>,
    pub status: FaceStatus,
}

pub fn status_caption(status: &FaceStatus) -> String {
    match status {
        FaceStatus::NoSmile => "Please smile!".to_owned(),
        FaceStatus::CoolingDown { remaining } => format!("Wait {:.1}s", remaining.as_secs_f64()),
        FaceStatus::Captured => "SELFIE SAVED!".to_owned(),
        FaceStatus::CaptureFailed => "Save failed!".to_owned(),
    }
}

/// Draws detections, per face status, the saved counter and the quit hint
/// on a copy of `frame`.
pub fn annotate(frame: &Mat, faces: &[FaceObservation], saved_count: usize) -> Result<Mat> {
    let mut debug_frame = frame.clone();

    for observation in faces {
        let face = observation.face;
        imgproc::rectangle(
            &mut debug_frame,
            face,
            color(GREEN),
            2,
            imgproc::LINE_8,
            0,
        )?;
        label(&mut debug_frame, "Face", Point::new(face.x, face.y - 10), 0.6, GREEN, 2)?;

        for smile in &observation.smiles {
            imgproc::rectangle(
                &mut debug_frame,
                *smile,
                color(RED),
                2,
                imgproc::LINE_8,
                0,
            )?;
        }

        let below = face.y + face.height;
        match &observation.status {
            FaceStatus::NoSmile => {
                label(
                    &mut debug_frame,
                    &status_caption(&observation.status),
                    Point::new(face.x, below + 30),
                    0.6,
                    CYAN,
                    2,
                )?;
            }
            status => {
                label(
                    &mut debug_frame,
                    "SMILE DETECTED!",
                    Point::new(face.x, below + 30),
                    0.8,
                    RED,
                    2,
                )?;
                let tint = match status {
                    FaceStatus::Captured => GREEN,
                    FaceStatus::CaptureFailed => RED,
                    _ => CYAN,
                };
                label(
                    &mut debug_frame,
                    &status_caption(status),
                    Point::new(face.x, below + 60),
                    0.6,
                    tint,
                    2,
                )?;
            }
        }
    }

    let rows = debug_frame.rows();
    label(
        &mut debug_frame,
        "Press 'q' to quit",
        Point::new(10, rows - 20),
        0.6,
        WHITE,
        2,
    )?;
    label(
        &mut debug_frame,
        &format!("Selfies saved: {}", saved_count),
        Point::new(10, 30),
        0.6,
        WHITE,
        2,
    )?;

    Ok(debug_frame)
}

fn color((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

fn label(
    image: &mut Mat,
    text: &str,
    origin: Point,
    scale: f64,
    tint: (f64, f64, f64),
    thickness: i32,
) -> Result<()> {
    imgproc::put_text(
        image,
        text,
        origin,
        imgproc::FONT_HERSHEY_SIMPLEX,
        scale,
        color(tint),
        thickness,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}
