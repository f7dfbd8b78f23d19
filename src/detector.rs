use crate::config::CaptureConfig;
use crate::error::{Result, SelfieError};
use opencv::core::{self, Rect, Size};
use opencv::prelude::*;
use opencv::{imgproc, objdetect, types};
use std::path::Path;

/// Multi-scale search settings handed to a cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: i32,
}

pub const FACE_SCAN: ScanParams = ScanParams {
    scale_factor: 1.1,
    min_neighbors: 5,
    min_size: 100,
};

// high neighbor count keeps spurious smiles from triggering captures
pub const SMILE_SCAN: ScanParams = ScanParams {
    scale_factor: 1.8,
    min_neighbors: 20,
    min_size: 20,
};

/// Anything that takes an image region and returns zero or more boxes in
/// that region's coordinates.
pub trait PatternDetector {
    fn detect(&mut self, image: &Mat) -> Result<Vec<Rect>>;
}

pub struct CascadeDetector {
    classifier: objdetect::CascadeClassifier,
    params: ScanParams,
}

impl CascadeDetector {
    pub fn load(name: &'static str, path: &str, params: ScanParams) -> Result<Self> {
        let model_error = || SelfieError::ModelLoad {
            name,
            path: path.to_owned(),
        };
        let xml = resolve_cascade(path)?.ok_or_else(model_error)?;
        let classifier = objdetect::CascadeClassifier::new(&xml).map_err(|_| model_error())?;
        if classifier.empty()? {
            return Err(model_error());
        }
        log::debug!("Loaded {} cascade from {}", name, xml);
        Ok(Self { classifier, params })
    }
}

impl PatternDetector for CascadeDetector {
    fn detect(&mut self, image: &Mat) -> Result<Vec<Rect>> {
        let mut found = types::VectorOfRect::new();

        self.classifier.detect_multi_scale(
            image,
            &mut found,
            self.params.scale_factor,
            self.params.min_neighbors,
            objdetect::CASCADE_SCALE_IMAGE,
            Size {
                width: self.params.min_size,
                height: self.params.min_size,
            },
            Size {
                width: 0,
                height: 0,
            },
        )?;
        Ok(found.to_vec())
    }
}

/// Existing files are used as is, everything else goes through OpenCV's
/// data search path.
fn resolve_cascade(path: &str) -> Result<Option<String>> {
    if Path::new(path).is_file() {
        return Ok(Some(path.to_owned()));
    }
    let found = core::find_file(path, false, true)?;
    Ok((!found.is_empty()).then_some(found))
}

/// Face and smile detectors run as a pair.
pub struct Detector {
    face: Box<dyn PatternDetector>,
    smile: Box<dyn PatternDetector>,
}

impl Detector {
    pub fn new(face: Box<dyn PatternDetector>, smile: Box<dyn PatternDetector>) -> Self {
        Self { face, smile }
    }

    /// Fails before anything touches the camera if either cascade is missing.
    pub fn load(config: &CaptureConfig) -> Result<Self> {
        let face = CascadeDetector::load("face", &config.face_cascade, FACE_SCAN)?;
        let smile = CascadeDetector::load("smile", &config.smile_cascade, SMILE_SCAN)?;
        Ok(Self::new(Box::new(face), Box::new(smile)))
    }

    pub fn detect_faces(&mut self, gray: &Mat) -> Result<Vec<Rect>> {
        self.face.detect(gray)
    }

    /// Runs the smile search inside `mouth` and returns boxes in frame
    /// coordinates.
    pub fn detect_smiles(&mut self, gray: &Mat, mouth: Rect) -> Result<Vec<Rect>> {
        let Some(mouth) = clamp_to_frame(mouth, gray.size()?) else {
            return Ok(Vec::new());
        };
        let region = Mat::roi(gray, mouth)?;
        let smiles = self.smile.detect(&region)?;
        Ok(smiles
            .into_iter()
            .map(|smile| Rect::new(smile.x + mouth.x, smile.y + mouth.y, smile.width, smile.height))
            .collect())
    }
}

/// Lower two thirds of the face box, full width.
pub fn mouth_region(face: Rect) -> Rect {
    let top = face.height / 3;
    Rect::new(face.x, face.y + top, face.width, face.height - top)
}

/// Intersection of `rect` with the frame, `None` when nothing is left.
pub fn clamp_to_frame(rect: Rect, frame: Size) -> Option<Rect> {
    let left = rect.x.max(0);
    let top = rect.y.max(0);
    let right = (rect.x + rect.width).min(frame.width);
    let bottom = (rect.y + rect.height).min(frame.height);
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(left, top, right - left, bottom - top))
}

pub fn largest_face(faces: &[Rect]) -> Option<Rect> {
    faces
        .iter()
        .copied()
        .max_by(|a, b| (a.height * a.width).cmp(&(b.height * b.width)))
}

pub fn convert_to_grayscale(image: &Mat) -> Result<Mat> {
    let mut gray: Mat = Mat::default();
    imgproc::cvt_color_def(image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}
