use clap::Parser;
use log::{debug, info, warn};
use smile_selfie::config::{DEFAULT_FACE_CASCADE, DEFAULT_SMILE_CASCADE};
use smile_selfie::detector::{convert_to_grayscale, largest_face, mouth_region};
use smile_selfie::{CameraSource, CaptureConfig, Detector, FrameSource, SelfieError};

/// Runs face and smile detection on a fixed number of frames and prints
/// what was found, without a preview window or any captures.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Camera device index.
    #[clap(long, default_value_t = 0)]
    camera: i32,

    /// Number of frames to inspect.
    #[clap(short = 'n', long, default_value_t = 50)]
    frames: usize,

    #[clap(long, default_value = DEFAULT_FACE_CASCADE)]
    face_cascade: String,

    #[clap(long, default_value = DEFAULT_SMILE_CASCADE)]
    smile_cascade: String,
}

fn main() -> anyhow::Result<()> {
    smile_selfie::logging::init();

    let args: Args = Args::parse();
    let config = CaptureConfig {
        camera_index: args.camera,
        face_cascade: args.face_cascade,
        smile_cascade: args.smile_cascade,
        ..Default::default()
    };

    let mut detector = Detector::load(&config)?;
    let mut camera = CameraSource::open(&config)?;

    info!("Testing smile detection...");
    info!("Show your face and smile to test detection.");

    for i in 0..args.frames {
        let frame = match camera.next_frame() {
            Ok(frame) => frame,
            Err(SelfieError::FrameRead) => {
                warn!("Frame {}: read failed, skipping", i);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let gray = convert_to_grayscale(&frame)?;
        let faces = detector.detect_faces(&gray)?;
        for face in &faces {
            let smiles = detector.detect_smiles(&gray, mouth_region(*face))?;
            info!("Frame {}: {} faces, {} smiles", i, faces.len(), smiles.len());
        }
        if let Some(largest) = largest_face(&faces) {
            debug!("Frame {}: largest face {}x{}", i, largest.width, largest.height);
        }
    }

    camera.release()?;
    info!("Test complete!");
    Ok(())
}
