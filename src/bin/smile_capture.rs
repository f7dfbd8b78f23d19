use anyhow::Context;
use clap::Parser;
use log::{error, info};
use smile_selfie::config::{DEFAULT_FACE_CASCADE, DEFAULT_SMILE_CASCADE};
use smile_selfie::{
    persistence, CameraSource, CaptureConfig, CaptureLoop, CooldownGate, Detector,
    HighGuiWindow, SystemClock,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Camera device index.
    #[clap(long, default_value_t = 0)]
    camera: i32,

    /// Directory selfies are written to.
    #[clap(long, default_value = "selfies")]
    selfie_dir: PathBuf,

    /// Minimum seconds between automatic captures.
    #[clap(long, default_value_t = 2.0)]
    cooldown_secs: f64,

    /// Requested frame width.
    #[clap(long, default_value_t = 640)]
    width: u32,

    /// Requested frame height.
    #[clap(long, default_value_t = 480)]
    height: u32,

    /// Requested frame rate.
    #[clap(long, default_value_t = 30)]
    fps: u32,

    /// Face cascade file, searched in OpenCV's data path unless it exists.
    #[clap(long, default_value = DEFAULT_FACE_CASCADE)]
    face_cascade: String,

    /// Smile cascade file, searched in OpenCV's data path unless it exists.
    #[clap(long, default_value = DEFAULT_SMILE_CASCADE)]
    smile_cascade: String,

    /// Preview window title.
    #[clap(long)]
    window_title: Option<String>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<CaptureConfig> {
        let cooldown = Duration::try_from_secs_f64(self.cooldown_secs)
            .with_context(|| format!("Invalid cooldown {}", self.cooldown_secs))?;
        let defaults = CaptureConfig::default();
        Ok(CaptureConfig {
            camera_index: self.camera,
            selfie_dir: self.selfie_dir,
            cooldown,
            frame_width: self.width,
            frame_height: self.height,
            fps: self.fps,
            face_cascade: self.face_cascade,
            smile_cascade: self.smile_cascade,
            window_title: self.window_title.unwrap_or(defaults.window_title),
        })
    }
}

#[tokio::main]
async fn main() {
    smile_selfie::logging::init();

    let args: Args = Args::parse();

    let succeeded = match run(args).await {
        Ok(succeeded) => succeeded,
        Err(err) => {
            error!("Error: {:#}", err);
            false
        }
    };
    if succeeded {
        info!("Application completed successfully!");
    } else {
        info!("Application encountered errors.");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = args.into_config()?;

    // models first, the camera is only opened once they are usable
    let detector = Detector::load(&config)?;
    persistence::ensure_dir(&config.selfie_dir)
        .with_context(|| format!("Unable to create {}", config.selfie_dir.display()))?;
    let camera = CameraSource::open(&config)?;
    let window = HighGuiWindow::new(&config.window_title)?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let ctrl_c_flag = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_flag.store(true, Ordering::SeqCst);
        }
    });

    let mut capture_loop = CaptureLoop::new(
        camera,
        window,
        SystemClock,
        detector,
        CooldownGate::new(config.cooldown),
        &config.selfie_dir,
    )
    .with_interrupt(interrupt);

    info!("Smile detection started! Press 'q' to quit.");
    info!("Make sure to smile for the camera to capture selfies!");

    // highgui wants the thread that created the window
    let reason = tokio::task::block_in_place(|| capture_loop.run());
    info!(
        "Stopped ({:?}) with {} selfies saved",
        reason,
        capture_loop.saved_count()
    );
    Ok(reason.is_success())
}
