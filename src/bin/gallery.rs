use clap::Parser;
use smile_selfie::persistence;
use std::path::PathBuf;

/// Lists saved selfies, newest first.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Directory selfies are written to.
    #[clap(long, default_value = "selfies")]
    selfie_dir: PathBuf,

    /// Skip selfies older versions left in the working directory.
    #[clap(long)]
    no_legacy: bool,
}

fn main() -> anyhow::Result<()> {
    smile_selfie::logging::init();

    let args: Args = Args::parse();

    let (count, photos) = if args.no_legacy {
        (
            persistence::count(&args.selfie_dir),
            persistence::list(&args.selfie_dir),
        )
    } else {
        let legacy = std::env::current_dir()?;
        (
            persistence::count_with_legacy(&args.selfie_dir, &legacy),
            persistence::list_with_legacy(&args.selfie_dir, &legacy),
        )
    };

    if photos.is_empty() {
        println!("No photos found! Start the camera and smile to capture selfies.");
        return Ok(());
    }

    println!("Selfies saved: {}", count);
    for photo in &photos {
        let caption = persistence::caption(photo).unwrap_or_default();
        println!("{}  {}", caption, photo.display());
    }
    Ok(())
}
