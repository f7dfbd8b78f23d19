use env_logger::{Builder, Env, Target};

/// Logs to stdout at `info` unless `RUST_LOG` says otherwise. Calling it
/// again after the logger is installed does nothing.
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .try_init();
}
