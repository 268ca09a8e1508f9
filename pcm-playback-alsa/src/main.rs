use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use pcm_playback_alsa::cli::{self, Args, EXIT_USAGE};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version come through here too.
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Ctrl-C asks the controller to drain and close instead of killing the process.
    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Interrupt received, finishing playback");
        flag.store(true, Ordering::SeqCst);
    }) {
        log::warn!("Could not install interrupt handler: {}", e);
    }

    ExitCode::from(cli::run(args, interrupt))
}
