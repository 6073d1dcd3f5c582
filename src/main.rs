use dcabot::logger::{self, LogTag};
use dcabot::{arguments, paths, run};

#[tokio::main]
async fn main() {
    // Directories must exist before logger initialization (the logger
    // writes into the logs directory)
    if let Err(e) = paths::ensure_all_directories() {
        eprintln!("❌ Failed to create required directories: {}", e);
        std::process::exit(1);
    }

    logger::init(arguments::is_debug_enabled());

    if arguments::is_help_requested() {
        arguments::print_help();
        return;
    }

    logger::info(LogTag::System, "🚀 dcabot starting up...");

    match run::run_bot().await {
        Ok(()) => {
            logger::info(LogTag::System, "✅ dcabot exited cleanly");
        }
        Err(e) => {
            logger::error(LogTag::System, &format!("❌ dcabot failed: {}", e));
            std::process::exit(1);
        }
    }
}
