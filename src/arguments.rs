//! Command-line flag handling.
//!
//! The bot takes a handful of flags, parsed directly from the cached
//! argument list. Flags:
//! - `--help` / `-h`      print usage and exit
//! - `--debug`            enable debug-level logging
//! - `--config <path>`    use an alternate config file
//! - `--simulate`         force simulated mode regardless of config

use once_cell::sync::Lazy;
use std::env;

/// Cached command-line arguments
pub static ARGS: Lazy<Vec<String>> = Lazy::new(|| env::args().collect());

pub fn is_help_requested() -> bool {
    ARGS.iter().any(|a| a == "--help" || a == "-h")
}

pub fn is_debug_enabled() -> bool {
    ARGS.iter().any(|a| a == "--debug")
}

pub fn is_simulate_forced() -> bool {
    ARGS.iter().any(|a| a == "--simulate")
}

/// Value following `--config`, if provided
pub fn get_config_override() -> Option<String> {
    ARGS.iter()
        .position(|a| a == "--config")
        .and_then(|i| ARGS.get(i + 1))
        .cloned()
}

pub fn print_help() {
    println!("dcabot - RSI-gated DCA trading bot");
    println!();
    println!("USAGE:");
    println!("  dcabot [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("  --help, -h        Show this help");
    println!("  --debug           Enable debug logging");
    println!("  --config <path>   Use an alternate config file");
    println!("  --simulate        Force simulated mode (no orders leave the machine)");
}
