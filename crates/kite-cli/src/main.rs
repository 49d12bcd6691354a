//! Kite checker CLI.
//!
//! # Commands
//!
//! - `kite check [path]` - Type-check every package below a directory
//!
//! # Examples
//!
//! ```text
//! kite check
//! kite check ./myproject --trace
//! KITE_LOG=debug kite check ./myproject
//! ```

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "kite")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kite type checker", long_about = None)]
#[command(after_help = "Use 'kite <command> --help' for more information about a command.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a project
    ///
    /// Every directory below the project root that holds .kite files is a
    /// package; its import path is the directory path relative to the root.
    /// Files directly in the root form the package "main".
    #[command(after_help = "Examples:\n  kite check\n  kite check ./myproject --trace")]
    Check {
        /// Path to project directory
        #[arg(default_value = ".")]
        path: String,

        /// Trace the type checker (same as KITE_TRACE=1)
        #[arg(long)]
        trace: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("KITE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { path, trace } => commands::check::run(&path, trace),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}
