//! woof: discover and pair the result files of two pipeline runs
//!
//! Usage:
//!   woof discover --run-dir-one <ROOT>... --run-dir-two <ROOT>... --output-dir <DIR>
//!   woof producers [--json]
//!   woof config [--json]

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "woof", version, about = "Discover and pair the result files of two pipeline runs")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify run directories, pair their files and write the manifest
    Discover(cli::discover::DiscoverArgs),

    /// List the producers discovery can recognise
    Producers {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration and paths
    Config(cli::config::ConfigArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Discover(args) => args.json,
        Commands::Producers { json } => *json,
        Commands::Config(args) => args.json,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    if let Err(err) = woof_logging::init_logging(woof_logging::LogConfig {
        app_name: "woof",
        verbose: cli.verbose,
        json_mode,
    }) {
        eprintln!("Warning: logging disabled: {:#}", err);
    }

    let result = match cli.command {
        Commands::Discover(args) => cli::discover::run(args),
        Commands::Producers { json } => cli::producers::run(json),
        Commands::Config(args) => cli::config::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
