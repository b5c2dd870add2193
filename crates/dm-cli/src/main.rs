//! CLI frontend for the Duskmoor simulation core.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dm",
    about = "Duskmoor: tick-based MUD simulation core",
    version,
    propagate_version = true
)]
struct Cli {
    /// Verbose output: full event log and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo world for a number of ticks with a scripted player
    Simulate {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "40")]
        ticks: u64,

        /// RNG seed (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// JSON simulation config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the final world state as JSON
        #[arg(long)]
        dump: Option<PathBuf>,
    },

    /// Print the resolved system execution order
    Systems,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "dm_simulation=debug,dm_cli=debug"
    } else {
        "dm_simulation=info,dm_cli=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Simulate {
            ticks,
            seed,
            config,
            dump,
        } => commands::simulate::run(&commands::simulate::SimulateArgs {
            ticks,
            seed,
            config,
            dump,
            verbose: cli.verbose,
        }),
        Commands::Systems => commands::systems::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
