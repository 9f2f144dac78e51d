//! entlink - entity disambiguation CLI
//!
//! Links detected mentions to knowledge-base senses using in-memory
//! knowledge base snapshots.
//!
//! # Usage
//!
//! ```bash
//! # Quick form: text plus mention spans
//! entlink link --kb en.json -t "Paris is in France" -m Paris:0:5 -m France:12:18
//!
//! # Full request document, several languages, n-best
//! entlink link --kb en.json --kb fr.json --input request.json --nbest
//!
//! # Term vectors
//! entlink terms --kb en.json --input terms.json --format tsv
//!
//! # Effective configuration
//! entlink config show
//! ```

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod commands;
mod parser;

use parser::{Cli, Commands};

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("entlink={level},entlink_cli={level}")));
    // Also installs the `log` bridge, so library records show up here.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result: Result<(), String> = match cli.command {
        Commands::Link(args) => commands::link(args),
        Commands::Terms(args) => commands::terms(args),
        Commands::Config(args) => commands::config(args.action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "entlink", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
