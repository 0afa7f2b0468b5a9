//! anki-sync CLI entry point.

use anki_sync::cli::commands;
use anki_sync::cli::{Cli, Commands};
use anki_sync::error::Error;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let config = cli.config.as_deref();
    let vault = cli.vault.as_deref();

    match &cli.command {
        Commands::Version => commands::version::execute(json),
        Commands::Status => commands::status::execute(config, vault, json),
        Commands::Config { command } => commands::config::execute(command, config, vault, json),
        Commands::Schema { command } => commands::schema::execute(command, config, vault, json),
        Commands::Sync { command } => commands::sync::execute(command, config, vault, json),
        Commands::AssignIds { dry_run } => {
            commands::assign_ids::execute(config, vault, *dry_run, json)
        }

        // Shell completions
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
