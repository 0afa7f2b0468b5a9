//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// anki-sync - push markdown notes and their callouts into Anki
#[derive(Parser, Debug)]
#[command(name = "anki-sync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (default: ~/.anki-sync/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Vault root, overriding the configured one
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information
    Version,

    /// Show configuration summary and AnkiConnect reachability
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Deck and note type management
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },

    /// Sync notes into Anki
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },

    /// Write a generated identity into notes that lack one
    AssignIds {
        /// List the notes that would get an identity without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a single key and save
    Set {
        /// Setting name (e.g. deck_name, properties)
        key: String,

        /// New value; lists are comma separated
        value: String,
    },

    /// Check the configuration without contacting Anki
    Validate,
}

// ============================================================================
// Schema Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// Create or converge the deck and note type
    Ensure {
        /// Only converge existing ones, never create
        #[arg(long)]
        no_create: bool,
    },
}

// ============================================================================
// Sync Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Sync a single note
    Note {
        /// Path to the note (relative paths also resolve against the vault)
        path: PathBuf,

        /// Ensure the deck and note type first
        #[arg(long)]
        ensure_schema: bool,
    },

    /// Sync every vault note that passes the tag filter
    ///
    /// Ctrl-C stops after the note in flight and prints the partial report.
    /// A second Ctrl-C quits immediately, even during schema setup or a
    /// slow AnkiConnect request.
    All {
        /// Ensure the deck and note type first
        #[arg(long)]
        ensure_schema: bool,

        /// List what would be synced without contacting Anki
        #[arg(long)]
        dry_run: bool,
    },
}
