//! Command-line interface for itvtrack.
//!
//! This module provides the CLI structure for the `itvtrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, EditCommand, ListCommand, OutputFormat, RecordArgs, RecordRef,
    ShowCommand, StatsCommand,
};

/// itvtrack - Keep track of your vehicles' ITV
///
/// Records vehicle inspections, works out when the next ITV is due and
/// produces calendar links for the reminders.
#[derive(Debug, Parser)]
#[command(name = "itvtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a vehicle inspection record
    Add(AddCommand),

    /// Edit an existing record
    Edit(EditCommand),

    /// Remove a record
    Remove(RecordRef),

    /// List every record, newest first
    List(ListCommand),

    /// List records with an ITV due, soonest first
    Upcoming(ListCommand),

    /// Show one record in detail
    Show(ShowCommand),

    /// Print the calendar link for a record's next ITV
    Calendar(RecordRef),

    /// Show storage statistics
    Stats(StatsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
