//! CLI module for the birding assistant.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{truncate, Output};

use clap::{Parser, Subcommand};

/// Birding assistant
///
/// Answers questions about bird species, sightings and hotspots by delegating
/// between a web-search resolver and an eBird specialist.
#[derive(Parser, Debug)]
#[command(name = "birding-assistant")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Defaults to `demo` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the three demonstration queries
    Demo,

    /// Ask a single birding question
    Ask {
        /// The question to ask
        query: String,

        /// Print the full answer instead of a preview
        #[arg(short, long)]
        full: bool,
    },

    /// Start an interactive session (each question is answered independently)
    Chat,

    /// Start HTTP API server exposing the query service
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// List the tools exposed by the eBird MCP server
    Tools,

    /// Install project and eBird MCP server dependencies
    Setup,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the current settings to the configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
