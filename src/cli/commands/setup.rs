//! Setup command - install dependencies for the project and the MCP server.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::setup::{run_steps, setup_steps};

/// Run the setup command. Any failing step aborts with a non-zero exit.
pub fn run_setup(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Setting up the birding assistant");

    if let Err(e) = preflight::check(Operation::Setup, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let steps = setup_steps(settings);
    if let Err(e) = run_steps(&steps, |step| Output::success(&format!("{} installed", step.name))) {
        Output::error(&format!("Setup failed: {}", e));
        return Err(e.into());
    }

    println!();
    Output::success("Ready! Run: birding-assistant demo");
    Ok(())
}
