//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{BirdingError, Result};
use crate::mcp::ensure_server_dir;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Queries need both API keys, node, and the server directory.
    Query,
    /// Setup needs cargo and npm.
    Setup,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Query => {
            ensure_server_dir(&settings.ebird_server_dir())?;
            settings.llm_api_key()?;
            settings.ebird_api_key()?;
            check_tool(&settings.ebird.command)?;
        }
        Operation::Setup => {
            check_tool("cargo")?;
            check_tool("npm")?;
        }
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(BirdingError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BirdingError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(BirdingError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
