//! One-time project setup: fetch this project's dependencies, then install
//! the eBird MCP server's Node dependencies.

use crate::config::Settings;
use crate::error::{BirdingError, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

/// A single external command run during setup.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupStep {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

impl SetupStep {
    fn new(name: &str, program: &str, args: &[&str], dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            dir,
        }
    }

    /// Run the step, failing if the process cannot start or exits non-zero.
    pub fn run(&self) -> Result<()> {
        info!(
            "Setup step '{}': {} {} (in {})",
            self.name,
            self.program,
            self.args.join(" "),
            self.dir.display()
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.dir)
            .status()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BirdingError::ToolNotFound(self.program.clone())
                } else {
                    BirdingError::ToolFailed(format!("{}: {}", self.program, e))
                }
            })?;

        if !status.success() {
            return Err(BirdingError::ToolFailed(format!(
                "{} failed ({})",
                self.name, status
            )));
        }
        Ok(())
    }
}

/// The two setup steps, in order. Both are safe to re-run.
pub fn setup_steps(settings: &Settings) -> Vec<SetupStep> {
    vec![
        SetupStep::new(
            "project dependencies",
            "cargo",
            &["fetch"],
            settings.project_root(),
        ),
        SetupStep::new(
            "eBird MCP server dependencies",
            "npm",
            &["install"],
            settings.ebird_server_dir(),
        ),
    ]
}

/// Run steps in order, stopping at the first failure.
pub fn run_steps(steps: &[SetupStep], mut on_done: impl FnMut(&SetupStep)) -> Result<()> {
    for step in steps {
        if !step.dir.is_dir() {
            return Err(BirdingError::Config(format!(
                "Directory for '{}' not found: {}",
                step.name,
                step.dir.display()
            )));
        }
        step.run()?;
        on_done(step);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_steps() {
        let settings = Settings::default();
        let steps = setup_steps(&settings);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].program, "cargo");
        assert_eq!(steps[1].program, "npm");
        assert_eq!(steps[1].args, vec!["install"]);
        assert!(steps[1].dir.ends_with("ebird-mcp-server"));
    }

    #[cfg(unix)]
    #[test]
    fn test_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let steps = vec![
            SetupStep::new("ok", "true", &[], dir.path().to_path_buf()),
            SetupStep::new("broken", "false", &[], dir.path().to_path_buf()),
            SetupStep::new("never", "true", &[], dir.path().to_path_buf()),
        ];

        let mut done = Vec::new();
        let result = run_steps(&steps, |s| done.push(s.name.clone()));
        assert_err!(&result);
        assert_eq!(done, vec!["ok"]);
        assert_ok!(run_steps(&steps[..1], |_| {}));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let steps = vec![SetupStep::new("npm", "npm", &["install"], dir.path().join("nope"))];
        assert!(matches!(run_steps(&steps, |_| {}), Err(BirdingError::Config(_))));
    }
}
