//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &PathBuf) -> anyhow::Result<()> {
    Output::header("Birding Assistant Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let tools = vec![
        check_tool(&settings.ebird.command, install_hint_node()),
        check_tool("npm", install_hint_node()),
    ];
    section(&mut checks, "External Tools", tools);

    let server = check_server_dir(&settings.ebird_server_dir(), &settings.ebird.entry);
    section(&mut checks, "eBird MCP Server", server);

    let keys = vec![
        check_api_key(&settings.llm.api_key_env, None),
        check_api_key(&settings.ebird.api_key_env, settings.ebird.api_key.as_deref()),
    ];
    section(&mut checks, "API Configuration", keys);

    section(&mut checks, "Configuration", vec![check_config_file(config_path)]);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running queries.",
            errors
        ));
        anyhow::bail!("{} doctor check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! The birding assistant is ready to use.");
    }

    Ok(())
}

fn section(checks: &mut Vec<CheckResult>, title: &str, results: Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for check in &results {
        check.print();
    }
    println!();
    checks.extend(results);
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(name, &crate::cli::truncate(&version, 50))
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the server folder, its entry script and installed dependencies.
fn check_server_dir(dir: &Path, entry: &str) -> Vec<CheckResult> {
    if !dir.is_dir() {
        return vec![CheckResult::error(
            "Server folder",
            &format!("{} not found", dir.display()),
            "Clone the eBird MCP server next to this project",
        )];
    }

    let mut results = vec![CheckResult::ok("Server folder", &dir.display().to_string())];

    if dir.join(entry).is_file() {
        results.push(CheckResult::ok("Entry script", entry));
    } else {
        results.push(CheckResult::error(
            "Entry script",
            &format!("{} missing", entry),
            "Check ebird.entry in the config file",
        ));
    }

    if dir.join("node_modules").is_dir() {
        results.push(CheckResult::ok("Dependencies", "installed"));
    } else {
        results.push(CheckResult::warning(
            "Dependencies",
            "node_modules not found",
            "Run: birding-assistant setup",
        ));
    }

    results
}

/// Check that an API key is available, from config or the environment.
fn check_api_key(env_var: &str, configured: Option<&str>) -> CheckResult {
    if let Some(key) = configured.filter(|k| !k.trim().is_empty()) {
        return CheckResult::ok(env_var, &format!("set in config ({})", mask_key(key)));
    }

    let hint = format!("Set with: export {}='...'", env_var);
    match std::env::var(env_var) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(env_var, "empty", &hint),
        Ok(key) => CheckResult::ok(env_var, &format!("configured ({})", mask_key(&key))),
        Err(_) => CheckResult::error(env_var, "not set", &hint),
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create one at {}", config_path.display()),
        )
    }
}

/// Platform-specific install hint for Node.js.
fn install_hint_node() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install node"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install nodejs npm (or your package manager)"
    } else {
        "Install from: https://nodejs.org/"
    }
}
