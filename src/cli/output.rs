//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a discovered tool with an optional description.
    pub fn tool(name: &str, description: Option<&str>) {
        match description {
            Some(desc) => println!(
                "  {} {} - {}",
                style("*").cyan(),
                style(name).bold(),
                content_preview(desc, 100)
            ),
            None => println!("  {} {}", style("*").cyan(), style(name).bold()),
        }
    }

    /// Print an answer, or an error line when the answer is an error string.
    pub fn answer(text: &str) {
        if text.starts_with("Error:") {
            println!("{}", style(text).red());
        } else {
            println!("{}", text);
        }
    }

    /// Print a separator line.
    pub fn separator() {
        println!("{}", "=".repeat(50));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
        {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Cut text to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Single-line preview of longer content.
fn content_preview(content: &str, max_chars: usize) -> String {
    truncate(&content.replace('\n', " "), max_chars)
}
