//! Interactive chat command.
//!
//! Every line is an independent query: no conversation history is carried
//! between questions.

use super::start_service;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> anyhow::Result<()> {
    let service = start_service(settings).await?;

    println!("\n{}", style("Birding Assistant").bold().cyan());
    println!(
        "{}\n",
        style("Ask about species, sightings or hotspots, or 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if is_exit(input) {
            Output::info("Goodbye!");
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let response = service.run_query(input).await;
        spinner.finish_and_clear();

        print!("\n{} ", style("Birder:").cyan().bold());
        Output::answer(&response);
        println!();
    }

    Ok(())
}

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}
