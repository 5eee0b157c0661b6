//! Ask command - answer a single question.

use super::start_service;
use crate::cli::{truncate, Output};
use crate::config::Settings;

/// Run the ask command.
pub async fn run_ask(query: &str, full: bool, settings: Settings) -> anyhow::Result<()> {
    let preview_chars = settings.service.preview_chars;
    let service = start_service(settings).await?;

    let spinner = Output::spinner("Thinking...");
    let outcome = service.query(query).await;
    spinner.finish_and_clear();

    let failed = outcome.is_error();
    let text = outcome.into_text();

    println!();
    if full {
        Output::answer(&text);
    } else {
        Output::answer(&truncate(&text, preview_chars));
    }

    if failed {
        anyhow::bail!("query failed");
    }
    Ok(())
}
