//! Demo command - run a fixed set of queries end to end.

use super::start_service;
use crate::cli::{truncate, Output};
use crate::config::Settings;
use crate::service::BirdingService;
use std::time::Duration;

/// Queries exercised by the demo: a hotspot search, a species plus a city,
/// and a vague location-only question.
pub const DEMO_QUERIES: [&str; 3] = [
    "Birding hotspots near Boston",
    "Bald eagles Seattle",
    "Paris birds",
];

const PAUSE_BETWEEN_QUERIES: Duration = Duration::from_secs(1);

/// Run the demo queries and print a preview of each answer.
pub async fn run_demo(settings: Settings) -> anyhow::Result<()> {
    let preview_chars = settings.service.preview_chars;
    let service = start_service(settings).await?;

    Output::header("Programmatic tests");
    run_queries(&service, &DEMO_QUERIES, preview_chars, PAUSE_BETWEEN_QUERIES).await;

    println!();
    Output::success("Birding assistant ready!");
    Output::kv("HTTP API", "birding-assistant serve");
    Output::kv("Interactive", "birding-assistant chat");
    println!("{}", "-".repeat(50));

    Ok(())
}

async fn run_queries(
    service: &BirdingService,
    queries: &[&str],
    preview_chars: usize,
    pause: Duration,
) {
    for query in queries {
        println!("\nQuery: {}", query);
        Output::separator();
        let response = service.run_query(query).await;
        Output::answer(&truncate(&response, preview_chars));
        tokio::time::sleep(pause).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::WebSearchTool;
    use crate::birding::AppContext;
    use crate::config::Prompts;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::ModelTurn;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_demo_queries_run_in_order() {
        let settings = Settings::default();
        let model = Arc::new(ScriptedModel::new().on(
            "professional birding assistant",
            vec![
                ModelTurn::text("Boston hotspots"),
                ModelTurn::text("Seattle eagles"),
                ModelTurn::text("Paris birds"),
            ],
        ));
        let search = Arc::new(WebSearchTool::new(&settings.search).unwrap());
        let context = AppContext::from_parts(
            settings,
            &Prompts::default(),
            model.clone(),
            search,
            Vec::new(),
        );
        let service = BirdingService::new(Arc::new(context));

        run_queries(&service, &DEMO_QUERIES, 600, PAUSE_BETWEEN_QUERIES).await;

        let asked: Vec<String> = model
            .requests()
            .into_iter()
            .filter_map(|(_, messages, _)| {
                messages.into_iter().find_map(|m| match m {
                    crate::llm::Message::User(text) => Some(text),
                    _ => None,
                })
            })
            .collect();
        assert_eq!(asked, DEMO_QUERIES.to_vec());
    }
}
