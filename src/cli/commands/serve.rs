//! HTTP API server exposing the query service.

use super::start_service;
use crate::cli::Output;
use crate::config::Settings;
use crate::service::{BirdingService, QueryOutcome};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let service = Arc::new(start_service(settings).await?);
    let app = router(service);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Birding Assistant API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /query");
    Output::kv("Tools", "GET  /tools");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(service: Arc<BirdingService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .route("/tools", get(list_tools))
        .layer(cors)
        .with_state(service)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(service): State<Arc<BirdingService>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    match service.query(&req.query).await {
        QueryOutcome::Answer(answer) => Json(QueryResponse { answer }).into_response(),
        QueryOutcome::Failed(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error }),
        )
            .into_response(),
    }
}

async fn list_tools(State(service): State<Arc<BirdingService>>) -> impl IntoResponse {
    let tools: Vec<ToolInfo> = service
        .context()
        .ebird_tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name.clone(),
            description: t.description.clone(),
        })
        .collect();
    Json(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::WebSearchTool;
    use crate::birding::AppContext;
    use crate::config::Prompts;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::ModelTurn;

    fn test_service(model: ScriptedModel) -> Arc<BirdingService> {
        let settings = Settings::default();
        let search = Arc::new(WebSearchTool::new(&settings.search).unwrap());
        let context = AppContext::from_parts(
            settings,
            &Prompts::default(),
            Arc::new(model),
            search,
            Vec::new(),
        );
        Arc::new(BirdingService::new(Arc::new(context)))
    }

    #[tokio::test]
    async fn test_query_answer() {
        let service = test_service(ScriptedModel::new().on(
            "professional birding assistant",
            vec![ModelTurn::text("Try Mount Auburn Cemetery.")],
        ));

        let response = query(
            State(service),
            Json(QueryRequest {
                query: "Birding hotspots near Boston".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_query_failure_is_server_error() {
        let service = test_service(ScriptedModel::new());

        let response = query(
            State(service),
            Json(QueryRequest {
                query: "Paris birds".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
