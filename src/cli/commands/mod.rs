//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod demo;
mod doctor;
mod serve;
mod setup;
mod tools;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use demo::{run_demo, DEMO_QUERIES};
pub use doctor::run_doctor;
pub use serve::run_serve;
pub use setup::run_setup;
pub use tools::run_tools;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::service::BirdingService;

/// Run pre-flight checks and bring the service up, reporting failures.
async fn start_service(settings: Settings) -> crate::Result<BirdingService> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'birding-assistant doctor' for detailed diagnostics.");
        return Err(e);
    }

    let spinner = Output::spinner("Starting agents and the eBird MCP server...");
    let service = BirdingService::start(settings).await;
    spinner.finish_and_clear();

    match service {
        Ok(service) => {
            Output::success("All 3 agents ready");
            Ok(service)
        }
        Err(e) => {
            Output::error(&format!("Initialization failed: {}", e));
            Err(e)
        }
    }
}
