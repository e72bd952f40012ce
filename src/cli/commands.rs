//! CLI command implementations

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tracing::info;

use crate::config::AppConfig;
use crate::executor::QueryExecutor;
use crate::filter::{Filter, RawParams};
use crate::http_server::HttpServer;
use crate::model::Recipe;
use crate::planner::{ExplainPlan, QueryPlanner};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Dispatch a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Explain { config } => explain(&config),
        Command::Import { config, file } => import(&config, &file),
    }
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

fn open_executor(config: &AppConfig) -> CliResult<QueryExecutor> {
    let store = config.build_store()?;
    info!(
        backend = store.backend_name(),
        result_cap = config.query.result_cap,
        "store opened"
    );
    Ok(QueryExecutor::new(store, config.planner()))
}

/// Boot the store and serve HTTP until the process is stopped
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = AppConfig::load(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    let executor = open_executor(&config)?;
    let server = HttpServer::new(config.server.clone(), executor);

    runtime()?.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Compile one filter object from stdin without touching the store
pub fn explain(config_path: &Path) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    let request = read_request()?;

    match explain_request(&config.planner(), request) {
        Ok(plan) => write_response(serde_json::to_value(plan)?),
        Err(err) => write_error(err.code(), &err.to_string()),
    }
}

/// Validate and plan a JSON filter; planning rejections become a
/// non-accepted plan, validation failures an error
pub fn explain_request(
    planner: &QueryPlanner,
    request: Value,
) -> Result<ExplainPlan, crate::filter::ValidationError> {
    let params = RawParams::from_json(request)?;
    let filter = Filter::parse(&params)?;
    Ok(match planner.plan(&filter) {
        Ok(plan) => ExplainPlan::from_plan(&plan),
        Err(err) => ExplainPlan::from_error(&err),
    })
}

/// Upsert every recipe in a JSON array file
pub fn import(config_path: &Path, file: &Path) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    let recipes = read_recipes(file)?;
    let executor = open_executor(&config)?;

    let (created, replaced) = runtime()?.block_on(import_recipes(&executor, &recipes))?;
    info!(created, replaced, "import finished");
    write_response(json!({"created": created, "replaced": replaced}))
}

fn read_recipes(file: &Path) -> CliResult<Vec<Recipe>> {
    let content = fs::read_to_string(file)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", file.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

/// Returns (created, replaced)
pub async fn import_recipes(
    executor: &QueryExecutor,
    recipes: &[Recipe],
) -> CliResult<(usize, usize)> {
    let mut created = 0;
    let mut replaced = 0;
    for recipe in recipes {
        if executor.upsert_recipe(recipe).await?.created() {
            created += 1;
        } else {
            replaced += 1;
        }
    }
    Ok((created, replaced))
}
