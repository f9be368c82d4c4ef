//! Scenario runner entry point
//!
//! Runs YAML scenarios through a Playwright bridge against a running (or
//! self-launched) Shopbot backend and frontend.
//! Run with: cargo test --package shopbot-e2e --test e2e -- --scenarios tests/scenarios

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use shopbot_e2e::page::{Browser, BridgeConfig};
use shopbot_e2e::runner::{RunnerConfig, ScenarioRunner};
use shopbot_e2e::server::ServerConfig;
use shopbot_e2e::{E2eError, HarnessConfig, Page, PlaywrightBridge};

#[derive(Parser, Debug)]
#[command(name = "shopbot-e2e")]
#[command(about = "Scenario runner for the Shopbot dashboard and widget")]
struct Args {
    /// Directory of scenario YAML files
    #[arg(short, long, default_value = "tests/scenarios")]
    scenarios: PathBuf,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run a single scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Backend base URL (overrides API_URL / API_BASE_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Frontend base URL (overrides BASE_URL / FRONTEND_URL)
    #[arg(long)]
    frontend_url: Option<String>,

    /// Launch the backend with this command instead of using a running one
    #[arg(long)]
    server_command: Option<String>,

    /// Arguments for --server-command
    #[arg(long, num_args = 0.., allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Fixed factory seed for reproducible data
    #[arg(long, env = "E2E_SEED")]
    seed: Option<u64>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Directory whose node_modules contains playwright
    #[arg(long, env = "PLAYWRIGHT_PROJECT_DIR", default_value = "frontend")]
    node_project: PathBuf,

    /// Default per-action timeout in milliseconds
    #[arg(long, default_value = "10000")]
    action_timeout_ms: u64,

    /// Output directory for results.json
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Fail instead of skipping when Playwright or the backend is unavailable
    #[arg(long, env = "E2E_REQUIRE")]
    require: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, env = "E2E_LOG_JSON")]
    log_json: bool,
}

fn main() {
    let args = Args::parse();
    shopbot_e2e::init_tracing(args.verbose, args.log_json);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    let mut harness = HarnessConfig::from_env();
    if let Some(url) = args.api_url {
        harness.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = args.frontend_url {
        harness.frontend_url = url.trim_end_matches('/').to_string();
    }

    let server = args.server_command.map(|command| ServerConfig {
        command,
        args: args.server_args,
        ..Default::default()
    });

    let bridge_config = BridgeConfig {
        base_url: harness.frontend_url.clone(),
        browser: args.browser.parse::<Browser>()?,
        headless: !args.headed,
        node_project_dir: args.node_project,
        default_timeout: Duration::from_millis(args.action_timeout_ms),
        launch_timeout: harness.navigation_timeout,
        ..Default::default()
    };

    let config = RunnerConfig {
        harness,
        server,
        scenarios_dir: args.scenarios,
        output_dir: args.output,
        seed: args.seed,
    };

    let mut runner = ScenarioRunner::new(config)?;
    let bridge = match PlaywrightBridge::launch(bridge_config).await {
        Err(E2eError::PlaywrightNotFound) if !args.require => {
            warn!("Playwright not installed; skipping scenarios (pass --require to fail)");
            return Ok(true);
        }
        other => other.context("launching Playwright bridge")?,
    };
    let page: Arc<dyn Page> = Arc::new(bridge);

    let outcome = if let Some(name) = args.name {
        runner.run_named(page.clone(), &name).await
    } else if let Some(tag) = args.tag {
        runner.run_tagged(page.clone(), &tag).await
    } else {
        runner.run_all(page.clone()).await
    };
    let results = match outcome {
        Err(E2eError::BackendUnavailable { url, reason }) if !args.require => {
            warn!("Backend at {} unavailable ({}); skipping scenarios", url, reason);
            return Ok(true);
        }
        other => other?,
    };

    runner.perf().log_report();
    runner.write_results(&results)?;

    Ok(results.success())
}
