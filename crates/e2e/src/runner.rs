//! Scenario runner: precondition check, fixtures, steps, results

use serde::{Deserialize, Serialize};
use shopbot_common::MerchantData;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::factories::{FactoryRng, MerchantFactory};
use crate::fixtures::{ApiClientFixture, AuthFixture, FixtureScope};
use crate::health::health_check_api;
use crate::page::Page;
use crate::perf::{MetricSummary, PerformanceMonitor};
use crate::scenario::{Mode, Scenario, Vars};
use crate::server::{ServerConfig, ServerHandle};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub cleanup_failures: usize,
}

impl ScenarioResult {
    fn skipped(name: &str, reason: String) -> Self {
        Self {
            name: name.to_string(),
            outcome: Outcome::Skipped,
            duration_ms: 0,
            steps: Vec::new(),
            error: Some(reason),
            cleanup_failures: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub seed: Option<u64>,
    pub results: Vec<ScenarioResult>,
    pub performance: Vec<MetricSummary>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub harness: HarnessConfig,
    /// Launch the backend ourselves instead of using `harness.api_url`
    pub server: Option<ServerConfig>,
    pub scenarios_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Fixed factory seed for reproducible data
    pub seed: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            harness: HarnessConfig::default(),
            server: None,
            scenarios_dir: PathBuf::from("tests/scenarios"),
            output_dir: PathBuf::from("test-results"),
            seed: None,
        }
    }
}

/// Runs YAML scenarios against one browser page
pub struct ScenarioRunner {
    config: RunnerConfig,
    api: Arc<ApiClient>,
    server: Option<ServerHandle>,
    rng: FactoryRng,
    perf: PerformanceMonitor,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig) -> E2eResult<Self> {
        let api = Arc::new(ApiClient::new(config.harness.clone())?);
        let rng = match config.seed {
            Some(seed) => FactoryRng::seeded(seed),
            None => FactoryRng::from_entropy(),
        };
        Ok(Self {
            config,
            api,
            server: None,
            rng,
            perf: PerformanceMonitor::new(),
        })
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn perf(&self) -> &PerformanceMonitor {
        &self.perf
    }

    /// Launch the configured backend and point the API client at it.
    pub async fn start_server(&mut self) -> E2eResult<()> {
        let Some(server_config) = self.config.server.clone() else {
            return Ok(());
        };
        if self.server.is_some() {
            return Ok(());
        }

        let server = ServerHandle::spawn(server_config).await?;
        self.config.harness.api_url = server.base_url().to_string();
        self.api = Arc::new(ApiClient::new(self.config.harness.clone())?);
        self.server = Some(server);
        Ok(())
    }

    pub fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }
        Ok(())
    }

    /// Suite precondition: one health check, failing the whole run if the backend is down.
    pub async fn before_all(&mut self) -> E2eResult<()> {
        self.start_server().await?;
        let api = self.api.clone();
        self.perf
            .measure("health_check", health_check_api(&api))
            .await
    }

    pub async fn run_all(&mut self, page: Arc<dyn Page>) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(&self.config.scenarios_dir)?;
        self.run_scenarios(page, &scenarios).await
    }

    pub async fn run_tagged(&mut self, page: Arc<dyn Page>, tag: &str) -> E2eResult<SuiteResult> {
        let scenarios: Vec<Scenario> = Scenario::load_all(&self.config.scenarios_dir)?
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect();
        self.run_scenarios(page, &scenarios).await
    }

    pub async fn run_named(&mut self, page: Arc<dyn Page>, name: &str) -> E2eResult<SuiteResult> {
        let scenario = Scenario::load_all(&self.config.scenarios_dir)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioParse(format!("Scenario not found: {}", name)))?;
        self.run_scenarios(page, &[scenario]).await
    }

    /// Health check once, then every scenario in order.
    ///
    /// Inside a serial group the first failure skips the group's remaining scenarios.
    pub async fn run_scenarios(
        &mut self,
        page: Arc<dyn Page>,
        scenarios: &[Scenario],
    ) -> E2eResult<SuiteResult> {
        let start = Instant::now();
        self.before_all().await?;

        info!("Running {} scenario(s)...", scenarios.len());

        let mut failed_groups: HashSet<String> = HashSet::new();
        let mut results = Vec::with_capacity(scenarios.len());

        for scenario in scenarios {
            let blocked = scenario
                .group
                .as_ref()
                .filter(|g| scenario.mode == Mode::Serial && failed_groups.contains(*g));
            if let Some(group) = blocked {
                info!("- {} (skipped: earlier failure in {})", scenario.name, group);
                results.push(ScenarioResult::skipped(
                    &scenario.name,
                    format!("earlier failure in serial group {}", group),
                ));
                continue;
            }

            let result = self.run_scenario(page.clone(), scenario).await;
            match result.outcome {
                Outcome::Passed => info!("✓ {} ({} ms)", result.name, result.duration_ms),
                _ => {
                    error!(
                        "✗ {} - {}",
                        result.name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                    if scenario.mode == Mode::Serial {
                        if let Some(group) = &scenario.group {
                            failed_groups.insert(group.clone());
                        }
                    }
                }
            }
            results.push(result);
        }

        let count = |o: Outcome| results.iter().filter(|r| r.outcome == o).count();
        let suite = SuiteResult {
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            skipped: count(Outcome::Skipped),
            duration_ms: start.elapsed().as_millis() as u64,
            seed: self.rng.seed(),
            performance: self.perf.report(),
            results,
        };

        info!(
            "Scenario results: {} passed, {} failed, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.duration_ms
        );
        Ok(suite)
    }

    /// Run one scenario; failures are captured in the result, not returned.
    pub async fn run_scenario(&mut self, page: Arc<dyn Page>, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        // Built up front so the rng is not borrowed across awaits
        let merchant = scenario.fixtures.merchant.as_ref().map(|spec| {
            let mut factory = MerchantFactory::new();
            if let Some(status) = spec.status {
                factory = factory.with_status(status);
            }
            if let Some(platform) = spec.platform {
                factory = factory.with_platform(platform);
            }
            (factory.build(&mut self.rng), spec.seed)
        });

        let scope = FixtureScope::new();
        let mut steps = Vec::new();
        let outcome = self
            .execute(&scope, page.clone(), scenario, merchant, &mut steps)
            .await;
        let cleanup = scope.teardown().await;

        if let Err(e) = page.clear_storage().await {
            warn!("Could not clear browser storage after {}: {}", scenario.name, e);
        }

        let duration = start.elapsed();
        self.perf.record(&format!("scenario.{}", scenario.name), duration);

        ScenarioResult {
            name: scenario.name.clone(),
            outcome: if outcome.is_ok() { Outcome::Passed } else { Outcome::Failed },
            duration_ms: duration.as_millis() as u64,
            steps,
            error: outcome.err().map(|e| e.to_string()),
            cleanup_failures: cleanup.failure_count(),
        }
    }

    async fn execute(
        &self,
        scope: &FixtureScope,
        page: Arc<dyn Page>,
        scenario: &Scenario,
        merchant: Option<(MerchantData, bool)>,
        steps: &mut Vec<StepResult>,
    ) -> E2eResult<()> {
        let mut vars = Vars::new();
        vars.insert("frontend_url".to_string(), self.config.harness.frontend_url.clone());
        vars.insert("api_url".to_string(), self.config.harness.api_url.clone());

        if let Some((merchant, seed)) = merchant {
            let merchant = if seed {
                ApiClientFixture::new(self.api.clone()).seed(scope, merchant).await?
            } else {
                merchant
            };
            vars.insert("merchant_key".to_string(), merchant.merchant_key.clone());

            if scenario.fixtures.auth {
                // Storage is per-origin, so land on the app before writing it
                page.goto(&self.config.harness.frontend("/")).await?;
                let auth = AuthFixture::new(
                    scope,
                    page.clone(),
                    self.config.harness.frontend_url.clone(),
                    &merchant,
                );
                auth.mock_auth(&merchant.merchant_key).await?;
            }
        } else if scenario.fixtures.auth {
            return Err(E2eError::Setup(
                "auth fixture needs a merchant fixture".to_string(),
            ));
        }

        for step in &scenario.steps {
            let label = step.label();
            let step_start = Instant::now();
            let result = step.execute(page.as_ref(), &vars).await;
            steps.push(StepResult {
                step: label,
                success: result.is_ok(),
                duration_ms: step_start.elapsed().as_millis() as u64,
                error: result.as_ref().err().map(|e| e.to_string()),
            });
            result?;
        }
        Ok(())
    }

    /// Write `results.json` into the output directory.
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Drop for ScenarioRunner {
    fn drop(&mut self) {
        let _ = self.stop_server();
    }
}
