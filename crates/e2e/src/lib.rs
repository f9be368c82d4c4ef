//! Shopbot E2E Test Harness
//!
//! Factories, fixtures, selectors and assertions for exercising the Shopbot
//! merchant dashboard and chat widget from Rust:
//! - Builds realistic merchants, conversations, webhooks and themes
//! - Seeds and cleans up backend test data through the REST API
//! - Drives a browser through a persistent Playwright bridge
//! - Runs declarative YAML scenarios behind a fail-fast health check
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ScenarioRunner / test bodies                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  before_all: health_check(/health) ── fails the whole suite │
//! │  FixtureScope                                               │
//! │    ├── MerchantFixture / ApiClientFixture (seed + delete)   │
//! │    ├── AuthFixture (localStorage + session cookie)          │
//! │    └── ThemeFixture (MockBackend route)                     │
//! │  steps ── selectors::lookup("@Group.name") ── assertions    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page trait          ApiClient             MockBackend      │
//! │  PlaywrightBridge    reqwest, CSRF, HMAC   axum, loopback   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  factories (FactoryRng)        shopbot-common value types   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assertions;
pub mod config;
pub mod error;
pub mod factories;
pub mod fixtures;
pub mod health;
pub mod mock;
pub mod page;
pub mod perf;
pub mod runner;
pub mod scenario;
pub mod selectors;
pub mod server;

pub use api::{ApiClient, ApiResponse, ConversationQuery};
pub use config::HarnessConfig;
pub use error::{CleanupError, E2eError, E2eResult};
pub use factories::FactoryRng;
pub use fixtures::{ApiClientFixture, AuthFixture, FixtureScope, MerchantFixture, ThemeFixture};
pub use health::{create_session_or_throw, health_check, safe_cleanup, CleanupLog};
pub use mock::{MockBackend, MockResponse};
pub use page::{Page, PlaywrightBridge, WaitState};
pub use perf::PerformanceMonitor;
pub use runner::{RunnerConfig, ScenarioRunner, SuiteResult};
pub use scenario::{Scenario, ScenarioStep};

/// Install the `tracing` subscriber used by harness binaries and tests.
///
/// Honours `RUST_LOG`; `json` switches to one JSON object per line for CI.
pub fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "shopbot_e2e=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
