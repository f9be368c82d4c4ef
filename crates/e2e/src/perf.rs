//! Timing capture for page loads and API calls

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::{E2eError, E2eResult};
use crate::page::Page;

/// Navigation Timing Level 2 fields, milliseconds from navigation start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTiming {
    pub dom_content_loaded: f64,
    pub load_complete: f64,
    pub first_byte: f64,
    pub dom_interactive: f64,
}

const NAVIGATION_TIMING_JS: &str = r#"(() => {
  const nav = performance.getEntriesByType('navigation')[0];
  if (!nav) return null;
  return {
    domContentLoaded: nav.domContentLoadedEventEnd,
    loadComplete: nav.loadEventEnd,
    firstByte: nav.responseStart,
    domInteractive: nav.domInteractive,
  };
})()"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub count: usize,
    pub min_ms: u64,
    pub max_ms: u64,
    pub p95_ms: u64,
}

/// Records named durations over a test run
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    samples: Mutex<BTreeMap<String, Vec<Duration>>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str, duration: Duration) {
        self.samples
            .lock()
            .entry(name.to_string())
            .or_default()
            .push(duration);
    }

    /// Await `fut` and record how long it took.
    pub async fn measure<F, T>(&self, name: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let start = Instant::now();
        let out = fut.await;
        let elapsed = start.elapsed();
        self.record(name, elapsed);
        info!("{} took {}ms", name, elapsed.as_millis());
        out
    }

    /// Read the page's navigation entry and record its phases as
    /// `navigation.first_byte`, `navigation.dom_content_loaded` and so on.
    pub async fn capture_navigation_timing(&self, page: &dyn Page) -> E2eResult<NavigationTiming> {
        let value = page.evaluate(NAVIGATION_TIMING_JS).await?;
        if value.is_null() {
            return Err(E2eError::StepFailed {
                step: "capture_navigation_timing".to_string(),
                reason: "no navigation entry; has the page loaded?".to_string(),
            });
        }
        let timing: NavigationTiming = serde_json::from_value(value)?;
        for (name, ms) in [
            ("navigation.first_byte", timing.first_byte),
            ("navigation.dom_interactive", timing.dom_interactive),
            ("navigation.dom_content_loaded", timing.dom_content_loaded),
            ("navigation.load_complete", timing.load_complete),
        ] {
            self.record(name, Duration::from_micros((ms.max(0.0) * 1000.0) as u64));
        }
        Ok(timing)
    }

    /// Every sample recorded under `name` is within `threshold`.
    pub fn assert_under(&self, name: &str, threshold: Duration) -> E2eResult<()> {
        let samples = self.samples.lock();
        let worst = samples
            .get(name)
            .and_then(|s| s.iter().max().copied())
            .ok_or_else(|| E2eError::assertion(format!("samples for {}", name), "at least one", 0))?;
        if worst <= threshold {
            Ok(())
        } else {
            Err(E2eError::ThresholdExceeded {
                name: name.to_string(),
                actual_ms: worst.as_millis() as u64,
                threshold_ms: threshold.as_millis() as u64,
            })
        }
    }

    pub fn report(&self) -> Vec<MetricSummary> {
        self.samples
            .lock()
            .iter()
            .filter(|(_, s)| !s.is_empty())
            .map(|(name, samples)| {
                let mut sorted: Vec<u64> = samples.iter().map(|d| d.as_millis() as u64).collect();
                sorted.sort_unstable();
                // nearest-rank p95
                let rank = ((sorted.len() as f64) * 0.95).ceil() as usize;
                MetricSummary {
                    name: name.clone(),
                    count: sorted.len(),
                    min_ms: sorted[0],
                    max_ms: sorted[sorted.len() - 1],
                    p95_ms: sorted[rank.clamp(1, sorted.len()) - 1],
                }
            })
            .collect()
    }

    pub fn log_report(&self) {
        for m in self.report() {
            info!(
                "{}: n={} min={}ms p95={}ms max={}ms",
                m.name, m.count, m.min_ms, m.p95_ms, m.max_ms
            );
        }
    }
}
