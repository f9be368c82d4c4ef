//! Declarative YAML scenarios
//!
//! ```yaml
//! name: checklist-progress
//! tags: [onboarding, smoke]
//! group: onboarding
//! mode: serial
//! fixtures:
//!   merchant: { status: pending }
//!   auth: true
//! steps:
//!   - action: navigate
//!     url: /onboarding
//!   - action: click
//!     selector: "@PrerequisiteChecklist.cloud_account"
//!   - action: assert_progress
//!     selector: "@PrerequisiteChecklist.progress"
//!     done: 1
//!     total: 4
//! ```
//!
//! Selector fields take raw CSS or an `@Group.name` registry reference.
//! String values may use `{{merchant_key}}` and other runner variables.

use serde::{Deserialize, Serialize};
use shopbot_common::{DeploymentStatus, Platform};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::assertions;
use crate::error::{E2eError, E2eResult};
use crate::page::{Page, WaitState};
use crate::selectors;

/// Failure policy within a scenario group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// A failure skips the rest of the group
    Serial,
    #[default]
    Parallel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MerchantFixtureSpec {
    #[serde(default)]
    pub status: Option<DeploymentStatus>,
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Create the merchant through the backend test-data endpoint
    #[serde(default)]
    pub seed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioFixtures {
    #[serde(default)]
    pub merchant: Option<MerchantFixtureSpec>,
    /// Write a mocked login for the merchant before the first step
    #[serde(default)]
    pub auth: bool,
}

/// A scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Scenarios sharing a group form one serial block
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub fixtures: ScenarioFixtures,

    pub steps: Vec<ScenarioStep>,
}

/// One step of a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    Navigate {
        url: String,
        #[serde(default)]
        wait_for: Option<String>,
    },

    Click {
        selector: String,
    },

    Fill {
        selector: String,
        value: String,
    },

    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    AssertVisible {
        selector: String,
    },

    AssertHidden {
        selector: String,
    },

    /// Exact `text` or substring `contains`
    AssertText {
        selector: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        contains: Option<String>,
    },

    AssertCheckbox {
        selector: String,
        checked: bool,
    },

    AssertAria {
        selector: String,
        attribute: String,
        value: String,
    },

    AssertProgress {
        selector: String,
        done: usize,
        total: usize,
    },

    AssertCount {
        selector: String,
        count: usize,
    },

    /// `value: null` asserts the key is absent
    AssertStorage {
        key: String,
        #[serde(default)]
        value: Option<String>,
    },

    SetStorage {
        key: String,
        value: String,
    },

    ClearStorage,

    /// Fixed pause; prefer `wait`
    Sleep {
        ms: u64,
    },

    Log {
        message: String,
    },
}

fn default_wait_timeout() -> u64 {
    5000
}

/// Runner variables substituted into `{{name}}` placeholders
pub type Vars = BTreeMap<String, String>;

pub fn render(template: &str, vars: &Vars) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{{{}}}}}", name), value);
    }
    out
}

/// Raw CSS passes through; `@Group.name` goes through the registry.
pub fn resolve_selector(selector: &str) -> E2eResult<String> {
    match selector.strip_prefix('@') {
        Some(reference) => selectors::lookup(reference)
            .map(str::to_string)
            .ok_or_else(|| E2eError::UnknownSelector(selector.to_string())),
        None => Ok(selector.to_string()),
    }
}

impl ScenarioStep {
    /// Short label for logs and results
    pub fn label(&self) -> String {
        match self {
            ScenarioStep::Navigate { url, .. } => format!("navigate {}", url),
            ScenarioStep::Click { selector } => format!("click {}", selector),
            ScenarioStep::Fill { selector, .. } => format!("fill {}", selector),
            ScenarioStep::Wait { selector, state, .. } => {
                format!("wait {} {}", selector, state.as_str())
            }
            ScenarioStep::AssertVisible { selector } => format!("assert_visible {}", selector),
            ScenarioStep::AssertHidden { selector } => format!("assert_hidden {}", selector),
            ScenarioStep::AssertText { selector, .. } => format!("assert_text {}", selector),
            ScenarioStep::AssertCheckbox { selector, .. } => format!("assert_checkbox {}", selector),
            ScenarioStep::AssertAria { selector, attribute, .. } => {
                format!("assert_aria {} {}", selector, attribute)
            }
            ScenarioStep::AssertProgress { selector, done, total } => {
                format!("assert_progress {} {}/{}", selector, done, total)
            }
            ScenarioStep::AssertCount { selector, count } => {
                format!("assert_count {} = {}", selector, count)
            }
            ScenarioStep::AssertStorage { key, .. } => format!("assert_storage {}", key),
            ScenarioStep::SetStorage { key, .. } => format!("set_storage {}", key),
            ScenarioStep::ClearStorage => "clear_storage".to_string(),
            ScenarioStep::Sleep { ms } => format!("sleep {}ms", ms),
            ScenarioStep::Log { .. } => "log".to_string(),
        }
    }

    pub fn selectors(&self) -> Vec<&str> {
        match self {
            ScenarioStep::Navigate { wait_for, .. } => wait_for.iter().map(String::as_str).collect(),
            ScenarioStep::Click { selector }
            | ScenarioStep::Fill { selector, .. }
            | ScenarioStep::Wait { selector, .. }
            | ScenarioStep::AssertVisible { selector }
            | ScenarioStep::AssertHidden { selector }
            | ScenarioStep::AssertText { selector, .. }
            | ScenarioStep::AssertCheckbox { selector, .. }
            | ScenarioStep::AssertAria { selector, .. }
            | ScenarioStep::AssertProgress { selector, .. }
            | ScenarioStep::AssertCount { selector, .. } => vec![selector.as_str()],
            ScenarioStep::AssertStorage { .. }
            | ScenarioStep::SetStorage { .. }
            | ScenarioStep::ClearStorage
            | ScenarioStep::Sleep { .. }
            | ScenarioStep::Log { .. } => Vec::new(),
        }
    }

    pub async fn execute(&self, page: &dyn Page, vars: &Vars) -> E2eResult<()> {
        match self {
            ScenarioStep::Navigate { url, wait_for } => {
                page.goto(&render(url, vars)).await?;
                if let Some(selector) = wait_for {
                    assertions::assert_visible(page, &resolve_selector(selector)?).await?;
                }
            }
            ScenarioStep::Click { selector } => page.click(&resolve_selector(selector)?).await?,
            ScenarioStep::Fill { selector, value } => {
                page.fill(&resolve_selector(selector)?, &render(value, vars))
                    .await?
            }
            ScenarioStep::Wait {
                selector,
                timeout_ms,
                state,
            } => {
                page.wait_for(
                    &resolve_selector(selector)?,
                    *state,
                    Duration::from_millis(*timeout_ms),
                )
                .await?
            }
            ScenarioStep::AssertVisible { selector } => {
                assertions::assert_visible(page, &resolve_selector(selector)?).await?
            }
            ScenarioStep::AssertHidden { selector } => {
                assertions::assert_hidden(page, &resolve_selector(selector)?).await?
            }
            ScenarioStep::AssertText {
                selector,
                text,
                contains,
            } => {
                let selector = resolve_selector(selector)?;
                match (text, contains) {
                    (Some(text), _) => {
                        assertions::assert_text(page, &selector, &render(text, vars)).await?
                    }
                    (None, Some(needle)) => {
                        assertions::assert_text_contains(page, &selector, &render(needle, vars))
                            .await?
                    }
                    (None, None) => {
                        return Err(E2eError::ScenarioParse(
                            "assert_text needs `text` or `contains`".to_string(),
                        ))
                    }
                }
            }
            ScenarioStep::AssertCheckbox { selector, checked } => {
                assertions::assert_checkbox_state(page, &resolve_selector(selector)?, *checked)
                    .await?
            }
            ScenarioStep::AssertAria {
                selector,
                attribute,
                value,
            } => {
                assertions::assert_aria_attribute(page, &resolve_selector(selector)?, attribute, value)
                    .await?
            }
            ScenarioStep::AssertProgress {
                selector,
                done,
                total,
            } => {
                assertions::assert_progress_count(page, &resolve_selector(selector)?, *done, *total)
                    .await?
            }
            ScenarioStep::AssertCount { selector, count } => {
                assertions::assert_count(page, &resolve_selector(selector)?, *count).await?
            }
            ScenarioStep::AssertStorage { key, value } => {
                let expected = value.as_ref().map(|v| render(v, vars));
                assertions::assert_local_storage(page, key, expected.as_deref()).await?
            }
            ScenarioStep::SetStorage { key, value } => {
                page.local_storage_set(key, &render(value, vars)).await?
            }
            ScenarioStep::ClearStorage => page.clear_storage().await?,
            ScenarioStep::Sleep { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            ScenarioStep::Log { message } => info!("[scenario] {}", render(message, vars)),
        }
        Ok(())
    }
}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Every `@` reference resolves and the scenario has steps.
    pub fn validate(&self) -> E2eResult<()> {
        if self.steps.is_empty() {
            return Err(E2eError::ScenarioParse(format!("{} has no steps", self.name)));
        }
        for step in &self.steps {
            for selector in step.selectors() {
                resolve_selector(selector)?;
            }
        }
        Ok(())
    }

    /// Load every `.yaml`/`.yml` under `dir`, sorted by path.
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios
            .iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKLIST: &str = r#"
name: checklist-progress
description: Ticking prerequisites updates the progress counter
tags: [onboarding, smoke]
group: onboarding
mode: serial
fixtures:
  merchant:
    status: pending
  auth: true
steps:
  - action: navigate
    url: /onboarding?merchant={{merchant_key}}
    wait_for: "@PrerequisiteChecklist.container"
  - action: click
    selector: "@PrerequisiteChecklist.cloud_account"
  - action: assert_progress
    selector: "@PrerequisiteChecklist.progress"
    done: 1
    total: 4
  - action: assert_storage
    key: auth_token
  - action: clear_storage
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_yaml(CHECKLIST).unwrap();
        assert_eq!(scenario.name, "checklist-progress");
        assert_eq!(scenario.mode, Mode::Serial);
        assert_eq!(scenario.steps.len(), 5);
        assert!(scenario.fixtures.auth);
        assert_eq!(
            scenario.fixtures.merchant.as_ref().and_then(|m| m.status),
            Some(DeploymentStatus::Pending)
        );
        assert!(matches!(
            scenario.steps[4],
            ScenarioStep::ClearStorage
        ));
    }

    #[test]
    fn test_unknown_selector_rejected_at_parse() {
        let yaml = r#"
name: broken
steps:
  - action: click
    selector: "@DeploymentWizard.launch_rockets"
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(E2eError::UnknownSelector(s)) if s == "@DeploymentWizard.launch_rockets"
        ));
    }

    #[test]
    fn test_resolve_selector() {
        assert_eq!(resolve_selector("#raw").unwrap(), "#raw");
        assert_eq!(
            resolve_selector("@Widget.launcher").unwrap(),
            selectors::widget::LAUNCHER
        );
    }

    #[test]
    fn test_render_vars() {
        let mut vars = Vars::new();
        vars.insert("merchant_key".to_string(), "m-1".to_string());
        assert_eq!(render("/x?m={{merchant_key}}&y={{other}}", &vars), "/x?m=m-1&y={{other}}");
    }

    #[test]
    fn test_filter_by_tag() {
        let scenario = Scenario::from_yaml(CHECKLIST).unwrap();
        let all = vec![scenario];
        assert_eq!(Scenario::filter_by_tag(&all, "smoke").len(), 1);
        assert!(Scenario::filter_by_tag(&all, "billing").is_empty());
    }

    #[test]
    fn test_bundled_scenarios_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scenarios");
        let scenarios = Scenario::load_all(&dir).unwrap();
        assert_eq!(scenarios.len(), 3);
        assert_eq!(Scenario::filter_by_tag(&scenarios, "smoke").len(), 2);
        assert!(scenarios
            .iter()
            .any(|s| s.fixtures.merchant.as_ref().map(|m| m.seed).unwrap_or(false)));
    }
}
