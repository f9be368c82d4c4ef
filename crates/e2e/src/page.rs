//! Browser seam: the `Page` trait and its Playwright-backed implementation
//!
//! Assertions, fixtures and scenarios only talk to [`Page`]. The production
//! implementation is [`PlaywrightBridge`], which keeps one Node process with
//! one browser context alive for the whole test so localStorage and cookies
//! survive between calls.
//!
//! # Bridge protocol
//!
//! ```text
//! rust -> node   {"id":7,"cmd":"textContent","args":{"selector":"#x","timeout":5000}}\n
//! node -> rust   {"id":7,"ok":true,"value":"2 of 4 complete"}\n
//! node -> rust   {"id":7,"ok":false,"error":"Timeout 5000ms exceeded"}\n
//! ```
//!
//! Id 0 is reserved for the driver's ready line.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command as TokioCommand};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Element state to wait for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Cookie as Playwright's `context.addCookies` expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub url: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

/// Operations the harness needs from a browser page
#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;
    async fn click(&self, selector: &str) -> E2eResult<()>;
    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()>;
    async fn wait_for(&self, selector: &str, state: WaitState, timeout: Duration) -> E2eResult<()>;
    async fn text_content(&self, selector: &str) -> E2eResult<Option<String>>;
    async fn get_attribute(&self, selector: &str, name: &str) -> E2eResult<Option<String>>;
    async fn is_checked(&self, selector: &str) -> E2eResult<bool>;
    async fn count(&self, selector: &str) -> E2eResult<usize>;
    async fn evaluate(&self, expression: &str) -> E2eResult<Value>;
    async fn local_storage_get(&self, key: &str) -> E2eResult<Option<String>>;
    async fn local_storage_set(&self, key: &str, value: &str) -> E2eResult<()>;
    /// Clear localStorage, sessionStorage and cookies.
    async fn clear_storage(&self) -> E2eResult<()>;
    async fn add_cookie(&self, cookie: &Cookie) -> E2eResult<()>;
    async fn url(&self) -> E2eResult<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!("unknown browser: {}", other))),
        }
    }
}

/// Configuration for the Playwright bridge
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Directory whose `node_modules` contains `playwright`
    pub node_project_dir: PathBuf,
    /// Per-command timeout handed to Playwright
    pub default_timeout: Duration,
    pub launch_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_project_dir: PathBuf::from("frontend"),
            default_timeout: Duration::from_secs(10),
            launch_timeout: Duration::from_secs(40),
        }
    }
}

const DRIVER_SCRIPT: &str = r#"
const { chromium, firefox, webkit } = require('playwright');
const readline = require('readline');

const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {
  const launcher = { chromium, firefox, webkit }[process.env.BRIDGE_BROWSER || 'chromium'];
  const browser = await launcher.launch({ headless: process.env.BRIDGE_HEADLESS !== '0' });
  const context = await browser.newContext({
    baseURL: process.env.BRIDGE_BASE_URL,
    viewport: {
      width: Number(process.env.BRIDGE_VIEWPORT_WIDTH || 1280),
      height: Number(process.env.BRIDGE_VIEWPORT_HEIGHT || 720),
    },
  });
  const page = await context.newPage();

  const handlers = {
    goto: (a) => page.goto(a.url, { timeout: a.timeout }).then(() => null),
    click: (a) => page.click(a.selector, { timeout: a.timeout }).then(() => null),
    fill: (a) => page.fill(a.selector, a.value, { timeout: a.timeout }).then(() => null),
    waitFor: (a) => page.waitForSelector(a.selector, { state: a.state, timeout: a.timeout }).then(() => null),
    textContent: (a) => page.textContent(a.selector, { timeout: a.timeout }),
    getAttribute: (a) => page.getAttribute(a.selector, a.name, { timeout: a.timeout }),
    isChecked: (a) => page.isChecked(a.selector, { timeout: a.timeout }),
    count: (a) => page.locator(a.selector).count(),
    evaluate: (a) => page.evaluate(a.expression),
    storageGet: (a) => page.evaluate((k) => window.localStorage.getItem(k), a.key),
    storageSet: (a) => page.evaluate(([k, v]) => window.localStorage.setItem(k, v), [a.key, a.value]).then(() => null),
    storageClear: async () => {
      await page.evaluate(() => { window.localStorage.clear(); window.sessionStorage.clear(); });
      await context.clearCookies();
      return null;
    },
    addCookie: (a) => context.addCookies([a.cookie]).then(() => null),
    url: async () => page.url(),
  };

  const rl = readline.createInterface({ input: process.stdin });
  rl.on('line', async (line) => {
    let req;
    try { req = JSON.parse(line); } catch (e) { return; }
    if (req.cmd === 'close') {
      await browser.close();
      reply({ id: req.id, ok: true, value: null });
      process.exit(0);
    }
    try {
      const handler = handlers[req.cmd];
      if (!handler) throw new Error('unknown command ' + req.cmd);
      const value = await handler(req.args || {});
      reply({ id: req.id, ok: true, value: value === undefined ? null : value });
    } catch (e) {
      reply({ id: req.id, ok: false, error: String((e && e.message) || e) });
    }
  });
  rl.on('close', async () => { await browser.close(); process.exit(0); });

  reply({ id: 0, ok: true, value: 'ready' });
})().catch((e) => { console.error(e); process.exit(1); });
"#;

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    cmd: &'a str,
    args: Value,
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<BridgeReply>>>>;

/// Long-lived Node process driving one Playwright page
pub struct PlaywrightBridge {
    child: Child,
    stdin: tokio::sync::Mutex<ChildStdin>,
    pending: Pending,
    next_id: AtomicU64,
    default_timeout: Duration,
    reader: JoinHandle<()>,
    _script_dir: tempfile::TempDir,
}

impl PlaywrightBridge {
    /// Verify Playwright is installed in the node project; never downloads it.
    pub fn check_playwright_installed(project_dir: &Path) -> E2eResult<()> {
        if !project_dir.is_dir() {
            return Err(E2eError::PlaywrightNotFound);
        }
        let output = Command::new("npx")
            .args(["--no", "playwright", "--version"])
            .current_dir(project_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Start the driver and wait until the browser page is ready.
    pub async fn launch(config: BridgeConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config.node_project_dir)?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        info!(
            "Launching {} via Playwright bridge (base URL {})",
            config.browser.as_str(),
            config.base_url
        );

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&config.node_project_dir)
            .env("NODE_PATH", config.node_project_dir.join("node_modules"))
            .env("BRIDGE_BROWSER", config.browser.as_str())
            .env("BRIDGE_HEADLESS", if config.headless { "1" } else { "0" })
            .env("BRIDGE_BASE_URL", &config.base_url)
            .env("BRIDGE_VIEWPORT_WIDTH", config.viewport_width.to_string())
            .env("BRIDGE_VIEWPORT_HEIGHT", config.viewport_height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Playwright(format!("failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdout unavailable".to_string()))?;

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (ready_tx, ready_rx) = oneshot::channel();
        pending.lock().insert(0, ready_tx);

        let reader_pending = pending.clone();
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match serde_json::from_str::<BridgeReply>(&line) {
                        Ok(reply) => {
                            if let Some(tx) = reader_pending.lock().remove(&reply.id) {
                                let _ = tx.send(reply);
                            }
                        }
                        Err(_) => debug!("[bridge] {}", line),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Bridge stdout read failed: {}", e);
                        break;
                    }
                }
            }
            // Dropping the senders fails every in-flight request
            reader_pending.lock().clear();
        });

        let bridge = Self {
            child,
            stdin: tokio::sync::Mutex::new(stdin),
            pending,
            next_id: AtomicU64::new(1),
            default_timeout: config.default_timeout,
            reader,
            _script_dir: script_dir,
        };

        match tokio::time::timeout(config.launch_timeout, ready_rx).await {
            Ok(Ok(reply)) if reply.ok => Ok(bridge),
            Ok(Ok(reply)) => Err(E2eError::Playwright(
                reply.error.unwrap_or_else(|| "bridge failed to start".to_string()),
            )),
            Ok(Err(_)) => Err(E2eError::Playwright("bridge exited during launch".to_string())),
            Err(_) => Err(E2eError::Timeout("Playwright bridge launch".to_string())),
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.default_timeout.as_millis() as u64
    }

    /// Send one command and wait for its reply.
    pub async fn request(&self, cmd: &str, args: Value, timeout: Duration) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let mut line = serde_json::to_vec(&BridgeRequest { id, cmd, args })?;
        line.push(b'\n');
        {
            let mut stdin = self.stdin.lock().await;
            if let Err(e) = stdin.write_all(&line).await {
                self.pending.lock().remove(&id);
                return Err(E2eError::Playwright(format!("bridge write failed: {}", e)));
            }
            stdin.flush().await?;
        }

        // Playwright enforces `timeout` itself; the outer bound only catches a wedged driver
        let outer = timeout + Duration::from_secs(5);
        match tokio::time::timeout(outer, rx).await {
            Ok(Ok(reply)) if reply.ok => Ok(reply.value),
            Ok(Ok(reply)) => Err(E2eError::StepFailed {
                step: cmd.to_string(),
                reason: reply.error.unwrap_or_else(|| "unknown bridge error".to_string()),
            }),
            Ok(Err(_)) => Err(E2eError::Playwright("bridge exited".to_string())),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(E2eError::Timeout(format!("{} after {:?}", cmd, outer)))
            }
        }
    }

    async fn call(&self, cmd: &str, args: Value) -> E2eResult<Value> {
        self.request(cmd, args, self.default_timeout).await
    }

    /// Close the browser and wait for the driver to exit.
    pub async fn close(mut self) -> E2eResult<()> {
        let _ = self.call("close", json!({})).await;
        let _ = tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await;
        Ok(())
    }
}

impl Drop for PlaywrightBridge {
    fn drop(&mut self) {
        self.reader.abort();
        let _ = self.child.start_kill();
    }
}

fn string_or_none(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

#[async_trait]
impl Page for PlaywrightBridge {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.call("goto", json!({ "url": url, "timeout": self.timeout_ms() })).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        self.call("click", json!({ "selector": selector, "timeout": self.timeout_ms() }))
            .await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()> {
        self.call(
            "fill",
            json!({ "selector": selector, "value": value, "timeout": self.timeout_ms() }),
        )
        .await?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, state: WaitState, timeout: Duration) -> E2eResult<()> {
        self.request(
            "waitFor",
            json!({ "selector": selector, "state": state.as_str(), "timeout": timeout.as_millis() as u64 }),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn text_content(&self, selector: &str) -> E2eResult<Option<String>> {
        let value = self
            .call("textContent", json!({ "selector": selector, "timeout": self.timeout_ms() }))
            .await?;
        Ok(string_or_none(value))
    }

    async fn get_attribute(&self, selector: &str, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .call(
                "getAttribute",
                json!({ "selector": selector, "name": name, "timeout": self.timeout_ms() }),
            )
            .await?;
        Ok(string_or_none(value))
    }

    async fn is_checked(&self, selector: &str) -> E2eResult<bool> {
        let value = self
            .call("isChecked", json!({ "selector": selector, "timeout": self.timeout_ms() }))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        let value = self.call("count", json!({ "selector": selector })).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn evaluate(&self, expression: &str) -> E2eResult<Value> {
        self.call("evaluate", json!({ "expression": expression })).await
    }

    async fn local_storage_get(&self, key: &str) -> E2eResult<Option<String>> {
        let value = self.call("storageGet", json!({ "key": key })).await?;
        Ok(string_or_none(value))
    }

    async fn local_storage_set(&self, key: &str, value: &str) -> E2eResult<()> {
        self.call("storageSet", json!({ "key": key, "value": value })).await?;
        Ok(())
    }

    async fn clear_storage(&self) -> E2eResult<()> {
        self.call("storageClear", json!({})).await?;
        Ok(())
    }

    async fn add_cookie(&self, cookie: &Cookie) -> E2eResult<()> {
        self.call("addCookie", json!({ "cookie": cookie })).await?;
        Ok(())
    }

    async fn url(&self) -> E2eResult<String> {
        let value = self.call("url", json!({})).await?;
        string_or_none(value).ok_or_else(|| E2eError::Playwright("page url unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_wire_format() {
        let cookie = Cookie {
            name: "session_token".to_string(),
            value: "abc".to_string(),
            url: "http://localhost:5173".to_string(),
            http_only: true,
            secure: false,
            same_site: SameSite::Strict,
        };
        let json = serde_json::to_value(&cookie).unwrap();
        assert_eq!(json["httpOnly"], true);
        assert_eq!(json["sameSite"], "Strict");
    }

    #[test]
    fn test_browser_parse() {
        assert!(matches!("webkit".parse::<Browser>(), Ok(Browser::Webkit)));
        assert!("opera".parse::<Browser>().is_err());
    }

    #[test]
    fn test_bridge_reply_parse() {
        let reply: BridgeReply =
            serde_json::from_str(r#"{"id":3,"ok":false,"error":"Timeout 5000ms exceeded"}"#).unwrap();
        assert_eq!(reply.id, 3);
        assert!(!reply.ok);
        assert_eq!(reply.value, Value::Null);
    }

    #[test]
    fn test_driver_handles_every_page_command() {
        for cmd in [
            "goto", "click", "fill", "waitFor", "textContent", "getAttribute", "isChecked", "count",
            "evaluate", "storageGet", "storageSet", "storageClear", "addCookie", "url",
        ] {
            assert!(DRIVER_SCRIPT.contains(&format!("{}:", cmd)), "driver lacks {}", cmd);
        }
    }
}
