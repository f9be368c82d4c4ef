//! Backend process management for suites that own the system under test

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Handle to a running backend process
pub struct ServerHandle {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl ServerHandle {
    /// Launch the backend and wait until `/health` answers 200
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning {} on port {}", config.command, port);

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .env(&config.port_env, port.to_string())
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!("Failed to spawn {}: {}", config.command, e))
        })?;

        let mut handle = ServerHandle {
            child,
            base_url: base_url.clone(),
            port,
        };

        handle.wait_for_healthy(config.startup_timeout).await?;

        info!("Backend is healthy at {}", base_url);
        Ok(handle)
    }

    async fn wait_for_healthy(&mut self, timeout_duration: Duration) -> E2eResult<()> {
        let health_url = format!("{}/health", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(E2eError::ServerStartup(format!(
                    "backend exited during startup ({})",
                    status
                )));
            }

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().as_u16() == 200 => return Ok(()),
                Ok(resp) => warn!("Health check returned {}", resp.status()),
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for backend to start...");
                    }
                    // Connection refused while the process binds
                    if !e.is_connect() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(200)).await;
        }

        Err(E2eError::ServerHealthCheck(attempts))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// SIGTERM, short grace period, then kill.
    pub fn stop(&mut self) -> E2eResult<()> {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(());
        }
        info!("Stopping backend (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// How to launch the backend
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Executable, e.g. `uvicorn` or `python`
    pub command: String,

    pub args: Vec<String>,

    /// Extra environment, e.g. `DATABASE_URL`
    pub env: Vec<(String, String)>,

    pub working_dir: Option<PathBuf>,

    /// Variable the chosen port is passed in
    pub port_env: String,

    /// None picks a free port
    pub port: Option<u16>,

    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "python".to_string(),
            args: vec!["-m".to_string(), "app.main".to_string()],
            env: vec![("IS_TESTING".to_string(), "true".to_string())],
            working_dir: Some(PathBuf::from("backend")),
            port_env: "PORT".to_string(),
            port: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

fn find_free_port() -> E2eResult<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port = find_free_port().unwrap();
        assert!(port > 1024);
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_fails() {
        let config = ServerConfig {
            command: "definitely-not-a-shopbot-binary".to_string(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
            startup_timeout: Duration::from_millis(200),
            ..ServerConfig::default()
        };
        assert!(matches!(
            ServerHandle::spawn(config).await,
            Err(E2eError::ServerStartup(_))
        ));
    }
}
