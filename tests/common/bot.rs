//! Test bot management.
//!
//! Spawns the gatebot binary, feeds it console events on stdin and collects
//! the actions it writes to stdout.

use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Base configuration every test bot starts from.
const BASE_CONFIG: &str = r#"
[bot]
name = "testbot"
bot_user_id = 100
metrics_port = 0

[logging]
level = "warn"

[permissions]
bot_admins = [7]
official_guilds = [1]
"#;

/// How long one run may take before the test fails.
const RUN_TIMEOUT: Duration = Duration::from_secs(20);

/// Output of one bot run.
pub struct RunOutput {
    pub success: bool,
    pub actions: Vec<Value>,
    pub stderr: String,
}

impl RunOutput {
    /// `send` actions, in the order they were written.
    pub fn sends(&self) -> Vec<&Value> {
        self.actions
            .iter()
            .filter(|a| a["action"] == "send")
            .collect()
    }
}

/// A bot configuration in a temporary directory.
pub struct TestBot {
    _dir: TempDir,
    config_path: PathBuf,
}

impl TestBot {
    /// Bot with the base configuration.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config("")
    }

    /// Bot with `extra` TOML appended to the base configuration.
    pub fn with_config(extra: &str) -> anyhow::Result<Self> {
        Self::from_toml(&format!("{BASE_CONFIG}\n{extra}"))
    }

    /// Bot with exactly `toml` as its configuration.
    pub fn from_toml(toml: &str) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, toml)?;
        Ok(Self {
            _dir: dir,
            config_path,
        })
    }

    /// Run the binary over `events` until it exits at end of input.
    pub async fn run(&self, events: &[Value]) -> anyhow::Result<RunOutput> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_gatebot"))
            .arg(&self.config_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("stdin not captured"))?;
        for event in events {
            stdin.write_all(event.to_string().as_bytes()).await?;
            stdin.write_all(b"\n").await?;
        }
        stdin.flush().await?;
        drop(stdin);

        let output = tokio::time::timeout(RUN_TIMEOUT, child.wait_with_output()).await??;
        let actions = String::from_utf8(output.stdout)?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<Value>, _>>()?;

        Ok(RunOutput {
            success: output.status.success(),
            actions,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
