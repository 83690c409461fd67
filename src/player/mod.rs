pub mod volume;

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;

/// Timeout for short-lived helper commands (wpctl)
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(3);

/// Run a command with timeout so a stuck audio server can't hang the UI
pub async fn run_command_with_timeout(cmd: &str, args: &[&str]) -> Result<std::process::Output> {
    let result = timeout(
        COMMAND_TIMEOUT,
        Command::new(cmd).args(args).kill_on_drop(true).output(),
    )
    .await;

    match result {
        Ok(output) => output.with_context(|| format!("Failed to run {}", cmd)),
        Err(_) => anyhow::bail!("{} timed out", cmd),
    }
}

/// Check that a program can be found on PATH
pub fn program_exists(program: &str) -> Result<()> {
    let path = std::env::var_os("PATH").unwrap_or_default();

    if std::env::split_paths(&path).any(|dir| is_executable(&dir.join(program))) {
        return Ok(());
    }

    anyhow::bail!("Couldn't find {}, is it installed?", program)
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Plays one stream at a time through an ffmpeg child process
#[derive(Debug)]
pub struct Player {
    program: String,
    sink: String,
    child: Option<Child>,
    now_playing: Option<String>,
}

impl Player {
    pub fn new(program: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            sink: sink.into(),
            child: None,
            now_playing: None,
        }
    }

    /// Arguments for decoding `address` into the configured sink
    pub fn args<'a>(&'a self, address: &'a str) -> [&'a str; 8] {
        ["-v", "quiet", "-i", address, "-vn", "-f", "pulse", &self.sink]
    }

    /// Start playing `address` under `name`, stopping whatever was playing
    pub async fn play(&mut self, name: &str, address: &str) -> Result<()> {
        self.stop().await?;

        let child = Command::new(&self.program)
            .args(self.args(address))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program))?;

        tracing::info!("Playing {} ({})", name, address);
        self.child = Some(child);
        self.now_playing = Some(name.to_string());
        Ok(())
    }

    /// Stop playback; a no-op when nothing is playing
    pub async fn stop(&mut self) -> Result<()> {
        self.now_playing = None;

        if let Some(mut child) = self.child.take() {
            // The child may already have exited on its own
            if child.try_wait()?.is_none() {
                child.kill().await.context("Failed to stop player")?;
            }
            tracing::info!("Playback stopped");
        }

        Ok(())
    }

    /// Name of the stream being played, if the player is still running
    pub fn now_playing(&mut self) -> Option<&str> {
        let exited = match self.child.as_mut() {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => true,
        };

        if exited && self.child.is_some() {
            tracing::warn!("Player exited for {}", self.now_playing.as_deref().unwrap_or("?"));
            self.child = None;
            self.now_playing = None;
        }

        self.now_playing.as_deref()
    }

    /// Wait until the player exits on its own
    pub async fn wait(&mut self) -> Result<()> {
        if let Some(child) = self.child.as_mut() {
            let status = child.wait().await?;
            tracing::info!("Player exited with {}", status);
        }
        self.child = None;
        self.now_playing = None;
        Ok(())
    }
}

/// Desktop notification for a newly started stream
pub fn notify_playing(name: &str) {
    let _ = notify_rust::Notification::new()
        .summary("sointu")
        .body(&format!("Now playing {}", name))
        .icon("audio-x-generic")
        .show();
}
