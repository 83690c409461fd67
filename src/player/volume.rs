use anyhow::{Context, Result};

use super::run_command_with_timeout;

const SINK: &str = "@DEFAULT_SINK@";

/// Current volume of the default sink, in percent
pub async fn get_volume() -> Result<u8> {
    let output = run_command_with_timeout("wpctl", &["get-volume", SINK]).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("wpctl get-volume failed: {}", stderr.trim());
    }

    parse_wpctl_volume(&String::from_utf8_lossy(&output.stdout))
}

/// Set the default sink volume, in percent (clamped to 100)
pub async fn set_volume(volume: u8) -> Result<u8> {
    let volume = volume.min(100);
    let level = wpctl_level(volume);

    let output = run_command_with_timeout("wpctl", &["set-volume", SINK, &level]).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("wpctl set-volume failed: {}", stderr.trim());
    }

    tracing::debug!("Volume set to {}%", volume);
    Ok(volume)
}

/// Volume as the fraction wpctl expects, e.g. 40 -> "0.4"
pub fn wpctl_level(volume: u8) -> String {
    (volume as f32 / 100.0).to_string()
}

/// Parse `wpctl get-volume` output, e.g. `Volume: 0.40 [MUTED]`
pub fn parse_wpctl_volume(stdout: &str) -> Result<u8> {
    let level = stdout
        .trim()
        .strip_prefix("Volume:")
        .and_then(|rest| rest.split_whitespace().next())
        .with_context(|| format!("Unexpected wpctl output: {}", stdout.trim()))?;

    let level: f32 = level
        .parse()
        .with_context(|| format!("Invalid volume level: {}", level))?;

    Ok((level * 100.0).round().clamp(0.0, 100.0) as u8)
}
