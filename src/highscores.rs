//! Persist the high score to disk (XDG config or ~/.config/flowergarden).

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

const FILENAME: &str = "high_score";

/// Returns the path to the high score file (config dir / flowergarden / high_score).
fn config_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("flowergarden").join(FILENAME)
}

/// First line as an integer; anything unreadable counts as 0.
fn parse_high_score(content: &str) -> u64 {
    content
        .lines()
        .next()
        .and_then(|l| l.trim().parse().ok())
        .unwrap_or(0)
}

/// Load the high score from disk. 0 on missing file or parse error.
pub fn load_high_score() -> u64 {
    let path = config_path();
    match fs::read_to_string(&path) {
        Ok(content) => parse_high_score(&content),
        Err(e) => {
            log::debug!("no high score at {}: {e}", path.display());
            0
        }
    }
}

/// Save the high score to disk. Creates the config directory if needed.
pub fn save_high_score(score: u64) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, format!("{score}\n"))?;
    Ok(())
}
