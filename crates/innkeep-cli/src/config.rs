//! Settings: CLI flags and environment over the TOML file over defaults.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result};
use innkeep_client::HttpConfig;
use serde::Deserialize;

const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_NOTICE_SECS: u64 = 3;

/// Connection flags shared by every subcommand.
#[derive(clap::Args, Debug, Default)]
pub struct GlobalArgs {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", global = true)]
  pub config: Option<PathBuf>,

  /// Backend root URL.
  #[arg(long, env = "INNKEEP_URL", global = true)]
  pub url: Option<String>,

  /// Directory holding the saved session and the board's log file.
  #[arg(long, env = "INNKEEP_STATE_DIR", value_name = "DIR", global = true)]
  pub state_dir: Option<PathBuf>,

  /// Request timeout in seconds.
  #[arg(long, env = "INNKEEP_TIMEOUT_SECS", value_name = "SECS", global = true)]
  pub timeout_secs: Option<u64>,
}

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct ConfigFile {
  pub url:          Option<String>,
  pub timeout_secs: Option<u64>,
  pub state_dir:    Option<PathBuf>,
  /// How often the Today screen reloads.
  pub refresh_secs: Option<u64>,
  /// How long a notice stays on screen.
  pub notice_secs:  Option<u64>,
}

impl ConfigFile {
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let Some(path) = path else {
      return Ok(Self::default());
    };
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
  }
}

#[derive(Debug, Clone)]
pub struct Settings {
  pub http:      HttpConfig,
  pub state_dir: PathBuf,
  pub refresh:   Duration,
  pub notice:    Duration,
}

impl Settings {
  pub fn resolve(args: &GlobalArgs, file: ConfigFile) -> Self {
    let defaults = HttpConfig::default();
    let non_empty = |s: String| (!s.trim().is_empty()).then_some(s);
    Self {
      http:      HttpConfig {
        base_url: args
          .url
          .clone()
          .and_then(non_empty)
          .or_else(|| file.url.and_then(non_empty))
          .unwrap_or(defaults.base_url),
        timeout:  args
          .timeout_secs
          .or(file.timeout_secs)
          .map(Duration::from_secs)
          .unwrap_or(defaults.timeout),
      },
      state_dir: args
        .state_dir
        .clone()
        .or(file.state_dir)
        .map(|p| expand_tilde(&p))
        .unwrap_or_else(default_state_dir),
      refresh:   Duration::from_secs(file.refresh_secs.unwrap_or(DEFAULT_REFRESH_SECS).max(1)),
      notice:    Duration::from_secs(file.notice_secs.unwrap_or(DEFAULT_NOTICE_SECS)),
    }
  }
}

/// `$XDG_STATE_HOME/innkeep`, else `~/.local/state/innkeep`, else
/// `./.innkeep`.
fn default_state_dir() -> PathBuf {
  if let Some(state) = std::env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
    return PathBuf::from(state).join("innkeep");
  }
  match std::env::var_os("HOME") {
    Some(home) => PathBuf::from(home).join(".local/state/innkeep"),
    None => PathBuf::from(".innkeep"),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
