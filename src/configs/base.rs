use serde::{Deserialize, Serialize};

use crate::configs::*;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
  pub server: ServerConfig,
  #[serde(default)]
  pub monitor: MonitorConfig,
  pub logging: Option<LoggingConfig>,
}

use crate::common::types::AnyResult;

impl Config {
  pub fn load() -> AnyResult<Self> {
    let config_path = if std::path::Path::new("config.toml").exists() {
      "config.toml"
    } else if std::path::Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Err("config.toml or config.default.toml not found".into());
    };

    crate::log_println!("Loading configuration from: {}", config_path);

    let config_str = std::fs::read_to_string(config_path)?;
    if config_str.is_empty() {
      return Err(format!("{config_path} is empty").into());
    }

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn minimal_config_fills_monitor_defaults() {
    let config: Config = toml::from_str(
      r#"
      [server]
      url = "http://127.0.0.1:32400"
      token = "abc123"
      "#,
    )
    .expect("minimal config should parse");

    assert_eq!(config.server.timeout_secs, 10);
    assert_eq!(config.monitor.active_poll_secs, 1);
    assert_eq!(config.monitor.idle_poll_secs, 30);
    assert_eq!(config.monitor.max_rewind_secs, 60.0);
    assert_eq!(config.monitor.cooldown_cycles, 5);
    assert_eq!(config.monitor.grace_period_secs, 60);
    assert!(config.monitor.subtitle_patterns.is_empty());
    assert!(config.logging.is_none());
  }

  #[test]
  fn full_config_round_trips() {
    let config: Config = toml::from_str(
      r#"
      [server]
      url = "http://plex.local:32400"
      token = "t0k3n"
      timeout_secs = 5

      [monitor]
      active_poll_secs = 2
      idle_poll_secs = 15
      max_rewind_secs = 90.0
      cooldown_cycles = 3
      grace_period_secs = 30
      subtitle_patterns = ["english", "-sdh"]

      [logging]
      level = "debug"
      filters = "reqwest=warn"

      [logging.file]
      path = "logs/subrewind.log"
      "#,
    )
    .expect("full config should parse");

    assert_eq!(config.monitor.subtitle_patterns, vec!["english", "-sdh"]);
    assert_eq!(config.logging.as_ref().unwrap().level.as_deref(), Some("debug"));
    let file = config.logging.unwrap().file.unwrap();
    assert_eq!(file.path, "logs/subrewind.log");
    assert_eq!(file.max_lines, 10_000);
  }
}
