use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
  pub level: Option<String>,
  /// Extra per-target filter directives, e.g. `"reqwest=warn"`.
  pub filters: Option<String>,
  #[serde(default)]
  pub file: Option<FileLogConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FileLogConfig {
  pub path: String,
  #[serde(default = "default_max_lines")]
  pub max_lines: u32,
}

fn default_max_lines() -> u32 {
  10_000
}
