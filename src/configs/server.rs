use serde::{Deserialize, Serialize};

/// Connection details for the monitored media server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
  /// Base URL, e.g. `http://127.0.0.1:32400`.
  pub url: String,
  /// Auth token sent as `X-Plex-Token`.
  pub token: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  10
}
