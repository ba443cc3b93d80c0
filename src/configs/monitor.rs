use serde::{Deserialize, Serialize};

/// Tuning knobs for the rewind monitor.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonitorConfig {
  /// Poll interval while at least one session is actively relevant.
  #[serde(default = "default_active_poll_secs")]
  pub active_poll_secs: u64,
  /// Poll interval while nothing is playing.
  #[serde(default = "default_idle_poll_secs")]
  pub idle_poll_secs: u64,
  /// A rewind further back than this is treated as deliberate seeking and
  /// cancels automatic subtitles.
  #[serde(default = "default_max_rewind_secs")]
  pub max_rewind_secs: f64,
  /// Polling cycles to suppress re-triggering after an over-rewind.
  /// Only honored for sessions with a fine-grained position source;
  /// coarse sessions always use 2 cycles.
  #[serde(default = "default_cooldown_cycles")]
  pub cooldown_cycles: u32,
  /// How long a session may vanish from the session list before its
  /// tracking state is torn down.
  #[serde(default = "default_grace_period_secs")]
  pub grace_period_secs: u64,
  /// Subtitle track preference terms, matched case-insensitively against
  /// each stream's display title. A leading `-` means "must not match".
  /// Example: `["english", "-sdh", "-forced"]`.
  #[serde(default)]
  pub subtitle_patterns: Vec<String>,
}

impl Default for MonitorConfig {
  fn default() -> Self {
    Self {
      active_poll_secs: default_active_poll_secs(),
      idle_poll_secs: default_idle_poll_secs(),
      max_rewind_secs: default_max_rewind_secs(),
      cooldown_cycles: default_cooldown_cycles(),
      grace_period_secs: default_grace_period_secs(),
      subtitle_patterns: Vec::new(),
    }
  }
}

fn default_active_poll_secs() -> u64 {
  1
}

fn default_idle_poll_secs() -> u64 {
  30
}

fn default_max_rewind_secs() -> f64 {
  60.0
}

fn default_cooldown_cycles() -> u32 {
  5
}

fn default_grace_period_secs() -> u64 {
  60
}
