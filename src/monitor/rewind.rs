use tracing::{debug, warn};

/// Position drop (seconds) below the baseline that counts as a rewind.
/// Anything smaller is indistinguishable from reporting jitter.
const REWIND_THRESHOLD_SECS: f64 = 2.0;

/// Floor for the fast-forward threshold. Most players only report position
/// with ~1 s granularity, so short hops must not be misread as fast-forwards.
const FAST_FORWARD_FLOOR_SECS: f64 = 7.0;

/// Cooldown length for sessions with only a coarse position source.
const COARSE_COOLDOWN_CYCLES: u32 = 2;

/// Subtitle side effect requested by a monitoring pass. The machine never
/// does I/O itself; the owning session entity dispatches the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleAction {
    Enable,
    Disable,
}

/// Per-session rewind detector.
///
/// Consumes one position sample per polling pass and decides when to start
/// or stop automatic subtitles, while never overriding a user who controls
/// subtitles manually. `latest_watched_position` is the high-water baseline:
/// the point subtitles should stop at once the viewer catches back up.
#[derive(Debug)]
pub struct RewindStateMachine {
    latest_watched_position: f64,
    previous_position: f64,
    /// True while subtitles are on because this machine turned them on.
    displaying_subtitles: bool,
    /// True while a disable has been requested but not yet observed to have
    /// taken effect on the player.
    pending_disable: bool,
    /// True while the user is considered in manual control.
    user_enabled: bool,
    cooldown_cycles_left: u32,
    cooldown_duration: u32,
    /// Smallest position step this session's data source can express.
    resolution_secs: f64,
    max_rewind_secs: f64,
}

impl RewindStateMachine {
    pub fn new(
        max_rewind_secs: f64,
        cooldown_cycles: u32,
        resolution_secs: f64,
        fine_grained: bool,
        start_position: f64,
    ) -> Self {
        // A multi-press rewind gesture arrives as several samples; with a
        // coarse source two cycles of suppression is all that is useful.
        let cooldown_duration = if fine_grained {
            cooldown_cycles
        } else {
            COARSE_COOLDOWN_CYCLES
        };

        Self {
            latest_watched_position: start_position,
            previous_position: start_position,
            displaying_subtitles: false,
            pending_disable: false,
            user_enabled: false,
            cooldown_cycles_left: 0,
            cooldown_duration,
            resolution_secs,
            max_rewind_secs,
        }
    }

    pub fn is_displaying(&self) -> bool {
        self.displaying_subtitles
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooldown_cycles_left > 0
    }

    pub fn baseline(&self) -> f64 {
        self.latest_watched_position
    }

    fn fast_forward_threshold(&self) -> f64 {
        (self.resolution_secs + 2.0).max(FAST_FORWARD_FLOOR_SECS)
    }

    /// Run one monitoring pass over the latest sample.
    ///
    /// Never panics and never leaves the machine half-updated: a bad sample
    /// is logged and the pass becomes a no-op.
    pub fn make_monitoring_pass(
        &mut self,
        position: f64,
        subtitles_known_on: Option<bool>,
    ) -> Option<SubtitleAction> {
        if !position.is_finite() || position < 0.0 {
            warn!("ignoring invalid position sample {position}");
            return None;
        }

        let action = self.evaluate(position, subtitles_known_on);
        self.previous_position = position;
        action
    }

    fn evaluate(&mut self, position: f64, subtitles_known_on: Option<bool>) -> Option<SubtitleAction> {
        // 1. User controls subtitles. Track along so their position becomes
        //    the new baseline; return to automatic control once subtitles
        //    are observed off.
        if self.user_enabled {
            if subtitles_known_on == Some(false) {
                debug!("subtitles observed off, resuming automatic control");
                self.user_enabled = false;
            }
            self.latest_watched_position = position;
            return None;
        }

        // A disable went out but the player has not been observed off yet.
        // A subtitle status still reading on means the command was lost or
        // rejected: re-emit it rather than let the manual-enable detection
        // below misread our own stuck subtitles as a user action. An
        // unknown status cannot confirm either way; assume the command
        // landed, since detection cannot trigger on unknown anyway.
        if self.pending_disable {
            if subtitles_known_on == Some(true) {
                debug!("subtitles still observed on, re-sending disable");
                return Some(SubtitleAction::Disable);
            }
            self.pending_disable = false;
        }

        // 2. Subtitles are on but this machine did not turn them on: the
        //    user did. Only valid while we are not displaying ourselves,
        //    otherwise we would mistake our own action for a manual one.
        if !self.displaying_subtitles && subtitles_known_on == Some(true) {
            debug!("manual subtitle enable detected at {position}");
            self.user_enabled = true;
            self.latest_watched_position = position;
            return None;
        }

        // 3. Automatic display active.
        if self.displaying_subtitles {
            if position > self.previous_position + self.fast_forward_threshold() {
                debug!("fast-forward past {position}, stopping subtitles");
                self.displaying_subtitles = false;
                self.pending_disable = true;
                self.latest_watched_position = position;
                return Some(SubtitleAction::Disable);
            }

            if position < self.latest_watched_position - self.max_rewind_secs {
                debug!(
                    "rewound more than {}s below baseline {}, stopping subtitles and cooling down",
                    self.max_rewind_secs, self.latest_watched_position
                );
                self.displaying_subtitles = false;
                self.pending_disable = true;
                self.cooldown_cycles_left = self.cooldown_duration;
                self.latest_watched_position = position;
                return Some(SubtitleAction::Disable);
            }

            if position >= self.latest_watched_position + self.resolution_secs {
                debug!("original position reached at {position}, stopping subtitles");
                self.displaying_subtitles = false;
                self.pending_disable = true;
                self.latest_watched_position = position;
                return Some(SubtitleAction::Disable);
            }

            return None;
        }

        // 4. Cooldown after an over-rewind. The baseline is never advanced
        //    while a cooldown is pending, so a user pausing mid-rewind
        //    cannot lock in a position that would later read as a fresh
        //    over-rewind.
        if self.cooldown_cycles_left > 0 {
            if position > self.previous_position + self.fast_forward_threshold() {
                // Fast-forward means the gesture is over.
                self.cooldown_cycles_left = 0;
            } else if position < self.previous_position - REWIND_THRESHOLD_SECS {
                // Still actively rewinding: hold the suppression window open.
                self.cooldown_cycles_left = self.cooldown_duration;
            } else {
                self.cooldown_cycles_left -= 1;
            }
            return None;
        }

        // 5. Idle: watch for a rewind.
        let drop = self.latest_watched_position - position;
        if drop > REWIND_THRESHOLD_SECS && drop <= self.max_rewind_secs {
            debug!(
                "rewind from {} to {position}, starting subtitles",
                self.latest_watched_position
            );
            self.displaying_subtitles = true;
            return Some(SubtitleAction::Enable);
        }

        self.latest_watched_position = position;
        None
    }
}
