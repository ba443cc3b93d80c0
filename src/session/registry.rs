use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{
    common::{errors::TransportError, types::PlaybackId},
    configs::MonitorConfig,
    monitor::rewind::{RewindStateMachine, SubtitleAction},
    session::{
        entity::ActiveSessionEntity,
        snapshot::{PlayerState, SessionSnapshot, SubtitleStream},
    },
    transport::MediaServer,
};

/// One tracked session: entity plus its paired state machine. Both live and
/// die together.
pub struct TrackedSession {
    pub entity: ActiveSessionEntity,
    pub machine: RewindStateMachine,
}

impl TrackedSession {
    fn create(
        snapshot: SessionSnapshot,
        subtitles: Vec<SubtitleStream>,
        config: &MonitorConfig,
        server: Arc<dyn MediaServer>,
    ) -> Self {
        let entity = ActiveSessionEntity::new(snapshot, subtitles, &config.subtitle_patterns, server);
        let machine = RewindStateMachine::new(
            config.max_rewind_secs,
            config.cooldown_cycles,
            entity.smallest_resolution_expected(),
            entity.has_fine_grained(),
            entity.position_seconds(),
        );
        Self { entity, machine }
    }
}

/// Reconciles the fetched session list against the tracked set and drives
/// the per-session monitoring passes.
pub struct SessionRegistry {
    tracked: DashMap<PlaybackId, TrackedSession>,
    server: Arc<dyn MediaServer>,
    config: MonitorConfig,
}

impl SessionRegistry {
    pub fn new(config: MonitorConfig, server: Arc<dyn MediaServer>) -> Self {
        Self {
            tracked: DashMap::new(),
            server,
            config,
        }
    }

    /// Fetch the current session list and bring the tracked set in line:
    /// update existing entities in place, create entities (and machines)
    /// for newly seen playback ids, and retire entities whose playback id
    /// has been absent for longer than the grace period.
    ///
    /// On fetch failure the tracked set is left untouched and the error is
    /// surfaced for the scheduler to log; the next cycle retries.
    pub async fn reconcile(&self) -> Result<(), TransportError> {
        let snapshots = self.server.fetch_sessions().await?;

        // Merge in the fine-grained status reads, one concurrent query per
        // session. Best-effort: a player that does not answer stays coarse.
        let snapshots: Vec<SessionSnapshot> = join_all(snapshots.into_iter().map(|snap| {
            let server = self.server.clone();
            async move {
                let fine = server.fetch_fine_grained_status(&snap.device_id).await;
                snap.with_fine(fine)
            }
        }))
        .await;

        let mut seen: HashSet<PlaybackId> = HashSet::with_capacity(snapshots.len());
        let mut discovered = Vec::new();

        for snap in snapshots {
            seen.insert(snap.playback_id.clone());
            match self.tracked.get_mut(&snap.playback_id) {
                Some(mut tracked) => tracked.entity.apply_updated_data(snap),
                None => discovered.push(snap),
            }
        }

        // The session list endpoint omits inactive subtitle tracks, so each
        // new session needs one metadata query. Run them concurrently.
        let fetched = join_all(discovered.into_iter().map(|snap| {
            let server = self.server.clone();
            async move {
                let subs = server.fetch_available_subtitles(&snap.media_key).await;
                (snap, subs)
            }
        }))
        .await;

        for (snap, subs) in fetched {
            let subs = match subs {
                Ok(subs) => subs,
                Err(e) => {
                    warn!(
                        "[{}] subtitle inventory fetch failed, retrying next cycle: {e}",
                        snap.playback_id
                    );
                    continue;
                }
            };

            let id = snap.playback_id.clone();
            // The entry API guards against a duplicate insert racing in.
            self.tracked.entry(id.clone()).or_insert_with(|| {
                info!(
                    "[{}] now monitoring \"{}\" on {}",
                    id, snap.media_key, snap.player_title
                );
                TrackedSession::create(snap, subs, &self.config, self.server.clone())
            });
        }

        // Grace sweep: tolerate transient server glitches without dropping
        // monitors, which would reset rewind baselines.
        let grace = Duration::from_secs(self.config.grace_period_secs);
        let now = Instant::now();
        self.tracked.retain(|id, tracked| {
            if seen.contains(id) {
                return true;
            }
            tracked.entity.mark_missing(now);
            let missing_for = now - tracked.entity.missing_since().unwrap_or(now);
            if missing_for > grace {
                info!("[{id}] absent for {}s, dropping monitor", missing_for.as_secs());
                false
            } else {
                true
            }
        });

        Ok(())
    }

    /// Run one monitoring pass on every tracked session and dispatch any
    /// subtitle side effects. Returns whether anything is actively relevant
    /// (playing, displaying, or cooling down) for interval selection.
    pub fn run_passes(&self) -> bool {
        let mut any_active = false;

        for mut item in self.tracked.iter_mut() {
            let tracked = item.value_mut();
            let position = tracked.entity.position_seconds();
            let known_on = tracked.entity.subtitles_known_on();

            match tracked.machine.make_monitoring_pass(position, known_on) {
                Some(SubtitleAction::Enable) => tracked.entity.enable_subtitles(),
                Some(SubtitleAction::Disable) => tracked.entity.disable_subtitles(),
                None => {}
            }

            if tracked.machine.is_displaying()
                || tracked.machine.in_cooldown()
                || tracked.entity.snapshot().player_state == PlayerState::Playing
            {
                any_active = true;
            }
        }

        any_active
    }

    pub fn tracked_ids(&self) -> Vec<PlaybackId> {
        self.tracked.iter().map(|item| item.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn clear(&self) {
        self.tracked.clear();
    }
}
