use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    common::types::PlaybackId, configs::MonitorConfig, session::SessionRegistry,
    transport::MediaServer,
};

/// The control loop driving reconciliation and the per-session passes.
///
/// One loop serves all sessions: each pass is a cheap in-memory
/// computation, and all network side effects are dispatched without being
/// awaited, so a slow remote call cannot stall the next cycle. Passes on a
/// given session are strictly sequential because only this loop runs them.
pub struct Monitor {
    registry: Arc<SessionRegistry>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Monitor {
    /// Spawn the monitor loop. It runs until [`Monitor::stop`] is called.
    pub fn start(config: MonitorConfig, server: Arc<dyn MediaServer>) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.clone(), server));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_loop(registry.clone(), config, shutdown_rx));

        Self {
            registry,
            shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn tracked_session_ids(&self) -> Vec<PlaybackId> {
        self.registry.tracked_ids()
    }

    /// Signal shutdown and wait for the loop to exit. The loop observes the
    /// signal within one polling interval; outstanding command dispatches
    /// are fire-and-forget and not waited for.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("monitor loop ended abnormally: {e}");
            }
        }
        self.registry.clear();
        info!("monitor stopped");
    }
}

async fn run_loop(
    registry: Arc<SessionRegistry>,
    config: MonitorConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let active_interval = Duration::from_secs(config.active_poll_secs.max(1));
    let idle_interval = Duration::from_secs(config.idle_poll_secs.max(1));
    let mut consecutive_failures: u32 = 0;

    info!(
        "monitor loop started (active {}s / idle {}s)",
        active_interval.as_secs(),
        idle_interval.as_secs()
    );

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match registry.reconcile().await {
            Ok(()) => {
                if consecutive_failures > 0 {
                    info!(
                        "session fetch recovered after {consecutive_failures} failed cycle(s)"
                    );
                }
                consecutive_failures = 0;
            }
            Err(e) => {
                // Tracked state is untouched; retried next cycle.
                consecutive_failures += 1;
                warn!("session fetch failed ({consecutive_failures} in a row): {e}");
            }
        }

        let any_active = registry.run_passes();
        let interval = if any_active {
            active_interval
        } else {
            idle_interval
        };

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown_rx.changed() => break,
        }
    }

    info!("monitor loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::types::{DeviceId, MediaKey},
        session::snapshot::{PlayerState, SessionSnapshot},
        transport::mock::MockServer,
    };

    fn snapshot(session_key: &str, rating_key: &str) -> SessionSnapshot {
        SessionSnapshot {
            playback_id: PlaybackId::from_parts(session_key, rating_key),
            media_key: MediaKey(format!("/library/metadata/{rating_key}")),
            device_id: DeviceId(format!("device-{session_key}")),
            player_title: "Test Player".into(),
            player_state: PlayerState::Playing,
            view_offset_ms: 60_000,
            subtitle_stream_id: Some(0),
            fine: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn picks_up_sessions_and_stops_cleanly() {
        let server = Arc::new(MockServer::default());
        server.set_sessions(vec![snapshot("1", "100"), snapshot("2", "200")]);

        let monitor = Monitor::start(MonitorConfig::default(), server.clone());

        // Let the first cycle run.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut ids = monitor.tracked_session_ids();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            ids,
            vec![
                PlaybackId::from_parts("1", "100"),
                PlaybackId::from_parts("2", "200"),
            ]
        );

        monitor.stop().await;
        assert!(monitor.tracked_session_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_running_through_fetch_failures() {
        let server = Arc::new(MockServer::default());
        server.set_sessions(vec![snapshot("1", "100")]);

        let monitor = Monitor::start(MonitorConfig::default(), server.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(monitor.tracked_session_ids().len(), 1);

        // A few failing cycles must not drop tracked state.
        server.set_fail_fetch(true);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(monitor.tracked_session_ids().len(), 1);

        server.set_fail_fetch(false);
        monitor.stop().await;
    }
}
