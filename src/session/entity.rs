use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    session::snapshot::{SessionSnapshot, SubtitleStream},
    transport::MediaServer,
};

/// Position resolution to expect when only the coarse view offset is
/// available. Coarse sources cannot distinguish sub-resolution rewinds
/// from noise.
const COARSE_RESOLUTION_SECS: f64 = 5.0;
const FINE_RESOLUTION_SECS: f64 = 0.1;

/// Stateful wrapper around the latest snapshot of one tracked session.
///
/// Owns the full subtitle inventory (fetched once per media item), the
/// preferred stream chosen at creation, and the last-seen bookkeeping used
/// for grace-period removal. State is mutated only through narrow methods;
/// the preferred stream is never recomputed on refresh.
pub struct ActiveSessionEntity {
    snapshot: SessionSnapshot,
    available_subtitles: Vec<SubtitleStream>,
    preferred_subtitle: Option<SubtitleStream>,
    missing_since: Option<Instant>,
    /// Set by a confirmed disable command; holds the subtitle status at
    /// `Some(false)` until the next snapshot refresh.
    confirmed_off: Arc<AtomicBool>,
    server: Arc<dyn MediaServer>,
}

impl ActiveSessionEntity {
    pub fn new(
        snapshot: SessionSnapshot,
        available_subtitles: Vec<SubtitleStream>,
        patterns: &[String],
        server: Arc<dyn MediaServer>,
    ) -> Self {
        let preferred_subtitle =
            select_preferred_subtitle(&available_subtitles, patterns).cloned();

        if let Some(stream) = &preferred_subtitle {
            debug!(
                "[{}] preferred subtitle: {} (#{})",
                snapshot.playback_id, stream.display_title, stream.id
            );
        }

        Self {
            snapshot,
            available_subtitles,
            preferred_subtitle,
            missing_since: None,
            confirmed_off: Arc::new(AtomicBool::new(false)),
            server,
        }
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn preferred_subtitle(&self) -> Option<&SubtitleStream> {
        self.preferred_subtitle.as_ref()
    }

    /// Replace the snapshot with a freshly fetched one. Clears any pending
    /// missing stamp and any disable confirmation override.
    pub fn apply_updated_data(&mut self, snapshot: SessionSnapshot) {
        self.snapshot = snapshot;
        self.missing_since = None;
        self.confirmed_off.store(false, Ordering::Relaxed);
    }

    pub fn position_seconds(&self) -> f64 {
        self.snapshot.position_seconds()
    }

    pub fn has_fine_grained(&self) -> bool {
        self.snapshot.has_fine_grained()
    }

    pub fn smallest_resolution_expected(&self) -> f64 {
        if self.snapshot.has_fine_grained() {
            FINE_RESOLUTION_SECS
        } else {
            COARSE_RESOLUTION_SECS
        }
    }

    /// Tri-state subtitle status; a confirmed disable overrides the
    /// snapshot until the next refresh.
    pub fn subtitles_known_on(&self) -> Option<bool> {
        if self.confirmed_off.load(Ordering::Relaxed) {
            return Some(false);
        }
        self.snapshot.subtitles_known_on()
    }

    /// Stamp the first poll cycle this session went missing from the fetch.
    pub fn mark_missing(&mut self, now: Instant) {
        if self.missing_since.is_none() {
            self.missing_since = Some(now);
        }
    }

    pub fn missing_since(&self) -> Option<Instant> {
        self.missing_since
    }

    /// Turn subtitles on, using the preferred stream or falling back to the
    /// first available one. Dispatched fire-and-forget; success is not
    /// separately confirmed, the next poll's state detection corrects any
    /// mismatch.
    pub fn enable_subtitles(&self) {
        let stream = self
            .preferred_subtitle
            .as_ref()
            .or_else(|| self.available_subtitles.first());

        let Some(stream) = stream else {
            warn!(
                "[{}] rewind detected but media has no subtitle streams",
                self.snapshot.playback_id
            );
            return;
        };

        info!(
            "[{}] enabling subtitles: {} (#{})",
            self.snapshot.playback_id, stream.display_title, stream.id
        );

        let server = self.server.clone();
        let device_id = self.snapshot.device_id.clone();
        let playback_id = self.snapshot.playback_id.clone();
        let stream_id = stream.id;
        tokio::spawn(async move {
            if let Err(e) = server.set_subtitle_stream(&device_id, Some(stream_id)).await {
                warn!("[{playback_id}] enable subtitles failed: {e}");
            }
        });
    }

    /// Turn subtitles off. The known-on flag is only updated on confirmed
    /// success, so a rejected command is naturally retried on the next
    /// relevant transition.
    pub fn disable_subtitles(&self) {
        info!("[{}] disabling subtitles", self.snapshot.playback_id);

        let server = self.server.clone();
        let device_id = self.snapshot.device_id.clone();
        let playback_id = self.snapshot.playback_id.clone();
        let confirmed_off = self.confirmed_off.clone();
        tokio::spawn(async move {
            match server.set_subtitle_stream(&device_id, None).await {
                Ok(()) => confirmed_off.store(true, Ordering::Relaxed),
                Err(e) => warn!("[{playback_id}] disable subtitles failed: {e}"),
            }
        });
    }
}

/// Pick the first stream whose display title contains every required term
/// and none of the forbidden ones (case-insensitive). A leading `-` on a
/// term marks it forbidden. Forced streams are skipped unless `forced` is
/// itself a required term. No patterns or no qualifying stream means no
/// preference.
pub fn select_preferred_subtitle<'a>(
    streams: &'a [SubtitleStream],
    patterns: &[String],
) -> Option<&'a SubtitleStream> {
    if patterns.is_empty() {
        return streams.first();
    }

    let mut required: Vec<String> = Vec::new();
    let mut forbidden: Vec<String> = Vec::new();
    for pattern in patterns {
        match pattern.strip_prefix('-') {
            Some(term) if !term.is_empty() => forbidden.push(term.to_lowercase()),
            _ => required.push(pattern.to_lowercase()),
        }
    }

    let wants_forced = required.iter().any(|t| t == "forced");

    streams.iter().find(|stream| {
        if stream.forced && !wants_forced {
            return false;
        }
        let title = stream.display_title.to_lowercase();
        required.iter().all(|t| title.contains(t)) && !forbidden.iter().any(|t| title.contains(t))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(id: u64, title: &str) -> SubtitleStream {
        SubtitleStream {
            id,
            display_title: title.to_string(),
            language_code: Some("eng".to_string()),
            selected: false,
            forced: false,
        }
    }

    #[test]
    fn negated_pattern_skips_sdh_track() {
        let streams = vec![stream(1, "English SDH"), stream(2, "English")];
        let patterns = vec!["english".to_string(), "-sdh".to_string()];

        let picked = select_preferred_subtitle(&streams, &patterns).unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let streams = vec![stream(1, "ENGLISH (SRT)")];
        let patterns = vec!["english".to_string()];
        assert_eq!(select_preferred_subtitle(&streams, &patterns).unwrap().id, 1);
    }

    #[test]
    fn no_patterns_picks_first_stream() {
        let streams = vec![stream(5, "Deutsch"), stream(6, "English")];
        assert_eq!(select_preferred_subtitle(&streams, &[]).unwrap().id, 5);
    }

    #[test]
    fn no_qualifying_stream_means_no_preference() {
        let streams = vec![stream(1, "Français"), stream(2, "Deutsch")];
        let patterns = vec!["english".to_string()];
        assert!(select_preferred_subtitle(&streams, &patterns).is_none());
    }

    #[test]
    fn all_required_terms_must_match() {
        let streams = vec![stream(1, "English (SRT)"), stream(2, "English (ASS)")];
        let patterns = vec!["english".to_string(), "ass".to_string()];
        assert_eq!(select_preferred_subtitle(&streams, &patterns).unwrap().id, 2);
    }

    #[test]
    fn forced_streams_skipped_unless_requested() {
        let mut forced = stream(1, "English (Forced)");
        forced.forced = true;
        let streams = vec![forced, stream(2, "English")];

        let patterns = vec!["english".to_string()];
        assert_eq!(select_preferred_subtitle(&streams, &patterns).unwrap().id, 2);

        let patterns = vec!["english".to_string(), "forced".to_string()];
        assert_eq!(select_preferred_subtitle(&streams, &patterns).unwrap().id, 1);
    }

    #[test]
    fn empty_stream_list_has_no_preference() {
        assert!(select_preferred_subtitle(&[], &["english".to_string()]).is_none());
        assert!(select_preferred_subtitle(&[], &[]).is_none());
    }
}
