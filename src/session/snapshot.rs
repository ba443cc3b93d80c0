use serde::{Deserialize, Serialize};

use crate::common::types::{DeviceId, MediaKey, PlaybackId};

/// Remote player playback state as reported by the session list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerState {
    Playing,
    Paused,
    Buffering,
    Stopped,
}

impl PlayerState {
    pub fn parse(s: &str) -> Self {
        match s {
            "playing" => Self::Playing,
            "paused" => Self::Paused,
            "buffering" => Self::Buffering,
            _ => Self::Stopped,
        }
    }
}

/// One subtitle track available on the current media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleStream {
    pub id: u64,
    pub display_title: String,
    pub language_code: Option<String>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub forced: bool,
}

/// Position and subtitle state from the secondary, finer-grained timeline
/// query. Best-effort; absent for players that do not answer it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FineGrainedStatus {
    pub position_ms: u64,
    pub subtitles_on: bool,
}

/// Point-in-time read of one playback session. Immutable once constructed;
/// replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub playback_id: PlaybackId,
    pub media_key: MediaKey,
    pub device_id: DeviceId,
    pub player_title: String,
    pub player_state: PlayerState,
    /// Coarse playback position from the session list.
    pub view_offset_ms: u64,
    /// Selected subtitle stream. `Some(0)` means explicitly none selected;
    /// `None` means the payload did not report the field at all.
    pub subtitle_stream_id: Option<u64>,
    pub fine: Option<FineGrainedStatus>,
}

impl SessionSnapshot {
    /// Attach a fine-grained status read taken alongside this snapshot.
    pub fn with_fine(mut self, fine: Option<FineGrainedStatus>) -> Self {
        self.fine = fine;
        self
    }

    pub fn has_fine_grained(&self) -> bool {
        self.fine.is_some()
    }

    /// Position in seconds, rounded to two decimals, preferring the
    /// fine-grained source.
    pub fn position_seconds(&self) -> f64 {
        let ms = match &self.fine {
            Some(fine) => fine.position_ms,
            None => self.view_offset_ms,
        };
        (ms as f64 / 1000.0 * 100.0).round() / 100.0
    }

    /// Tri-state subtitle status: the fine-grained flag when present,
    /// else inferred from the selected stream id, else unknown.
    pub fn subtitles_known_on(&self) -> Option<bool> {
        if let Some(fine) = &self.fine {
            return Some(fine.subtitles_on);
        }
        self.subtitle_stream_id.map(|id| id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(view_offset_ms: u64) -> SessionSnapshot {
        SessionSnapshot {
            playback_id: PlaybackId::from_parts("12", "4821"),
            media_key: MediaKey("/library/metadata/4821".into()),
            device_id: DeviceId("abcdef".into()),
            player_title: "Living Room TV".into(),
            player_state: PlayerState::Playing,
            view_offset_ms,
            subtitle_stream_id: None,
            fine: None,
        }
    }

    #[test]
    fn position_rounds_to_two_decimals() {
        assert_eq!(snapshot(63_333).position_seconds(), 63.33);
        assert_eq!(snapshot(63_337).position_seconds(), 63.34);
        assert_eq!(snapshot(0).position_seconds(), 0.0);
    }

    #[test]
    fn fine_grained_position_wins_over_view_offset() {
        let snap = snapshot(60_000).with_fine(Some(FineGrainedStatus {
            position_ms: 61_250,
            subtitles_on: false,
        }));
        assert_eq!(snap.position_seconds(), 61.25);
    }

    #[test]
    fn subtitle_tri_state() {
        // Nothing reported at all: unknown.
        assert_eq!(snapshot(0).subtitles_known_on(), None);

        // Stream id reported as zero: explicitly off.
        let mut snap = snapshot(0);
        snap.subtitle_stream_id = Some(0);
        assert_eq!(snap.subtitles_known_on(), Some(false));

        // Non-zero stream id: on.
        snap.subtitle_stream_id = Some(77);
        assert_eq!(snap.subtitles_known_on(), Some(true));

        // Fine-grained flag overrides the inference.
        let snap = snap.with_fine(Some(FineGrainedStatus {
            position_ms: 0,
            subtitles_on: false,
        }));
        assert_eq!(snap.subtitles_known_on(), Some(false));
    }

    #[test]
    fn player_state_parses_unknown_as_stopped() {
        assert_eq!(PlayerState::parse("playing"), PlayerState::Playing);
        assert_eq!(PlayerState::parse("paused"), PlayerState::Paused);
        assert_eq!(PlayerState::parse("buffering"), PlayerState::Buffering);
        assert_eq!(PlayerState::parse("???"), PlayerState::Stopped);
    }
}
