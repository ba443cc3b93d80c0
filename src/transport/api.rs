//! Serde models for the media server's JSON payloads.
//!
//! The server answers with XML by default; sending `Accept:
//! application/json` switches every endpoint used here to JSON. Only the
//! fields the monitor consumes are modeled; everything else is ignored.

use serde::Deserialize;

use crate::{
    common::types::{DeviceId, MediaKey, PlaybackId},
    session::snapshot::{PlayerState, SessionSnapshot, SubtitleStream},
};

/// Stream type discriminator used by the server: 1 video, 2 audio, 3 subtitle.
const STREAM_TYPE_SUBTITLE: u64 = 3;

#[derive(Debug, Deserialize)]
pub struct MediaContainerResponse {
    #[serde(rename = "MediaContainer")]
    pub container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaContainer {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<MetadataItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataItem {
    pub rating_key: Option<String>,
    /// Library key of the media item, e.g. `/library/metadata/4821`.
    pub key: Option<String>,
    pub session_key: Option<String>,
    #[serde(default)]
    pub view_offset: u64,
    #[serde(rename = "Player")]
    pub player: Option<PlayerItem>,
    #[serde(rename = "Media", default)]
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerItem {
    pub machine_identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "Part", default)]
    pub part: Vec<PartItem>,
}

#[derive(Debug, Deserialize)]
pub struct PartItem {
    #[serde(rename = "Stream", default)]
    pub stream: Vec<StreamItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamItem {
    pub id: u64,
    pub stream_type: u64,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub forced: bool,
}

/// Response to `/player/timeline/poll`.
#[derive(Debug, Deserialize)]
pub struct TimelineResponse {
    #[serde(rename = "MediaContainer")]
    pub container: TimelineContainer,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineContainer {
    #[serde(rename = "Timeline", default)]
    pub timeline: Vec<TimelineItem>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub time: u64,
    // The server spells this one with a capital ID.
    #[serde(rename = "subtitleStreamID")]
    pub subtitle_stream_id: Option<u64>,
}

impl MetadataItem {
    /// Builds a session snapshot, or `None` for entries the monitor cannot
    /// track (no player, no session key).
    pub fn into_snapshot(self) -> Option<SessionSnapshot> {
        let player = self.player?;
        let session_key = self.session_key?;
        let rating_key = self.rating_key.unwrap_or_default();
        let media_key = self
            .key
            .unwrap_or_else(|| format!("/library/metadata/{rating_key}"));

        let has_streams = self
            .media
            .iter()
            .flat_map(|m| &m.part)
            .any(|p| !p.stream.is_empty());
        let selected_subtitle = self
            .media
            .iter()
            .flat_map(|m| &m.part)
            .flat_map(|p| &p.stream)
            .find(|s| s.stream_type == STREAM_TYPE_SUBTITLE && s.selected)
            .map(|s| s.id);
        // A payload that lists streams with no subtitle selected reports
        // "explicitly off" (0); a payload with no streams reports nothing.
        let subtitle_stream_id = match (selected_subtitle, has_streams) {
            (Some(id), _) => Some(id),
            (None, true) => Some(0),
            (None, false) => None,
        };

        Some(SessionSnapshot {
            playback_id: PlaybackId::from_parts(&session_key, &rating_key),
            media_key: MediaKey(media_key),
            device_id: DeviceId(player.machine_identifier),
            player_title: player.title,
            player_state: PlayerState::parse(&player.state),
            view_offset_ms: self.view_offset,
            subtitle_stream_id,
            fine: None,
        })
    }

    /// Collects every subtitle stream on the item, selected or not. The
    /// session list omits unselected streams, so this is only meaningful on
    /// a full metadata response.
    pub fn subtitle_streams(&self) -> Vec<SubtitleStream> {
        self.media
            .iter()
            .flat_map(|m| &m.part)
            .flat_map(|p| &p.stream)
            .filter(|s| s.stream_type == STREAM_TYPE_SUBTITLE)
            .map(|s| SubtitleStream {
                id: s.id,
                display_title: s.display_title.clone().unwrap_or_default(),
                language_code: s.language_code.clone(),
                selected: s.selected,
                forced: s.forced,
            })
            .collect()
    }
}
