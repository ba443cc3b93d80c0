use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::debug;
use uuid::Uuid;

use crate::{
    common::{
        HttpClient,
        errors::TransportError,
        types::{DeviceId, MediaKey},
    },
    configs::ServerConfig,
    session::snapshot::{FineGrainedStatus, SessionSnapshot, SubtitleStream},
    transport::api::{MediaContainerResponse, TimelineResponse},
};

/// Everything the monitor needs from the remote media server.
///
/// The registry and scheduler only ever talk through this trait, so tests
/// drive them with an in-memory fake.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Current session list. An empty list is a valid answer; an error means
    /// the fetch failed and tracked state must be retained.
    async fn fetch_sessions(&self) -> Result<Vec<SessionSnapshot>, TransportError>;

    /// Full subtitle inventory for one media item. The session list omits
    /// unselected streams, so this is queried once per newly seen session.
    async fn fetch_available_subtitles(
        &self,
        media_key: &MediaKey,
    ) -> Result<Vec<SubtitleStream>, TransportError>;

    /// Best-effort fine-grained position/subtitle read for one player.
    /// `None` on any failure; callers fall back to coarse snapshot data.
    async fn fetch_fine_grained_status(&self, device_id: &DeviceId) -> Option<FineGrainedStatus>;

    /// Select a subtitle stream on a player, or disable subtitles when
    /// `stream_id` is `None`.
    async fn set_subtitle_stream(
        &self,
        device_id: &DeviceId,
        stream_id: Option<u64>,
    ) -> Result<(), TransportError>;
}

/// Plex-style HTTP implementation of [`MediaServer`].
pub struct PlexServer {
    http: reqwest::Client,
    base_url: String,
    token: String,
    /// Identifies this monitor to the server; required by the player
    /// command endpoints.
    client_identifier: String,
}

impl PlexServer {
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        if config.url.is_empty() {
            return Err(TransportError::Config("server.url is empty".into()));
        }
        if config.token.is_empty() {
            return Err(TransportError::Config("server.token is empty".into()));
        }

        Ok(Self {
            http: HttpClient::new(config.timeout_secs)?,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client_identifier: Uuid::new_v4().to_string(),
        })
    }

    fn headers(&self, target_device: Option<&DeviceId>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(token) = HeaderValue::from_str(&self.token) {
            headers.insert("X-Plex-Token", token);
        }
        if let Ok(ident) = HeaderValue::from_str(&self.client_identifier) {
            headers.insert("X-Plex-Client-Identifier", ident);
        }
        if let Some(device) = target_device {
            if let Ok(target) = HeaderValue::from_str(device) {
                headers.insert("X-Plex-Target-Client-Identifier", target);
            }
        }
        headers
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        target_device: Option<&DeviceId>,
    ) -> Result<T, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .headers(self.headers(target_device))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::payload(path, e.to_string()))
    }
}

#[async_trait]
impl MediaServer for PlexServer {
    async fn fetch_sessions(&self) -> Result<Vec<SessionSnapshot>, TransportError> {
        let response: MediaContainerResponse = self.get_json("/status/sessions", None).await?;
        Ok(response
            .container
            .metadata
            .into_iter()
            .filter_map(|item| item.into_snapshot())
            .collect())
    }

    async fn fetch_available_subtitles(
        &self,
        media_key: &MediaKey,
    ) -> Result<Vec<SubtitleStream>, TransportError> {
        let response: MediaContainerResponse = self.get_json(media_key, None).await?;
        Ok(response
            .container
            .metadata
            .first()
            .map(|item| item.subtitle_streams())
            .unwrap_or_default())
    }

    async fn fetch_fine_grained_status(&self, device_id: &DeviceId) -> Option<FineGrainedStatus> {
        let response: TimelineResponse = match self
            .get_json("/player/timeline/poll?wait=0&commandID=1", Some(device_id))
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!("fine-grained poll unavailable for {device_id}: {e}");
                return None;
            }
        };

        response
            .container
            .timeline
            .into_iter()
            .find(|t| t.kind == "video")
            .map(|t| FineGrainedStatus {
                position_ms: t.time,
                subtitles_on: t.subtitle_stream_id.unwrap_or(0) != 0,
            })
    }

    async fn set_subtitle_stream(
        &self,
        device_id: &DeviceId,
        stream_id: Option<u64>,
    ) -> Result<(), TransportError> {
        let id = stream_id.unwrap_or(0);
        let path = format!("/player/playback/setStreams?subtitleStreamID={id}");
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .headers(self.headers(Some(device_id)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                path,
            });
        }
        Ok(())
    }
}
