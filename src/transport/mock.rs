//! In-memory [`MediaServer`] fake for registry and scheduler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    common::{
        errors::TransportError,
        types::{DeviceId, MediaKey},
    },
    session::snapshot::{FineGrainedStatus, SessionSnapshot, SubtitleStream},
    transport::MediaServer,
};

#[derive(Default)]
pub struct MockServer {
    sessions: Mutex<Vec<SessionSnapshot>>,
    fail_fetch: AtomicBool,
    subtitles: Mutex<HashMap<MediaKey, Vec<SubtitleStream>>>,
    fine: Mutex<HashMap<DeviceId, FineGrainedStatus>>,
    fail_commands: AtomicBool,
    pub subtitle_fetches: AtomicUsize,
    pub commands: Mutex<Vec<(DeviceId, Option<u64>)>>,
}

impl MockServer {
    pub fn set_sessions(&self, sessions: Vec<SessionSnapshot>) {
        *self.sessions.lock() = sessions;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_subtitles(&self, media_key: MediaKey, streams: Vec<SubtitleStream>) {
        self.subtitles.lock().insert(media_key, streams);
    }

    pub fn set_fine(&self, device_id: DeviceId, status: FineGrainedStatus) {
        self.fine.lock().insert(device_id, status);
    }

    pub fn set_fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaServer for MockServer {
    async fn fetch_sessions(&self) -> Result<Vec<SessionSnapshot>, TransportError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(TransportError::payload("/status/sessions", "mock failure"));
        }
        Ok(self.sessions.lock().clone())
    }

    async fn fetch_available_subtitles(
        &self,
        media_key: &MediaKey,
    ) -> Result<Vec<SubtitleStream>, TransportError> {
        self.subtitle_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .subtitles
            .lock()
            .get(media_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_fine_grained_status(&self, device_id: &DeviceId) -> Option<FineGrainedStatus> {
        self.fine.lock().get(device_id).copied()
    }

    async fn set_subtitle_stream(
        &self,
        device_id: &DeviceId,
        stream_id: Option<u64>,
    ) -> Result<(), TransportError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                status: 500,
                path: "/player/playback/setStreams".into(),
            });
        }
        self.commands.lock().push((device_id.clone(), stream_id));
        Ok(())
    }
}
