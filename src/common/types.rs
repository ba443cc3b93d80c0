/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

/// Identifies one continuous playback on one player. Changes when the
/// media changes, even if the server reuses its session key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PlaybackId(pub String);

impl PlaybackId {
    /// Composite of the server session key and the media rating key, so an
    /// episode change under the same session key yields a fresh id.
    pub fn from_parts(session_key: &str, rating_key: &str) -> Self {
        Self(format!("{session_key}:{rating_key}"))
    }
}

impl From<String> for PlaybackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::ops::Deref for PlaybackId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque library key for one media item (e.g. `/library/metadata/4821`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MediaKey(pub String);

impl From<String> for MediaKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::ops::Deref for MediaKey {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for MediaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable machine identifier of a remote player/device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::ops::Deref for DeviceId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
