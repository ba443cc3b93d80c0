//! Watches active playback sessions on a remote media server and toggles
//! subtitles when a viewer rewinds, turning them off again once the original
//! position is passed, without ever fighting a user who controls subtitles
//! manually.

pub mod common;
pub mod configs;
pub mod monitor;
pub mod session;
pub mod transport;
