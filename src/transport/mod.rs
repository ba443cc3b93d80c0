pub mod api;
pub mod client;
#[cfg(test)]
pub mod mock;

pub use client::{MediaServer, PlexServer};
