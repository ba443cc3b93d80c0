pub mod entity;
pub mod registry;
pub mod snapshot;

pub use entity::ActiveSessionEntity;
pub use registry::SessionRegistry;
pub use snapshot::*;
