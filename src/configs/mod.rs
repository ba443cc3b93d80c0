pub mod base;
pub mod logging;
pub mod monitor;
pub mod server;

pub use base::*;
pub use logging::*;
pub use monitor::*;
pub use server::*;
