//! Process-wide `tracing` setup. The filter starts at `info` and is
//! replaced once settings are loaded.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
