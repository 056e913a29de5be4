pub mod debug_log;
pub mod logging;

pub use debug_log::{DebugEntry, DebugLevel, DebugLog};
