//! Reviews: records, and the live per-item review log.

mod log;
mod types;

pub use log::ReviewLog;
pub use types::*;
