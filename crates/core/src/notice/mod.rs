//! User-facing notices ("Failed to load reviews", "Profile updated").

mod handle;
mod types;

pub use handle::*;
pub use types::*;
