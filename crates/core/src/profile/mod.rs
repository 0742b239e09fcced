//! User profiles: the per-user document and its lifecycle.

mod service;
mod types;

pub use service::{ProfileError, ProfileService};
pub use types::*;
