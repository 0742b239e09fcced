//! Remote document database: catalog, user documents and reviews.
//!
//! The application only talks to the traits in this module. `SqliteStore`
//! implements all of them on one connection and publishes every committed
//! write on a change feed so live listeners can push fresh snapshots.

mod sqlite;
mod subscription;
mod traits;
mod types;

pub use sqlite::SqliteStore;
pub use subscription::*;
pub use traits::*;
pub use types::*;
