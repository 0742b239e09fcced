//! Phone catalog: the item model, the session cache and client-side
//! filtering.

pub mod facets;
mod filter;
mod store;
mod types;

pub use facets::Facets;
pub use filter::*;
pub use store::CatalogStore;
pub use types::*;
