pub mod auth;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod favorites;
pub mod handlers;
pub mod middleware;
pub mod profile;
pub mod reviews;
pub mod routes;
pub mod ws;

pub use error::{ApiError, ErrorResponse};
pub use extract::{ApiJson, ApiQuery};
pub use routes::create_router;
pub use ws::WsMessage;
