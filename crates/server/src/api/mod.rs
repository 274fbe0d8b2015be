pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod video;

pub use error::ApiError;
pub use routes::create_router;
