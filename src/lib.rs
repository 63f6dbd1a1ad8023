pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod server;

pub use routes::AppState;
pub use server::{build_state, create_router};
