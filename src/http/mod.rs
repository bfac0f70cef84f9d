//! HTTP surface over the inventory

pub mod middleware;
pub mod routes;

pub use routes::build_router;
