//! HTTP layer: routing, handlers, middleware, and error mapping.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
