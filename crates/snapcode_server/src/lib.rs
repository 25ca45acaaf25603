//! HTTP surface of the conversion gateway.
pub mod config;
pub mod routes;

pub use config::ServerArgs;
pub use routes::routes;
