//! HTTP Layer
//!
//! Route registration for the warp server.

pub mod routes;

pub use routes::routes;
