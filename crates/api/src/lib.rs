//! HTTP boundary: configuration loading, bearer middleware, and the
//! identity-provider endpoints built on `shutter-auth`.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
