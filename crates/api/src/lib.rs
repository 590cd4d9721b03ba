//! HTTP API: routing, request/response mapping and the permission guards.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
