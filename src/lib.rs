//! Client core for an S3 access-management console: virtual folder browsing
//! over flat object keys and sequential pre-signed uploads with audit
//! notices.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod interfaces;
pub mod models;
pub mod routes;
pub mod services;
