//! Reversible hashid identifiers for database entities.
//!
//! [`hashid::HashidCodec`] turns numeric primary keys into short opaque strings and back,
//! and [`services::HashidService`] assigns them to entities on first save and resolves
//! entities from them. The binary serves shortened URLs whose short codes are hashids.

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod hashid;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod types;
pub mod validations;
