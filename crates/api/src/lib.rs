//! Annotator API server library.
//!
//! Exposes the building blocks (config, state, error handling, mappers,
//! routes) so integration tests and the binary entrypoint can both access
//! them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod mappers;
pub mod multipart;
pub mod query;
pub mod router;
pub mod routes;
pub mod state;
pub mod storage;
