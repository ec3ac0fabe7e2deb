//! Pure domain logic for the annotator service.
//!
//! Nothing in this crate touches the database or the network; the `db` and
//! `api` crates build on these types and rules.

pub mod error;
pub mod render;
pub mod types;
pub mod upload;
pub mod validation;
