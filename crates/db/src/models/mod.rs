//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO holding already-validated values for inserts

pub mod annotation;
pub mod image;
pub mod label;
