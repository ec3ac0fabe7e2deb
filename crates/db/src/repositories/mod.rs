//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Read-only lookups take `&PgPool`; anything a mapper runs inside its
//! transaction accepts any [`sqlx::PgExecutor`], so callers can pass either
//! the pool or `&mut *tx`.

pub mod annotation_repo;
pub mod image_repo;
pub mod label_repo;

pub use annotation_repo::AnnotationRepo;
pub use image_repo::ImageRepo;
pub use label_repo::LabelRepo;
