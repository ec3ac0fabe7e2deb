pub mod annotation;
pub mod image;
pub mod label;
