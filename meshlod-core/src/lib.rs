//! Core data structures and traits for meshlod
//!
//! This crate provides the fundamental types shared by the LOD generation
//! crates: indexed source meshes split into submeshes, point and vector
//! aliases, bounding traits and the common error type.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// Common result type for meshlod operations
pub type Result<T> = std::result::Result<T, Error>;
