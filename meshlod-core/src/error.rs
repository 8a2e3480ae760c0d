//! Error types for meshlod

use thiserror::Error;

/// Main error type for meshlod operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Index {index} of submesh {submesh} is out of range (vertex buffer holds {vertex_count} vertices)")]
    IndexOutOfRange {
        submesh: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Invalid LOD configuration: {0}")]
    InvalidLodConfig(String),

    #[error("Profile references an unknown vertex at ({x}, {y}, {z})")]
    UnknownProfileVertex { x: f32, y: f32, z: f32 },

    #[error("Validation failed: {0}")]
    Validation(String),
}
