//! Source mesh data structures
//!
//! A [`SourceMesh`] is the indexed description LOD generation starts from:
//! one or more vertex buffers plus submeshes that index into them. Several
//! submeshes may share one vertex buffer.

use crate::error::Error;
use crate::point::*;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Primitive topology of a submesh's index list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// Every three indices form a triangle
    TriangleList,
    /// Every two indices form a line segment
    LineList,
}

impl PrimitiveType {
    /// Number of indices per primitive
    pub fn index_stride(self) -> usize {
        match self {
            PrimitiveType::TriangleList => 3,
            PrimitiveType::LineList => 2,
        }
    }
}

/// Vertex positions and optional per-vertex normals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VertexBuffer {
    pub positions: Vec<Point3f>,
    pub normals: Option<Vec<Vector3f>>,
}

impl VertexBuffer {
    /// Create a vertex buffer from positions only
    pub fn from_positions(positions: Vec<Point3f>) -> Self {
        Self {
            positions,
            normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Set vertex normals, ignored when the count does not match
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.positions.len() {
            self.normals = Some(normals);
        }
    }
}

/// An independently indexed partition of a mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubMesh {
    /// Index of the vertex buffer in [`SourceMesh::vertex_buffers`]
    pub vertex_buffer: usize,
    pub primitive: PrimitiveType,
    pub indices: Vec<u32>,
}

impl SubMesh {
    /// Create a triangle-list submesh
    pub fn triangles(vertex_buffer: usize, faces: &[[u32; 3]]) -> Self {
        Self {
            vertex_buffer,
            primitive: PrimitiveType::TriangleList,
            indices: faces.iter().flatten().copied().collect(),
        }
    }

    /// Create a line-list submesh
    pub fn lines(vertex_buffer: usize, segments: &[[u32; 2]]) -> Self {
        Self {
            vertex_buffer,
            primitive: PrimitiveType::LineList,
            indices: segments.iter().flatten().copied().collect(),
        }
    }

    /// Get the number of primitives
    pub fn primitive_count(&self) -> usize {
        self.indices.len() / self.primitive.index_stride()
    }
}

/// An indexed mesh made of vertex buffers and submeshes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMesh {
    pub vertex_buffers: Vec<VertexBuffer>,
    pub submeshes: Vec<SubMesh>,
}

impl SourceMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single-buffer, single-submesh triangle mesh
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: &[[u32; 3]]) -> Self {
        Self {
            vertex_buffers: vec![VertexBuffer::from_positions(vertices)],
            submeshes: vec![SubMesh::triangles(0, faces)],
        }
    }

    /// Add a vertex buffer and return its index
    pub fn add_vertex_buffer(&mut self, buffer: VertexBuffer) -> usize {
        let index = self.vertex_buffers.len();
        self.vertex_buffers.push(buffer);
        index
    }

    /// Add a submesh and return its index
    pub fn add_submesh(&mut self, submesh: SubMesh) -> usize {
        let index = self.submeshes.len();
        self.submeshes.push(submesh);
        index
    }

    /// Get the total number of vertex buffer entries
    pub fn vertex_count(&self) -> usize {
        self.vertex_buffers.iter().map(VertexBuffer::vertex_count).sum()
    }

    /// Get the number of triangles over all triangle-list submeshes
    pub fn triangle_count(&self) -> usize {
        self.submeshes
            .iter()
            .filter(|s| s.primitive == PrimitiveType::TriangleList)
            .map(SubMesh::primitive_count)
            .sum()
    }

    /// Get the number of lines over all line-list submeshes
    pub fn line_count(&self) -> usize {
        self.submeshes
            .iter()
            .filter(|s| s.primitive == PrimitiveType::LineList)
            .map(SubMesh::primitive_count)
            .sum()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.submeshes.iter().all(|s| s.indices.is_empty())
    }

    /// Check buffer references, index list lengths and index ranges
    pub fn validate(&self) -> Result<()> {
        for (i, buffer) in self.vertex_buffers.iter().enumerate() {
            if let Some(normals) = &buffer.normals {
                if normals.len() != buffer.positions.len() {
                    return Err(Error::InvalidData(format!(
                        "vertex buffer {} has {} normals for {} positions",
                        i,
                        normals.len(),
                        buffer.positions.len()
                    )));
                }
            }
        }

        for (i, submesh) in self.submeshes.iter().enumerate() {
            let buffer = self.vertex_buffers.get(submesh.vertex_buffer).ok_or_else(|| {
                Error::InvalidData(format!(
                    "submesh {} references missing vertex buffer {}",
                    i, submesh.vertex_buffer
                ))
            })?;

            if submesh.indices.len() % submesh.primitive.index_stride() != 0 {
                return Err(Error::InvalidData(format!(
                    "submesh {} has {} indices, not a multiple of {}",
                    i,
                    submesh.indices.len(),
                    submesh.primitive.index_stride()
                )));
            }

            if let Some(&index) = submesh
                .indices
                .iter()
                .find(|&&index| index as usize >= buffer.vertex_count())
            {
                return Err(Error::IndexOutOfRange {
                    submesh: i,
                    index,
                    vertex_count: buffer.vertex_count(),
                });
            }
        }
        Ok(())
    }
}
