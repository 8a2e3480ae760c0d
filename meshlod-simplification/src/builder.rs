//! Construction of [`LodData`] from a [`SourceMesh`]

use std::collections::HashMap;

use meshlod_core::{normalize_or, Point3f, PrimitiveType, Result, SourceMesh, Vector3f};

use crate::lod_data::{
    IndexBufferInfo, Line, LineId, LodData, Triangle, TriangleId, Vertex, VertexId,
};

/// Hash key of an exact position, with `-0.0` folded into `0.0`
fn position_key(p: &Point3f) -> [u32; 3] {
    [p.x, p.y, p.z].map(|c| if c == 0.0 { 0 } else { c.to_bits() })
}

impl LodData {
    /// Build the adjacency data set of `mesh`.
    ///
    /// Coincident vertex-buffer entries are welded into one [`Vertex`], which
    /// is flagged as a seam. Vertex normals are tracked only when requested
    /// and every vertex buffer carries them. Malformed primitives are
    /// excluded up front. Collapse costs are not computed here.
    pub fn from_mesh(mesh: &SourceMesh, use_vertex_normals: bool) -> Result<Self> {
        mesh.validate()?;

        let mut data = LodData {
            use_vertex_normals: use_vertex_normals
                && mesh.vertex_buffers.iter().all(|b| b.normals.is_some()),
            ..Default::default()
        };
        data.vertices.reserve(mesh.vertex_count());
        data.triangles.reserve(mesh.triangle_count());
        data.lines.reserve(mesh.line_count());

        let mut unique: HashMap<[u32; 3], VertexId> = HashMap::with_capacity(mesh.vertex_count());
        for buffer in &mesh.vertex_buffers {
            let mut lookup = Vec::with_capacity(buffer.vertex_count());
            for (i, position) in buffer.positions.iter().enumerate() {
                let normal = buffer
                    .normals
                    .as_ref()
                    .map(|normals| normals[i])
                    .filter(|_| data.use_vertex_normals);

                let id = match unique.get(&position_key(position)) {
                    Some(&id) => {
                        let vertex = data.vertex_mut(id);
                        vertex.seam = true;
                        if let Some(normal) = normal {
                            if vertex.normal != normal {
                                vertex.normal = normalize_or(vertex.normal + normal, Vector3f::x());
                            }
                        }
                        id
                    }
                    None => {
                        let id = VertexId(data.vertices.len());
                        let mut vertex = Vertex::new(*position);
                        if let Some(normal) = normal {
                            vertex.normal = normalize_or(normal, Vector3f::x());
                        }
                        data.vertices.push(vertex);
                        unique.insert(position_key(position), id);
                        id
                    }
                };
                lookup.push(id);
            }
            data.vertex_lookup.push(lookup);
        }

        for (submesh_id, submesh) in mesh.submeshes.iter().enumerate() {
            data.index_buffer_info.push(IndexBufferInfo {
                vertex_buffer: submesh.vertex_buffer,
                primitive: submesh.primitive,
                index_count: submesh.indices.len(),
            });
            match submesh.primitive {
                PrimitiveType::TriangleList => data.add_triangles(submesh_id, &submesh.indices),
                PrimitiveType::LineList => data.add_lines(submesh_id, &submesh.indices),
            }
        }

        Ok(data)
    }

    fn add_triangles(&mut self, submesh_id: usize, indices: &[u32]) {
        let buffer = self.index_buffer_info[submesh_id].vertex_buffer;
        for chunk in indices.chunks_exact(3) {
            let vertex_id = [chunk[0], chunk[1], chunk[2]];
            let vertex = vertex_id.map(|id| self.vertex_lookup[buffer][id as usize]);
            let t = TriangleId(self.triangles.len());
            self.triangles.push(Triangle {
                vertex,
                vertex_id,
                submesh_id,
                is_removed: false,
                normal: Vector3f::zeros(),
            });

            if self.triangles[t.0].is_malformed() {
                tracing::debug!(
                    triangle = t.0,
                    submesh = submesh_id,
                    indices = ?vertex_id,
                    "Malformed triangle excluded from LOD generation"
                );
                self.triangles[t.0].is_removed = true;
                self.index_buffer_info[submesh_id].index_count -= 3;
                continue;
            }
            self.compute_triangle_normal(t);
            self.add_triangle_to_edges(t);
        }
    }

    fn add_lines(&mut self, submesh_id: usize, indices: &[u32]) {
        let buffer = self.index_buffer_info[submesh_id].vertex_buffer;
        for chunk in indices.chunks_exact(2) {
            let vertex_id = [chunk[0], chunk[1]];
            let vertex = vertex_id.map(|id| self.vertex_lookup[buffer][id as usize]);
            let l = LineId(self.lines.len());
            self.lines.push(Line {
                vertex,
                vertex_id,
                submesh_id,
                is_removed: false,
            });

            if self.lines[l.0].is_malformed() {
                tracing::debug!(
                    line = l.0,
                    submesh = submesh_id,
                    indices = ?vertex_id,
                    "Malformed line excluded from LOD generation"
                );
                self.lines[l.0].is_removed = true;
                self.index_buffer_info[submesh_id].index_count -= 2;
                continue;
            }
            self.add_line_to_edges(l);
        }
    }
}
