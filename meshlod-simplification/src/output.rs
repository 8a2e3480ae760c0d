//! Collapse output sink
//!
//! The collapser reports every structural change through [`LodOutput`] so the
//! caller can mirror the reduction into its own index buffers.

use crate::lod_data::{LineId, LodData, TriangleId};

/// Receives triangle and line changes made by the collapser
pub trait LodOutput {
    /// `triangle` degenerated or could not be re-wired and is now removed
    fn triangle_removed(&mut self, data: &LodData, triangle: TriangleId);

    /// One corner of `triangle` now references a different vertex and index
    fn triangle_changed(&mut self, data: &LodData, triangle: TriangleId);

    fn line_removed(&mut self, data: &LodData, line: LineId);

    fn line_changed(&mut self, data: &LodData, line: LineId);

    /// Called once per generated, non-skipped LOD level
    fn bake_lod_level(&mut self, _data: &LodData, _lod_index: usize) {}
}

/// Live index lists of every submesh at one LOD level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LodIndexBuffers {
    pub lod_index: usize,
    /// One index list per submesh, in submesh order
    pub submeshes: Vec<Vec<u32>>,
}

impl LodIndexBuffers {
    pub fn index_count(&self) -> usize {
        self.submeshes.iter().map(Vec::len).sum()
    }
}

/// Reference sink that counts changes and snapshots index buffers on bake
#[derive(Debug, Clone, Default)]
pub struct IndexBufferOutput {
    pub triangles_removed: usize,
    pub triangles_changed: usize,
    pub lines_removed: usize,
    pub lines_changed: usize,
    pub levels: Vec<LodIndexBuffers>,
}

impl IndexBufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the live primitives of `data`
    pub fn index_buffers(data: &LodData, lod_index: usize) -> LodIndexBuffers {
        let mut submeshes: Vec<Vec<u32>> = data
            .index_buffer_info
            .iter()
            .map(|info| Vec::with_capacity(info.index_count))
            .collect();

        for (_, triangle) in data.live_triangles() {
            submeshes[triangle.submesh_id].extend_from_slice(&triangle.vertex_id);
        }
        for (_, line) in data.live_lines() {
            submeshes[line.submesh_id].extend_from_slice(&line.vertex_id);
        }

        debug_assert!(
            submeshes
                .iter()
                .zip(&data.index_buffer_info)
                .all(|(indices, info)| indices.len() == info.index_count),
            "live primitives disagree with the per-submesh index counts"
        );

        LodIndexBuffers {
            lod_index,
            submeshes,
        }
    }
}

impl LodOutput for IndexBufferOutput {
    fn triangle_removed(&mut self, data: &LodData, triangle: TriangleId) {
        debug_assert!(data.triangle(triangle).is_removed);
        self.triangles_removed += 1;
    }

    fn triangle_changed(&mut self, _data: &LodData, _triangle: TriangleId) {
        self.triangles_changed += 1;
    }

    fn line_removed(&mut self, data: &LodData, line: LineId) {
        debug_assert!(data.line(line).is_removed);
        self.lines_removed += 1;
    }

    fn line_changed(&mut self, _data: &LodData, _line: LineId) {
        self.lines_changed += 1;
    }

    fn bake_lod_level(&mut self, data: &LodData, lod_index: usize) {
        let buffers = Self::index_buffers(data, lod_index);
        tracing::debug!(
            lod_index,
            indices = buffers.index_count(),
            "Baked LOD index buffers"
        );
        self.levels.push(buffers);
    }
}
