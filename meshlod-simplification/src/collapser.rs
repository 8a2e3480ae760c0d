//! Edge collapse
//!
//! [`LodCollapser::collapse`] drains the collapse queue of a [`LodData`]
//! until a vertex count or a cost ceiling is reached. Each step merges the
//! cheapest vertex into its collapse target, destroys the primitives that
//! straddled the collapsed edge and re-wires the rest of the source vertex's
//! fan onto the target.

use std::mem;

use meshlod_core::Point3f;

use crate::cost::{CollapseCost, NEVER_COLLAPSE_COST, UNINITIALIZED_COLLAPSE_COST};
use crate::lod_data::{LineId, LodData, TriangleId, VertexId};
use crate::output::LodOutput;

/// Vertex-buffer index `src_id` was replaced by `dst_id` in one submesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapsedEdge {
    pub src_id: u32,
    pub dst_id: u32,
    pub submesh_id: usize,
}

/// Index replacements recorded during a single collapse
#[derive(Debug, Clone, Default)]
pub struct CollapsedEdges {
    edges: Vec<CollapsedEdge>,
}

impl CollapsedEdges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn has_src_id(&self, src_id: u32, submesh_id: usize) -> bool {
        self.edges
            .iter()
            .any(|e| e.src_id == src_id && e.submesh_id == submesh_id)
    }

    /// Record a replacement; the first one recorded for `(src_id, submesh_id)` wins
    pub fn record(&mut self, src_id: u32, dst_id: u32, submesh_id: usize) {
        if !self.has_src_id(src_id, submesh_id) {
            self.edges.push(CollapsedEdge {
                src_id,
                dst_id,
                submesh_id,
            });
        }
    }

    /// Index replacing `src_id` in `submesh_id`.
    ///
    /// An exact match is preferred. Otherwise any replacement recorded for the
    /// same submesh is usable. `None` when the submesh has no replacement.
    pub fn find_dst_id(&self, src_id: u32, submesh_id: usize) -> Option<u32> {
        self.edges
            .iter()
            .find(|e| e.src_id == src_id && e.submesh_id == submesh_id)
            .or_else(|| self.edges.iter().find(|e| e.submesh_id == submesh_id))
            .map(|e| e.dst_id)
    }
}

/// Reduces a [`LodData`] by repeated edge collapses
#[derive(Debug, Clone)]
pub struct LodCollapser {
    last_reduced_vertex: Option<VertexId>,
    recompute_normals: bool,
}

impl Default for LodCollapser {
    fn default() -> Self {
        Self {
            last_reduced_vertex: None,
            recompute_normals: true,
        }
    }
}

impl LodCollapser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the face normal of every re-wired triangle
    #[must_use]
    pub fn with_normal_recompute(mut self, enabled: bool) -> Self {
        self.recompute_normals = enabled;
        self
    }

    /// Collapse the cheapest vertices until at most `vertex_count_limit`
    /// vertices are queued or the cheapest collapse costs at least
    /// `collapse_cost_limit`.
    ///
    /// Vertices whose cost is [`NEVER_COLLAPSE_COST`] are never collapsed.
    /// Returns the number of collapses performed.
    ///
    /// # Panics
    ///
    /// Panics if an uninitialized cost reaches the head of the queue or if
    /// the adjacency data is inconsistent.
    pub fn collapse(
        &mut self,
        data: &mut LodData,
        cost: &mut dyn CollapseCost,
        output: &mut dyn LodOutput,
        vertex_count_limit: usize,
        collapse_cost_limit: f32,
    ) -> usize {
        let mut collapses = 0;
        let mut stopped_by_cost = false;

        while data.queued_vertex_count() > vertex_count_limit {
            let Some((vertex, head_cost)) = data.peek_collapse() else {
                break;
            };
            assert_ne!(
                head_cost, UNINITIALIZED_COLLAPSE_COST,
                "vertex {:?} reached the head of the collapse queue without a cost",
                vertex
            );
            if head_cost >= collapse_cost_limit || head_cost == NEVER_COLLAPSE_COST {
                stopped_by_cost = true;
                break;
            }
            self.last_reduced_vertex = Some(vertex);
            self.collapse_vertex(data, cost, output, vertex);
            collapses += 1;
        }

        tracing::debug!(
            collapses,
            queued = data.queued_vertex_count(),
            vertex_count_limit,
            collapse_cost_limit,
            stopped_by_cost,
            "Collapse run finished"
        );
        collapses
    }

    /// Merge `src` into its collapse target.
    ///
    /// # Panics
    ///
    /// Panics if `src` is not queued with a collapsible cost, owns no edge or
    /// primitive, or has no edge to its collapse target.
    pub fn collapse_vertex(
        &mut self,
        data: &mut LodData,
        cost: &mut dyn CollapseCost,
        output: &mut dyn LodOutput,
        src: VertexId,
    ) {
        let queued = data.collapse_cost(src);
        assert!(
            matches!(queued, Some(c) if c != NEVER_COLLAPSE_COST && c != UNINITIALIZED_COLLAPSE_COST),
            "vertex {:?} is not collapsible (queued cost {:?})",
            src,
            queued
        );
        let vertex = data.vertex(src);
        assert!(!vertex.edges.is_empty(), "vertex {:?} has no edges", src);
        assert!(
            !vertex.triangles.is_empty() || !vertex.lines.is_empty(),
            "vertex {:?} has no triangles or lines",
            src
        );
        let dst = match vertex.collapse_to {
            Some(dst) if vertex.find_edge(dst).is_some() => dst,
            to => panic!("vertex {:?} has no edge to its collapse target {:?}", src, to),
        };

        #[cfg(any(debug_assertions, feature = "validation"))]
        {
            check(crate::validation::validate_vertex(data, src));
            check(crate::validation::validate_vertex(data, dst));
        }

        let triangles = mem::take(&mut data.vertex_mut(src).triangles);
        let lines = mem::take(&mut data.vertex_mut(src).lines);
        let mut collapsed = CollapsedEdges::new();

        for &t in &triangles {
            let triangle = data.triangle(t);
            if let Some(dst_id) = triangle.vertex_id_of(dst) {
                if let Some(src_id) = triangle.vertex_id_of(src) {
                    collapsed.record(src_id, dst_id, triangle.submesh_id);
                }
                remove_triangle(data, output, t, src);
            }
        }
        for &l in &lines {
            let line = data.line(l);
            if let Some(dst_id) = line.vertex_id_of(dst) {
                if let Some(src_id) = line.vertex_id_of(src) {
                    collapsed.record(src_id, dst_id, line.submesh_id);
                }
                remove_line(data, output, l, src);
            }
        }

        assert!(
            !collapsed.is_empty(),
            "no primitive of vertex {:?} contains its collapse target {:?}",
            src,
            dst
        );
        assert!(
            data.vertex(dst).find_edge(src).is_none(),
            "edge {:?} -> {:?} survived the collapse",
            dst,
            src
        );

        for &t in &triangles {
            let triangle = data.triangle(t);
            if triangle.is_removed {
                continue;
            }
            let src_id = match triangle.vertex_id_of(src) {
                Some(id) => id,
                None => panic!("triangle {:?} lost vertex {:?}", t, src),
            };
            match collapsed.find_dst_id(src_id, triangle.submesh_id) {
                Some(dst_id) => {
                    data.replace_triangle_vertex(t, src, dst_id, dst);
                    if self.recompute_normals {
                        data.compute_triangle_normal(t);
                    }
                    output.triangle_changed(data, t);
                }
                None => remove_triangle(data, output, t, src),
            }
        }
        for &l in &lines {
            let line = data.line(l);
            if line.is_removed {
                continue;
            }
            let src_id = match line.vertex_id_of(src) {
                Some(id) => id,
                None => panic!("line {:?} lost vertex {:?}", l, src),
            };
            match collapsed.find_dst_id(src_id, line.submesh_id) {
                Some(dst_id) => {
                    data.replace_line_vertex(l, src, dst_id, dst);
                    output.line_changed(data, l);
                }
                None => remove_line(data, output, l, src),
            }
        }

        if data.vertex(src).seam {
            data.vertex_mut(dst).seam = true;
        }

        let neighbours: Vec<VertexId> = data.vertex(src).edges.iter().map(|e| e.dst).collect();
        for &n in &neighbours {
            cost.update_vertex_collapse_cost(data, n);
        }

        data.dequeue_vertex(src);
        data.vertex_mut(src).edges = Vec::new();

        #[cfg(any(debug_assertions, feature = "validation"))]
        {
            for &n in &neighbours {
                check(crate::validation::validate_collapse_costs(data, &mut *cost, n));
            }
            if data.collapse_cost(dst).is_some() {
                check(crate::validation::validate_vertex(data, dst));
            }
        }

        tracing::trace!(src = src.0, dst = dst.0, replacements = collapsed.len(), "Collapsed vertex");
    }

    /// The vertex removed by the most recent collapse
    pub fn last_reduced_vertex(&self) -> Option<VertexId> {
        self.last_reduced_vertex
    }

    /// Position of the vertex removed by the most recent collapse
    pub fn last_reduced_position(&self, data: &LodData) -> Option<Point3f> {
        self.last_reduced_vertex.map(|v| data.vertex(v).position)
    }

    /// Position of the vertex the most recent collapse merged into
    pub fn last_reduced_collapse_to_position(&self, data: &LodData) -> Option<Point3f> {
        self.last_reduced_vertex
            .and_then(|v| data.vertex(v).collapse_to)
            .map(|to| data.vertex(to).position)
    }
}

fn remove_triangle(data: &mut LodData, output: &mut dyn LodOutput, t: TriangleId, src: VertexId) {
    let submesh_id = data.triangle(t).submesh_id;
    data.triangles[t.0].is_removed = true;
    data.index_buffer_info[submesh_id].index_count -= 3;
    output.triangle_removed(data, t);
    data.remove_triangle_from_edges(t, src);
}

fn remove_line(data: &mut LodData, output: &mut dyn LodOutput, l: LineId, src: VertexId) {
    let submesh_id = data.line(l).submesh_id;
    data.lines[l.0].is_removed = true;
    data.index_buffer_info[submesh_id].index_count -= 2;
    output.line_removed(data, l);
    data.remove_line_from_edges(l, src);
}

#[cfg(any(debug_assertions, feature = "validation"))]
fn check(result: meshlod_core::Result<()>) {
    if let Err(err) = result {
        panic!("{}", err);
    }
}
