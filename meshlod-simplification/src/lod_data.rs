//! Mesh adjacency model
//!
//! [`LodData`] owns every vertex, triangle and line of a mesh being reduced
//! in flat arenas. Entities refer to each other through [`VertexId`],
//! [`TriangleId`] and [`LineId`] handles, which stay valid for the whole
//! lifetime of the data set: collapsing only marks primitives as removed and
//! clears the adjacency sets of retired vertices, nothing is ever freed from
//! the arenas.

use meshlod_core::{normalize_or, Point3f, PrimitiveType, Vector3f};
use priority_queue::PriorityQueue;
use std::cmp::Ordering;

use crate::cost::UNINITIALIZED_COLLAPSE_COST;

/// Handle of a [`Vertex`] in [`LodData::vertices`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

/// Handle of a [`Triangle`] in [`LodData::triangles`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriangleId(pub usize);

/// Handle of a [`Line`] in [`LodData::lines`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub usize);

/// Directed possible-collapse relation from the owning vertex to `dst`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub dst: VertexId,
    /// Cost of collapsing the owning vertex into `dst`
    pub collapse_cost: f32,
    /// Number of primitives contributing this edge
    pub ref_count: u32,
}

impl Edge {
    fn new(dst: VertexId) -> Self {
        Self {
            dst,
            collapse_cost: UNINITIALIZED_COLLAPSE_COST,
            ref_count: 1,
        }
    }
}

/// A unique mesh-space position.
///
/// One vertex may stand for several coincident vertex-buffer entries, for
/// example on both sides of a UV seam.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Point3f,
    pub normal: Vector3f,
    /// Vertex this one merges into when collapsed
    pub collapse_to: Option<VertexId>,
    pub seam: bool,
    pub edges: Vec<Edge>,
    pub triangles: Vec<TriangleId>,
    pub lines: Vec<LineId>,
}

impl Vertex {
    pub fn new(position: Point3f) -> Self {
        Self {
            position,
            normal: Vector3f::zeros(),
            collapse_to: None,
            seam: false,
            edges: Vec::new(),
            triangles: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Find the outgoing edge towards `dst`
    pub fn find_edge(&self, dst: VertexId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.dst == dst)
    }

    /// A border vertex owns an edge used by a single primitive
    pub fn is_border(&self) -> bool {
        self.edges.iter().any(|e| e.ref_count == 1)
    }
}

#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertex: [VertexId; 3],
    /// Vertex-buffer index of each corner, in the submesh's index space
    pub vertex_id: [u32; 3],
    pub submesh_id: usize,
    pub is_removed: bool,
    pub normal: Vector3f,
}

impl Triangle {
    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.vertex.contains(&v)
    }

    /// Vertex-buffer index of the corner referencing `v`
    pub fn vertex_id_of(&self, v: VertexId) -> Option<u32> {
        self.vertex
            .iter()
            .position(|&corner| corner == v)
            .map(|i| self.vertex_id[i])
    }

    /// Two corners reference the same vertex
    pub fn is_malformed(&self) -> bool {
        self.vertex[0] == self.vertex[1]
            || self.vertex[0] == self.vertex[2]
            || self.vertex[1] == self.vertex[2]
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    pub vertex: [VertexId; 2],
    pub vertex_id: [u32; 2],
    pub submesh_id: usize,
    pub is_removed: bool,
}

impl Line {
    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.vertex.contains(&v)
    }

    pub fn vertex_id_of(&self, v: VertexId) -> Option<u32> {
        self.vertex
            .iter()
            .position(|&end| end == v)
            .map(|i| self.vertex_id[i])
    }

    pub fn is_malformed(&self) -> bool {
        self.vertex[0] == self.vertex[1]
    }
}

/// Per-submesh bookkeeping
#[derive(Debug, Clone)]
pub struct IndexBufferInfo {
    pub vertex_buffer: usize,
    pub primitive: PrimitiveType,
    /// Indices still live at the current LOD level
    pub index_count: usize,
}

/// Priority of a vertex in the collapse queue.
///
/// Ordered so the cheapest collapse has the highest priority; equal costs
/// fall back to the lower vertex handle.
#[derive(Debug, Clone, Copy)]
pub struct CollapseCostKey {
    pub cost: f32,
    pub vertex: VertexId,
}

impl PartialEq for CollapseCostKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CollapseCostKey {}

impl PartialOrd for CollapseCostKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CollapseCostKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Adjacency data set of a mesh under reduction
#[derive(Debug, Clone, Default)]
pub struct LodData {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub lines: Vec<Line>,
    pub index_buffer_info: Vec<IndexBufferInfo>,
    /// Vertex-buffer index to vertex lookup, one table per vertex buffer
    pub vertex_lookup: Vec<Vec<VertexId>>,
    /// Whether vertex normals are tracked
    pub use_vertex_normals: bool,
    pub(crate) collapse_cost_heap: PriorityQueue<VertexId, CollapseCostKey>,
}

impl LodData {
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v.0]
    }

    pub fn vertex_mut(&mut self, v: VertexId) -> &mut Vertex {
        &mut self.vertices[v.0]
    }

    pub fn triangle(&self, t: TriangleId) -> &Triangle {
        &self.triangles[t.0]
    }

    pub fn line(&self, l: LineId) -> &Line {
        &self.lines[l.0]
    }

    // ---- Collapse cost queue ----

    /// Number of vertices waiting in the collapse queue
    pub fn queued_vertex_count(&self) -> usize {
        self.collapse_cost_heap.len()
    }

    /// Queued collapse cost of `v`, `None` if it is not queued
    pub fn collapse_cost(&self, v: VertexId) -> Option<f32> {
        self.collapse_cost_heap.get_priority(&v).map(|key| key.cost)
    }

    /// Cheapest queued vertex and its cost
    pub fn peek_collapse(&self) -> Option<(VertexId, f32)> {
        self.collapse_cost_heap
            .peek()
            .map(|(&vertex, key)| (vertex, key.cost))
    }

    /// Queue `v` with `cost`, replacing any previous entry
    pub fn queue_vertex(&mut self, v: VertexId, cost: f32) {
        self.collapse_cost_heap
            .push(v, CollapseCostKey { cost, vertex: v });
    }

    /// Remove `v` from the queue, returning its cost
    pub fn dequeue_vertex(&mut self, v: VertexId) -> Option<f32> {
        self.collapse_cost_heap.remove(&v).map(|(_, key)| key.cost)
    }

    /// Queued vertices in no particular order
    pub fn queued_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.collapse_cost_heap.iter().map(|(&v, _)| v)
    }

    pub(crate) fn clear_collapse_costs(&mut self) {
        self.collapse_cost_heap.clear();
    }

    // ---- Live geometry ----

    pub fn live_triangle_count(&self) -> usize {
        self.triangles.iter().filter(|t| !t.is_removed).count()
    }

    pub fn live_line_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.is_removed).count()
    }

    pub fn live_triangles(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_removed)
            .map(|(i, t)| (TriangleId(i), t))
    }

    pub fn live_lines(&self) -> impl Iterator<Item = (LineId, &Line)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_removed)
            .map(|(i, l)| (LineId(i), l))
    }

    // ---- Edges ----

    /// Add the edge `v -> dst`, or bump its reference count
    pub fn add_edge(&mut self, v: VertexId, dst: VertexId) {
        assert_ne!(v, dst, "vertex {:?} cannot have an edge to itself", v);
        let edges = &mut self.vertices[v.0].edges;
        match edges.iter_mut().find(|e| e.dst == dst) {
            Some(edge) => edge.ref_count += 1,
            None => edges.push(Edge::new(dst)),
        }
    }

    /// Drop one reference of the edge `v -> dst`, removing it at zero
    pub fn remove_edge(&mut self, v: VertexId, dst: VertexId) {
        let edges = &mut self.vertices[v.0].edges;
        let Some(pos) = edges.iter().position(|e| e.dst == dst) else {
            panic!("edge {:?} -> {:?} does not exist", v, dst);
        };
        if edges[pos].ref_count == 1 {
            edges.remove(pos);
        } else {
            edges[pos].ref_count -= 1;
        }
    }

    // ---- Triangles ----

    pub fn compute_triangle_normal(&mut self, t: TriangleId) {
        let [a, b, c] = self.triangles[t.0].vertex;
        let e1 = self.vertices[b.0].position - self.vertices[a.0].position;
        let e2 = self.vertices[c.0].position - self.vertices[b.0].position;
        self.triangles[t.0].normal = normalize_or(e1.cross(&e2), Vector3f::zeros());
    }

    /// Register `t` with its corners and add its six directed edges
    pub fn add_triangle_to_edges(&mut self, t: TriangleId) {
        let corners = self.triangles[t.0].vertex;
        for &v in &corners {
            let triangles = &mut self.vertices[v.0].triangles;
            if !triangles.contains(&t) {
                triangles.push(t);
            }
        }
        for i in 0..3 {
            for n in 0..3 {
                if i != n {
                    self.add_edge(corners[i], corners[n]);
                }
            }
        }
    }

    /// Detach `t` from its corners and drop its edges.
    ///
    /// The corner `skip` is left untouched; it is the vertex whose triangle
    /// list is being walked by the caller.
    pub fn remove_triangle_from_edges(&mut self, t: TriangleId, skip: VertexId) {
        let corners = self.triangles[t.0].vertex;
        for &v in corners.iter().filter(|&&v| v != skip) {
            self.vertices[v.0].triangles.retain(|&other| other != t);
        }
        for i in 0..3 {
            if corners[i] == skip {
                continue;
            }
            for n in 0..3 {
                if i != n {
                    self.remove_edge(corners[i], corners[n]);
                }
            }
        }
    }

    /// Re-wire the corner of `t` referencing `src` to `dst` with index `dst_id`.
    ///
    /// Edges owned by `src` are left alone, `src` is being retired.
    pub fn replace_triangle_vertex(&mut self, t: TriangleId, src: VertexId, dst_id: u32, dst: VertexId) {
        let triangles = &mut self.vertices[dst.0].triangles;
        if !triangles.contains(&t) {
            triangles.push(t);
        }

        let corners = self.triangles[t.0].vertex;
        let Some(i) = corners.iter().position(|&v| v == src) else {
            panic!("triangle {:?} does not reference vertex {:?}", t, src);
        };
        for (n, &other) in corners.iter().enumerate() {
            if n != i {
                self.remove_edge(other, src);
                self.add_edge(other, dst);
                self.add_edge(dst, other);
            }
        }
        let triangle = &mut self.triangles[t.0];
        triangle.vertex[i] = dst;
        triangle.vertex_id[i] = dst_id;
    }

    // ---- Lines ----

    pub fn add_line_to_edges(&mut self, l: LineId) {
        let [a, b] = self.lines[l.0].vertex;
        for v in [a, b] {
            let lines = &mut self.vertices[v.0].lines;
            if !lines.contains(&l) {
                lines.push(l);
            }
        }
        self.add_edge(a, b);
        self.add_edge(b, a);
    }

    pub fn remove_line_from_edges(&mut self, l: LineId, skip: VertexId) {
        let [a, b] = self.lines[l.0].vertex;
        for (v, other) in [(a, b), (b, a)] {
            if v != skip {
                self.vertices[v.0].lines.retain(|&line| line != l);
                self.remove_edge(v, other);
            }
        }
    }

    pub fn replace_line_vertex(&mut self, l: LineId, src: VertexId, dst_id: u32, dst: VertexId) {
        let lines = &mut self.vertices[dst.0].lines;
        if !lines.contains(&l) {
            lines.push(l);
        }

        let ends = self.lines[l.0].vertex;
        let Some(i) = ends.iter().position(|&v| v == src) else {
            panic!("line {:?} does not reference vertex {:?}", l, src);
        };
        let other = ends[1 - i];
        self.remove_edge(other, src);
        self.add_edge(other, dst);
        self.add_edge(dst, other);

        let line = &mut self.lines[l.0];
        line.vertex[i] = dst;
        line.vertex_id[i] = dst_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data(positions: &[[f32; 3]]) -> LodData {
        LodData {
            vertices: positions
                .iter()
                .map(|p| Vertex::new(Point3f::new(p[0], p[1], p[2])))
                .collect(),
            ..Default::default()
        }
    }

    fn push_triangle(data: &mut LodData, corners: [usize; 3]) -> TriangleId {
        let t = TriangleId(data.triangles.len());
        data.triangles.push(Triangle {
            vertex: corners.map(VertexId),
            vertex_id: corners.map(|c| c as u32),
            submesh_id: 0,
            is_removed: false,
            normal: Vector3f::zeros(),
        });
        data.add_triangle_to_edges(t);
        t
    }

    #[test]
    fn test_edge_ref_counting() {
        let mut data = make_data(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let (a, b) = (VertexId(0), VertexId(1));
        data.add_edge(a, b);
        data.add_edge(a, b);
        assert_eq!(data.vertex(a).find_edge(b).map(|e| e.ref_count), Some(2));

        data.remove_edge(a, b);
        assert_eq!(data.vertex(a).find_edge(b).map(|e| e.ref_count), Some(1));
        data.remove_edge(a, b);
        assert!(data.vertex(a).find_edge(b).is_none());
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn test_remove_missing_edge_panics() {
        let mut data = make_data(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        data.remove_edge(VertexId(0), VertexId(1));
    }

    #[test]
    #[should_panic(expected = "to itself")]
    fn test_self_edge_panics() {
        let mut data = make_data(&[[0.0, 0.0, 0.0]]);
        data.add_edge(VertexId(0), VertexId(0));
    }

    #[test]
    fn test_shared_diagonal_edge_ref_count() {
        let mut data = make_data(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        push_triangle(&mut data, [0, 1, 2]);
        push_triangle(&mut data, [0, 2, 3]);

        let v0 = data.vertex(VertexId(0));
        assert_eq!(v0.triangles.len(), 2);
        assert_eq!(v0.edges.len(), 3);
        assert_eq!(v0.find_edge(VertexId(2)).map(|e| e.ref_count), Some(2));
        assert!(v0.is_border());
    }

    #[test]
    fn test_remove_triangle_skips_vertex() {
        let mut data = make_data(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let t = push_triangle(&mut data, [0, 1, 2]);
        data.remove_triangle_from_edges(t, VertexId(0));

        assert_eq!(data.vertex(VertexId(0)).triangles, vec![t]);
        assert_eq!(data.vertex(VertexId(0)).edges.len(), 2);
        assert!(data.vertex(VertexId(1)).edges.is_empty());
        assert!(data.vertex(VertexId(2)).triangles.is_empty());
    }

    #[test]
    fn test_replace_triangle_vertex() {
        let mut data = make_data(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        let t = push_triangle(&mut data, [0, 1, 2]);
        data.replace_triangle_vertex(t, VertexId(0), 3, VertexId(3));

        let tri = data.triangle(t);
        assert_eq!(tri.vertex, [VertexId(3), VertexId(1), VertexId(2)]);
        assert_eq!(tri.vertex_id, [3, 1, 2]);
        assert!(data.vertex(VertexId(1)).find_edge(VertexId(0)).is_none());
        assert!(data.vertex(VertexId(1)).find_edge(VertexId(3)).is_some());
        assert!(data.vertex(VertexId(3)).find_edge(VertexId(2)).is_some());
        assert_eq!(data.vertex(VertexId(3)).triangles, vec![t]);
    }

    #[test]
    fn test_triangle_normal() {
        let mut data = make_data(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let t = push_triangle(&mut data, [0, 1, 2]);
        data.compute_triangle_normal(t);
        assert_eq!(data.triangle(t).normal, Vector3f::z());
    }

    #[test]
    fn test_queue_orders_by_cost_then_vertex() {
        let mut data = make_data(&[[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        data.queue_vertex(VertexId(0), 2.0);
        data.queue_vertex(VertexId(2), 1.0);
        data.queue_vertex(VertexId(1), 1.0);
        assert_eq!(data.peek_collapse(), Some((VertexId(1), 1.0)));

        assert_eq!(data.dequeue_vertex(VertexId(1)), Some(1.0));
        assert_eq!(data.peek_collapse(), Some((VertexId(2), 1.0)));

        data.queue_vertex(VertexId(0), 0.5);
        assert_eq!(data.queued_vertex_count(), 2);
        assert_eq!(data.collapse_cost(VertexId(0)), Some(0.5));
        assert_eq!(data.peek_collapse(), Some((VertexId(0), 0.5)));
    }

    #[test]
    fn test_line_edges() {
        let mut data = make_data(&[[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        data.lines.push(Line {
            vertex: [VertexId(0), VertexId(1)],
            vertex_id: [0, 1],
            submesh_id: 0,
            is_removed: false,
        });
        data.add_line_to_edges(LineId(0));
        assert!(data.vertex(VertexId(1)).find_edge(VertexId(0)).is_some());

        data.replace_line_vertex(LineId(0), VertexId(0), 2, VertexId(2));
        assert_eq!(data.line(LineId(0)).vertex, [VertexId(2), VertexId(1)]);
        assert!(data.vertex(VertexId(1)).find_edge(VertexId(0)).is_none());
        assert!(data.vertex(VertexId(2)).find_edge(VertexId(1)).is_some());
        assert_eq!(data.vertex(VertexId(2)).lines, vec![LineId(0)]);
    }
}
