//! Collapse cost oracle
//!
//! A [`CollapseCost`] implementation supplies the cost of collapsing one
//! directed edge. The provided methods keep the per-edge caches and the
//! collapse queue of a [`LodData`] in sync with those costs.
//!
//! Costs are compared as plain scalars: lower collapses first. Two sentinel
//! values exist, [`NEVER_COLLAPSE_COST`] for edges that must be preserved and
//! [`UNINITIALIZED_COLLAPSE_COST`] for caches not computed yet.
//!
//! Costs are refreshed for the first-order neighbourhood of every collapsed
//! vertex only. An implementation may therefore read the source vertex's own
//! fan (edges, triangles, lines) and both endpoints of the edge, but must not
//! depend on the fans of other vertices.

use std::collections::HashMap;

use meshlod_core::{Error, Point3f, Result};
use serde::{Deserialize, Serialize};

use crate::lod_data::{Edge, LodData, VertexId};

/// The edge must never be collapsed
pub const NEVER_COLLAPSE_COST: f32 = f32::MAX;

/// The cost has not been computed yet
pub const UNINITIALIZED_COLLAPSE_COST: f32 = f32::INFINITY;

/// Computes and caches edge collapse costs
pub trait CollapseCost {
    /// Cost of collapsing `src` along `edge`.
    ///
    /// Must be a pure function of the current state of `data`, and must
    /// never return [`UNINITIALIZED_COLLAPSE_COST`].
    fn compute_edge_collapse_cost(&mut self, data: &LodData, src: VertexId, edge: &Edge) -> f32;

    /// Refresh every outgoing edge cost of `vertex`.
    ///
    /// Returns the cheapest cost and its destination; the first edge wins on
    /// ties. A vertex without edges yields
    /// `(UNINITIALIZED_COLLAPSE_COST, None)`.
    fn compute_vertex_collapse_cost(
        &mut self,
        data: &mut LodData,
        vertex: VertexId,
    ) -> (f32, Option<VertexId>) {
        let mut collapse_cost = UNINITIALIZED_COLLAPSE_COST;
        let mut collapse_to = None;
        for i in 0..data.vertex(vertex).edges.len() {
            let edge = data.vertex(vertex).edges[i];
            let cost = self.compute_edge_collapse_cost(data, vertex, &edge);
            data.vertex_mut(vertex).edges[i].collapse_cost = cost;
            if collapse_cost > cost {
                collapse_cost = cost;
                collapse_to = Some(edge.dst);
            }
        }
        (collapse_cost, collapse_to)
    }

    /// Compute the costs of a vertex that is not queued yet and queue it
    fn init_vertex_collapse_cost(&mut self, data: &mut LodData, vertex: VertexId) {
        assert!(
            !data.vertex(vertex).edges.is_empty(),
            "vertex {:?} has no edges to collapse along",
            vertex
        );
        let (cost, collapse_to) = self.compute_vertex_collapse_cost(data, vertex);
        data.vertex_mut(vertex).collapse_to = collapse_to;
        data.queue_vertex(vertex, cost);
    }

    /// Recompute the costs of `vertex` after its neighbourhood changed.
    ///
    /// The queue entry is only touched when the cost or the target changed.
    /// A vertex left without edges drops out of the queue.
    fn update_vertex_collapse_cost(&mut self, data: &mut LodData, vertex: VertexId) {
        let (cost, collapse_to) = self.compute_vertex_collapse_cost(data, vertex);
        let queued = data.collapse_cost(vertex);
        if data.vertex(vertex).collapse_to != collapse_to || queued != Some(cost) {
            data.dequeue_vertex(vertex);
            if cost != UNINITIALIZED_COLLAPSE_COST {
                data.vertex_mut(vertex).collapse_to = collapse_to;
                data.queue_vertex(vertex, cost);
            } else {
                data.vertex_mut(vertex).collapse_to = None;
            }
        }
    }

    /// Compute the costs of every referenced vertex and fill the queue
    fn init_collapse_costs(&mut self, data: &mut LodData) {
        data.clear_collapse_costs();
        for i in 0..data.vertices.len() {
            let vertex = VertexId(i);
            if !data.vertex(vertex).edges.is_empty() {
                self.init_vertex_collapse_cost(data, vertex);
            } else {
                tracing::debug!(
                    vertex = i,
                    position = ?data.vertex(vertex).position,
                    "Unused vertex excluded from LOD generation"
                );
            }
        }
    }
}

impl<C: CollapseCost + ?Sized> CollapseCost for &mut C {
    fn compute_edge_collapse_cost(&mut self, data: &LodData, src: VertexId, edge: &Edge) -> f32 {
        (**self).compute_edge_collapse_cost(data, src, edge)
    }
}

impl<C: CollapseCost + ?Sized> CollapseCost for Box<C> {
    fn compute_edge_collapse_cost(&mut self, data: &LodData, src: VertexId, edge: &Edge) -> f32 {
        (**self).compute_edge_collapse_cost(data, src, edge)
    }
}

/// Fixed cost for collapsing the vertex at `src` into the vertex at `dst`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfiledEdge {
    pub src: Point3f,
    pub dst: Point3f,
    pub cost: f32,
}

/// Overrides the costs of selected edges with profiled values
pub struct ProfiledCollapseCost<C> {
    inner: C,
    lookup: HashMap<(VertexId, VertexId), f32>,
}

impl<C: CollapseCost> ProfiledCollapseCost<C> {
    /// Resolve `profile` positions against `data`.
    ///
    /// Positions must match a vertex exactly.
    pub fn new(inner: C, data: &LodData, profile: &[ProfiledEdge]) -> Result<Self> {
        let find = |p: &Point3f| {
            data.vertices
                .iter()
                .position(|v| v.position == *p)
                .map(VertexId)
                .ok_or(Error::UnknownProfileVertex {
                    x: p.x,
                    y: p.y,
                    z: p.z,
                })
        };

        let mut lookup = HashMap::with_capacity(profile.len());
        for entry in profile {
            lookup.insert((find(&entry.src)?, find(&entry.dst)?), entry.cost);
        }
        Ok(Self { inner, lookup })
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: CollapseCost> CollapseCost for ProfiledCollapseCost<C> {
    fn compute_edge_collapse_cost(&mut self, data: &LodData, src: VertexId, edge: &Edge) -> f32 {
        match self.lookup.get(&(src, edge.dst)) {
            Some(&cost) => cost,
            None => self.inner.compute_edge_collapse_cost(data, src, edge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lod_data::Vertex;

    struct DistanceCost;

    impl CollapseCost for DistanceCost {
        fn compute_edge_collapse_cost(&mut self, data: &LodData, src: VertexId, edge: &Edge) -> f32 {
            (data.vertex(src).position - data.vertex(edge.dst).position).norm()
        }
    }

    fn make_fan() -> LodData {
        let mut data = LodData {
            vertices: vec![
                Vertex::new(Point3f::new(0.0, 0.0, 0.0)),
                Vertex::new(Point3f::new(3.0, 0.0, 0.0)),
                Vertex::new(Point3f::new(0.0, 1.0, 0.0)),
                Vertex::new(Point3f::new(5.0, 5.0, 5.0)),
            ],
            ..Default::default()
        };
        for n in [1, 2] {
            data.add_edge(VertexId(0), VertexId(n));
            data.add_edge(VertexId(n), VertexId(0));
        }
        data
    }

    #[test]
    fn test_sentinel_order() {
        assert!(NEVER_COLLAPSE_COST < UNINITIALIZED_COLLAPSE_COST);
    }

    #[test]
    fn test_compute_vertex_collapse_cost_picks_cheapest() {
        let mut data = make_fan();
        let (cost, to) = DistanceCost.compute_vertex_collapse_cost(&mut data, VertexId(0));
        assert_eq!(cost, 1.0);
        assert_eq!(to, Some(VertexId(2)));
        assert_eq!(data.vertex(VertexId(0)).edges[0].collapse_cost, 3.0);
        assert_eq!(data.vertex(VertexId(0)).edges[1].collapse_cost, 1.0);

        let (cost, to) = DistanceCost.compute_vertex_collapse_cost(&mut data, VertexId(3));
        assert_eq!(cost, UNINITIALIZED_COLLAPSE_COST);
        assert_eq!(to, None);
    }

    #[test]
    fn test_init_skips_unused_vertices() {
        let mut data = make_fan();
        DistanceCost.init_collapse_costs(&mut data);
        assert_eq!(data.queued_vertex_count(), 3);
        assert_eq!(data.collapse_cost(VertexId(3)), None);
        assert_eq!(data.peek_collapse(), Some((VertexId(0), 1.0)));
        assert_eq!(data.vertex(VertexId(1)).collapse_to, Some(VertexId(0)));
    }

    #[test]
    fn test_update_requeues_and_drops() {
        let mut data = make_fan();
        DistanceCost.init_collapse_costs(&mut data);

        data.vertex_mut(VertexId(2)).position = Point3f::new(0.0, 4.0, 0.0);
        DistanceCost.update_vertex_collapse_cost(&mut data, VertexId(0));
        assert_eq!(data.collapse_cost(VertexId(0)), Some(3.0));
        assert_eq!(data.vertex(VertexId(0)).collapse_to, Some(VertexId(1)));

        data.remove_edge(VertexId(1), VertexId(0));
        DistanceCost.update_vertex_collapse_cost(&mut data, VertexId(1));
        assert_eq!(data.collapse_cost(VertexId(1)), None);
        assert_eq!(data.vertex(VertexId(1)).collapse_to, None);
    }

    #[test]
    fn test_profile_overrides_cost() {
        let mut data = make_fan();
        let profile = [ProfiledEdge {
            src: Point3f::new(0.0, 0.0, 0.0),
            dst: Point3f::new(3.0, 0.0, 0.0),
            cost: 0.25,
        }];
        let mut cost = ProfiledCollapseCost::new(DistanceCost, &data, &profile).unwrap();
        cost.init_collapse_costs(&mut data);

        assert_eq!(data.collapse_cost(VertexId(0)), Some(0.25));
        assert_eq!(data.vertex(VertexId(0)).collapse_to, Some(VertexId(1)));
        // Profiles are directed.
        assert_eq!(data.collapse_cost(VertexId(1)), Some(3.0));
    }

    #[test]
    fn test_profile_unknown_vertex() {
        let data = make_fan();
        let profile = [ProfiledEdge {
            src: Point3f::new(9.0, 9.0, 9.0),
            dst: Point3f::new(0.0, 0.0, 0.0),
            cost: 0.0,
        }];
        let result = ProfiledCollapseCost::new(DistanceCost, &data, &profile);
        assert!(matches!(result, Err(Error::UnknownProfileVertex { .. })));
    }
}
