//! Consistency checks for [`LodData`]
//!
//! Only compiled with `debug_assertions` or the `validation` feature. The
//! collapser runs them around every collapse in those builds.

use meshlod_core::{Error, Result};

use crate::cost::{CollapseCost, UNINITIALIZED_COLLAPSE_COST};
use crate::lod_data::{LodData, VertexId};

fn invalid(msg: String) -> Error {
    Error::Validation(msg)
}

/// Check every queued vertex with [`validate_vertex`]
pub fn validate_lod_data(data: &LodData) -> Result<()> {
    for vertex in data.queued_vertices() {
        validate_vertex(data, vertex)?;
    }
    Ok(())
}

/// Check the triangles and lines around `v`.
///
/// Every primitive must be live, reference `v` and have distinct corners.
/// Every corner must be queued, own an edge to its collapse target, and own
/// an edge with an initialized cost to every other corner.
pub fn validate_vertex(data: &LodData, v: VertexId) -> Result<()> {
    let vertex = data.vertex(v);

    for &t in &vertex.triangles {
        let triangle = data.triangle(t);
        if triangle.is_removed {
            return Err(invalid(format!("vertex {:?} references removed triangle {:?}", v, t)));
        }
        if !triangle.has_vertex(v) {
            return Err(invalid(format!("triangle {:?} does not reference vertex {:?}", t, v)));
        }
        if triangle.is_malformed() {
            return Err(invalid(format!("triangle {:?} has duplicate corners", t)));
        }
        validate_corners(data, &triangle.vertex)?;
    }

    for &l in &vertex.lines {
        let line = data.line(l);
        if line.is_removed {
            return Err(invalid(format!("vertex {:?} references removed line {:?}", v, l)));
        }
        if !line.has_vertex(v) {
            return Err(invalid(format!("line {:?} does not reference vertex {:?}", l, v)));
        }
        if line.is_malformed() {
            return Err(invalid(format!("line {:?} has duplicate ends", l)));
        }
        validate_corners(data, &line.vertex)?;
    }
    Ok(())
}

fn validate_corners(data: &LodData, corners: &[VertexId]) -> Result<()> {
    for &corner in corners {
        let vertex = data.vertex(corner);
        if data.collapse_cost(corner).is_none() {
            return Err(invalid(format!("vertex {:?} is not queued", corner)));
        }
        match vertex.collapse_to {
            Some(to) if vertex.find_edge(to).is_some() => {}
            to => {
                return Err(invalid(format!(
                    "vertex {:?} collapses to {:?} without an edge",
                    corner, to
                )))
            }
        }
        if vertex.find_edge(corner).is_some() {
            return Err(invalid(format!("vertex {:?} has an edge to itself", corner)));
        }
        for &other in corners.iter().filter(|&&other| other != corner) {
            match vertex.find_edge(other) {
                Some(edge) if edge.collapse_cost != UNINITIALIZED_COLLAPSE_COST => {}
                Some(_) => {
                    return Err(invalid(format!(
                        "edge {:?} -> {:?} has an uninitialized cost",
                        corner, other
                    )))
                }
                None => {
                    return Err(invalid(format!("edge {:?} -> {:?} is missing", corner, other)))
                }
            }
        }
    }
    Ok(())
}

/// Check that every live primitive's indices resolve to its vertices.
///
/// Also checks that corner indices are distinct and that each submesh's
/// index count matches its live primitives.
pub fn validate_index_consistency(data: &LodData) -> Result<()> {
    let mut live_indices = vec![0usize; data.index_buffer_info.len()];

    let triangles = data
        .live_triangles()
        .map(|(t, tri)| (format!("{:?}", t), tri.submesh_id, &tri.vertex[..], &tri.vertex_id[..]));
    let lines = data
        .live_lines()
        .map(|(l, line)| (format!("{:?}", l), line.submesh_id, &line.vertex[..], &line.vertex_id[..]));

    for (name, submesh_id, vertices, ids) in triangles.chain(lines) {
        let lookup = &data.vertex_lookup[data.index_buffer_info[submesh_id].vertex_buffer];
        for (i, (&vertex, &id)) in vertices.iter().zip(ids).enumerate() {
            if ids[..i].contains(&id) {
                return Err(invalid(format!("{} repeats index {}", name, id)));
            }
            if lookup.get(id as usize) != Some(&vertex) {
                return Err(invalid(format!(
                    "{} index {} does not resolve to vertex {:?}",
                    name, id, vertex
                )));
            }
        }
        live_indices[submesh_id] += ids.len();
    }

    for (submesh_id, (info, live)) in data.index_buffer_info.iter().zip(live_indices).enumerate() {
        if info.index_count != live {
            return Err(invalid(format!(
                "submesh {} counts {} indices but {} are live",
                submesh_id, info.index_count, live
            )));
        }
    }
    Ok(())
}

/// Check that the cached costs of `v`'s edges match the oracle
pub fn validate_collapse_costs(
    data: &LodData,
    cost: &mut dyn CollapseCost,
    v: VertexId,
) -> Result<()> {
    for edge in &data.vertex(v).edges {
        let expected = cost.compute_edge_collapse_cost(data, v, edge);
        if edge.collapse_cost != expected {
            return Err(invalid(format!(
                "edge {:?} -> {:?} caches cost {} but the oracle computes {}",
                v, edge.dst, edge.collapse_cost, expected
            )));
        }
    }
    Ok(())
}

/// Check the cached costs of `v` and of every neighbour of `v`
pub fn validate_neighborhood_costs(
    data: &LodData,
    cost: &mut dyn CollapseCost,
    v: VertexId,
) -> Result<()> {
    validate_collapse_costs(data, cost, v)?;
    for edge in &data.vertex(v).edges {
        validate_collapse_costs(data, cost, edge.dst)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lod_data::Edge;
    use meshlod_core::{Point3f, SourceMesh};

    struct DistanceCost;

    impl CollapseCost for DistanceCost {
        fn compute_edge_collapse_cost(&mut self, data: &LodData, src: VertexId, edge: &Edge) -> f32 {
            (data.vertex(src).position - data.vertex(edge.dst).position).norm()
        }
    }

    fn make_quad() -> LodData {
        let mesh = SourceMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        );
        let mut data = LodData::from_mesh(&mesh, false).unwrap();
        DistanceCost.init_collapse_costs(&mut data);
        data
    }

    #[test]
    fn test_valid_data_passes() {
        let data = make_quad();
        assert!(validate_lod_data(&data).is_ok());
        assert!(validate_index_consistency(&data).is_ok());
        for i in 0..4 {
            assert!(validate_neighborhood_costs(&data, &mut DistanceCost, VertexId(i)).is_ok());
        }
    }

    #[test]
    fn test_uninitialized_edge_detected() {
        let mut data = make_quad();
        data.vertex_mut(VertexId(1)).edges[0].collapse_cost = UNINITIALIZED_COLLAPSE_COST;
        assert!(matches!(validate_vertex(&data, VertexId(0)), Err(Error::Validation(_))));
    }

    #[test]
    fn test_unqueued_corner_detected() {
        let mut data = make_quad();
        data.dequeue_vertex(VertexId(3));
        assert!(validate_vertex(&data, VertexId(0)).is_err());
        assert!(validate_lod_data(&data).is_err());
    }

    #[test]
    fn test_stale_cost_detected() {
        let mut data = make_quad();
        data.vertex_mut(VertexId(2)).position = Point3f::new(2.0, 2.0, 0.0);
        assert!(validate_collapse_costs(&data, &mut DistanceCost, VertexId(0)).is_err());
        assert!(validate_neighborhood_costs(&data, &mut DistanceCost, VertexId(1)).is_err());
        assert!(validate_collapse_costs(&data, &mut DistanceCost, VertexId(3)).is_err());
    }

    #[test]
    fn test_index_mismatch_detected() {
        let mut data = make_quad();
        data.triangles[0].vertex_id[0] = 3;
        assert!(validate_index_consistency(&data).is_err());

        let mut data = make_quad();
        data.index_buffer_info[0].index_count = 3;
        assert!(validate_index_consistency(&data).is_err());
    }
}
