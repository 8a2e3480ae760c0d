//! Core traits for meshlod

use crate::{mesh::*, point::*};

/// Trait for objects with spatial extent
pub trait Bounded {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }

    /// Radius of the sphere around [`Bounded::center`] enclosing the object
    fn bounding_sphere_radius(&self) -> f32;
}

fn extend_bounds<'a>(
    points: impl Iterator<Item = &'a Point3f>,
    bounds: Option<(Point3f, Point3f)>,
) -> Option<(Point3f, Point3f)> {
    points.fold(bounds, |acc, p| match acc {
        None => Some((*p, *p)),
        Some((mut min, mut max)) => {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
            Some((min, max))
        }
    })
}

impl Bounded for VertexBuffer {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        extend_bounds(self.positions.iter(), None)
            .unwrap_or((Point3f::origin(), Point3f::origin()))
    }

    fn bounding_sphere_radius(&self) -> f32 {
        let center = self.center();
        self.positions
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, f32::max)
    }
}

impl Bounded for SourceMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        self.vertex_buffers
            .iter()
            .fold(None, |acc, buffer| extend_bounds(buffer.positions.iter(), acc))
            .unwrap_or((Point3f::origin(), Point3f::origin()))
    }

    fn bounding_sphere_radius(&self) -> f32 {
        let center = self.center();
        self.vertex_buffers
            .iter()
            .flat_map(|buffer| buffer.positions.iter())
            .map(|p| (p - center).norm())
            .fold(0.0, f32::max)
    }
}
