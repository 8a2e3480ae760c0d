//! LOD level configuration

use itertools::Itertools;
use meshlod_core::{Bounded, Error, Result, SourceMesh};
use serde::{Deserialize, Serialize};

use crate::cost::{ProfiledEdge, NEVER_COLLAPSE_COST};

/// How a level's reduction value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReductionMethod {
    /// Remove this fraction (0.0 to 1.0) of the unique vertices
    Proportional,
    /// Remove this many unique vertices
    Constant,
    /// Collapse everything cheaper than this cost
    CollapseCost,
}

/// One generated level of detail
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Distance value handed to the LOD selection strategy
    pub distance: f32,
    pub reduction_method: ReductionMethod,
    pub reduction_value: f32,
}

impl LodLevel {
    pub fn new(distance: f32, reduction_method: ReductionMethod, reduction_value: f32) -> Self {
        Self {
            distance,
            reduction_method,
            reduction_value,
        }
    }

    pub fn proportional(distance: f32, fraction: f32) -> Self {
        Self::new(distance, ReductionMethod::Proportional, fraction)
    }

    pub fn constant(distance: f32, vertices: usize) -> Self {
        Self::new(distance, ReductionMethod::Constant, vertices as f32)
    }

    pub fn collapse_cost(distance: f32, max_cost: f32) -> Self {
        Self::new(distance, ReductionMethod::CollapseCost, max_cost)
    }

    /// Vertex count limit and cost ceiling for a mesh of `unique_vertex_count`
    /// collapsible vertices
    pub fn vertex_count_limit(&self, unique_vertex_count: usize) -> (usize, f32) {
        match self.reduction_method {
            ReductionMethod::Proportional => {
                let removed = (unique_vertex_count as f32 * self.reduction_value) as usize;
                (unique_vertex_count.saturating_sub(removed), NEVER_COLLAPSE_COST)
            }
            ReductionMethod::Constant => (
                unique_vertex_count.saturating_sub(self.reduction_value as usize),
                NEVER_COLLAPSE_COST,
            ),
            ReductionMethod::CollapseCost => (0, self.reduction_value),
        }
    }
}

/// Settings that rarely need changing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodAdvancedConfig {
    /// Track welded vertex normals when every vertex buffer has them
    pub use_vertex_normals: bool,
    /// Fixed costs for selected directed edges
    pub profile: Vec<ProfiledEdge>,
}

impl Default for LodAdvancedConfig {
    fn default() -> Self {
        Self {
            use_vertex_normals: true,
            profile: Vec::new(),
        }
    }
}

/// Levels to generate for one mesh, from most to least detailed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LodConfig {
    pub levels: Vec<LodLevel>,
    pub advanced: LodAdvancedConfig,
}

impl LodConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, level: LodLevel) -> Self {
        self.levels.push(level);
        self
    }

    #[must_use]
    pub fn with_vertex_normals(mut self, enabled: bool) -> Self {
        self.advanced.use_vertex_normals = enabled;
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Vec<ProfiledEdge>) -> Self {
        self.advanced.profile = profile;
        self
    }

    /// Four collapse-cost levels scaled by the mesh's bounding sphere
    pub fn autoconfig(mesh: &SourceMesh) -> Self {
        let radius = mesh.bounding_sphere_radius();
        let levels = (2..=5)
            .map(|i: i32| {
                let i = i as f32;
                LodLevel::collapse_cost(3_388_608.0 / i.powi(4), radius / 100_000.0 * i.powi(5))
            })
            .collect();
        Self {
            levels,
            advanced: LodAdvancedConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(Error::InvalidLodConfig("no LOD levels configured".to_string()));
        }

        for (i, level) in self.levels.iter().enumerate() {
            if !level.distance.is_finite() {
                return Err(Error::InvalidLodConfig(format!(
                    "level {} has a non-finite distance",
                    i
                )));
            }
            if !level.reduction_value.is_finite() || level.reduction_value < 0.0 {
                return Err(Error::InvalidLodConfig(format!(
                    "level {} has an invalid reduction value {}",
                    i, level.reduction_value
                )));
            }
            if level.reduction_method == ReductionMethod::Proportional && level.reduction_value > 1.0 {
                return Err(Error::InvalidLodConfig(format!(
                    "level {} removes more than all vertices ({})",
                    i, level.reduction_value
                )));
            }
        }

        if let Some((i, _)) = self
            .levels
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| b.distance > a.distance)
        {
            return Err(Error::InvalidLodConfig(format!(
                "level {} has a larger distance than level {}",
                i + 1,
                i
            )));
        }

        Ok(())
    }
}
