//! Multi-level LOD generation
//!
//! [`MeshLodGenerator`] builds the adjacency data of a mesh once, then walks
//! the configured levels from most to least detailed. Each level continues
//! collapsing from where the previous one stopped, so every level is a
//! reduction of the previous one.

use meshlod_core::{Result, SourceMesh};

use crate::collapser::LodCollapser;
use crate::config::{LodConfig, LodLevel};
use crate::cost::{CollapseCost, ProfiledCollapseCost};
use crate::lod_data::LodData;
use crate::output::LodOutput;

/// What one configured level produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodLevelOutcome {
    pub lod_index: usize,
    /// Collapsible vertices left at this level
    pub unique_vertex_count: usize,
    /// The level reduced nothing compared with the last baked level
    pub skipped: bool,
}

/// Drives the collapser across every level of a [`LodConfig`]
#[derive(Debug, Clone)]
pub struct MeshLodGenerator {
    recompute_normals: bool,
}

impl Default for MeshLodGenerator {
    fn default() -> Self {
        Self {
            recompute_normals: true,
        }
    }
}

impl MeshLodGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute face normals of re-wired triangles while collapsing
    #[must_use]
    pub fn with_normal_recompute(mut self, enabled: bool) -> Self {
        self.recompute_normals = enabled;
        self
    }

    /// Generate every level of `config` for `mesh`.
    ///
    /// `output` is notified of every collapse and asked to bake each level
    /// that is not skipped.
    pub fn generate_lod_levels(
        &self,
        mesh: &SourceMesh,
        config: &LodConfig,
        cost: &mut dyn CollapseCost,
        output: &mut dyn LodOutput,
    ) -> Result<Vec<LodLevelOutcome>> {
        config.validate()?;
        tracing::info!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            lines = mesh.line_count(),
            levels = config.levels.len(),
            "Generating LOD levels"
        );

        let mut data = LodData::from_mesh(mesh, config.advanced.use_vertex_normals)?;

        let outcomes = if config.advanced.profile.is_empty() {
            self.generate_from_data(&mut data, &config.levels, cost, output)?
        } else {
            let mut profiled = ProfiledCollapseCost::new(cost, &data, &config.advanced.profile)?;
            self.generate_from_data(&mut data, &config.levels, &mut profiled, output)?
        };

        tracing::info!(
            baked = outcomes.iter().filter(|o| !o.skipped).count(),
            skipped = outcomes.iter().filter(|o| o.skipped).count(),
            "LOD generation finished"
        );
        Ok(outcomes)
    }

    /// Initialise the costs of `data` and reduce it through `levels`
    pub fn generate_from_data(
        &self,
        data: &mut LodData,
        levels: &[LodLevel],
        cost: &mut dyn CollapseCost,
        output: &mut dyn LodOutput,
    ) -> Result<Vec<LodLevelOutcome>> {
        cost.init_collapse_costs(data);

        let unique_vertex_count = data.queued_vertex_count();
        let mut collapser = LodCollapser::new().with_normal_recompute(self.recompute_normals);
        let mut vertex_count = unique_vertex_count;
        let mut last_bake_vertex_count = unique_vertex_count;
        let mut outcomes = Vec::with_capacity(levels.len());

        for (lod_index, level) in levels.iter().enumerate() {
            let (vertex_count_limit, collapse_cost_limit) =
                level.vertex_count_limit(unique_vertex_count);
            if vertex_count_limit < vertex_count {
                collapser.collapse(data, cost, output, vertex_count_limit, collapse_cost_limit);
                vertex_count = data.queued_vertex_count();
            }

            let skipped = vertex_count == last_bake_vertex_count;
            if !skipped {
                last_bake_vertex_count = vertex_count;
                #[cfg(any(debug_assertions, feature = "validation"))]
                {
                    crate::validation::validate_index_consistency(data)?;
                    crate::validation::validate_lod_data(data)?;
                }
                output.bake_lod_level(data, lod_index);
            }

            tracing::info!(
                lod_index,
                distance = level.distance,
                unique_vertices = vertex_count,
                triangles = data.live_triangle_count(),
                lines = data.live_line_count(),
                skipped,
                "LOD level generated"
            );
            outcomes.push(LodLevelOutcome {
                lod_index,
                unique_vertex_count: vertex_count,
                skipped,
            });
        }

        Ok(outcomes)
    }
}
