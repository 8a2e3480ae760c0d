//! Progressive mesh simplification
//!
//! This crate reduces indexed triangle and line meshes into levels of detail
//! by repeatedly collapsing the cheapest edge:
//! - [`LodData`]: welded vertex/edge/primitive adjacency with a collapse queue
//! - [`CollapseCost`]: pluggable per-edge cost oracle
//! - [`LodCollapser`]: the edge collapse transformation and reduction loop
//! - [`LodOutput`]: sink mirroring removed and changed primitives
//! - [`MeshLodGenerator`]: drives the collapser through a [`LodConfig`]
//!
//! No geometric cost metric is bundled; callers supply one.

pub mod lod_data;
mod builder;
pub mod cost;
pub mod output;
pub mod collapser;
pub mod config;
pub mod generator;
#[cfg(any(test, debug_assertions, feature = "validation"))]
pub mod validation;

pub use lod_data::*;
pub use cost::*;
pub use output::*;
pub use collapser::*;
pub use config::*;
pub use generator::*;
