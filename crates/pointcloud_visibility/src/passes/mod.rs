//! One visitor per traversal purpose.
//!
//! Each pass of [`crate::VisibilityEngine::compute_visibility`] is a separate
//! forest walk with one of these visitors. They share nothing but the scene
//! graph flags and voxel LOD state, so each can be run and tested on its own.
//!
//! | Visitor | Reads | Writes |
//! |---------|-------|--------|
//! | [`FrustumCheck`] | view | `Visible`, `WholeHidden`, LOD of culled voxels |
//! | [`ClipCheck`] | clip volumes | `WholeClipped`, `PartClipped` |
//! | [`VisibilityCompute`] | view, bias, flags | LOD, priority |
//! | [`OcclusionFill`] | view, resident points | occlusion frame |
//! | [`OcclusionCull`] | occlusion frame | LOD, `WholeHidden` |
//! | [`BudgetAdjust`] | flags | LOD |
//! | [`ShortfallCompute`] | flags, point counts | shortfall map |
//! | [`StatsUpdate`] | flags, LOD | stats, visibility set |

mod budget;
mod clip_check;
mod frustum_check;
mod occlusion_cull;
mod shortfall;
mod stats_update;
mod visibility_compute;

pub use budget::{budget_scale, BudgetAdjust};
pub use clip_check::ClipCheck;
pub use frustum_check::FrustumCheck;
pub use occlusion_cull::{OcclusionCull, OcclusionFill};
pub use shortfall::{LoadedShortfallMap, ShortfallCompute};
pub use stats_update::StatsUpdate;
pub use visibility_compute::VisibilityCompute;
