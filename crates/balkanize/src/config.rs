//! Runtime configuration, replacing the original's compile-time switches.
//!
//! spec.md §9 calls for `CARRY_ON_REGARDLESS`, `ALL_ONEBOUNDARY`,
//! `ADJUST_LASSO`, `FORCE_SPLIT`, `OVERWRITE_ORIGINAL`, and `WARNMAX` to
//! become one runtime configuration struct with enumerated options. This is
//! that struct; defaults reproduce the original's compiled-in behaviour
//! (`balkanizepolys.c`'s call to `partition_poly` with `ALL_ONEBOUNDARY = 1`,
//! `ADJUST_LASSO = 1`, `FORCE_SPLIT = 1`, `OVERWRITE_ORIGINAL = 2`,
//! `WARNMAX = 8`).

use serde::{Deserialize, Serialize};

/// What to do when the output array's capacity is reached mid-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnCapacity {
    /// Stop and report `CapacityExceeded` (the non-`CARRY_ON_REGARDLESS` path).
    Abort,
    /// Keep the polygons produced so far, drop the rest, and report how many were dropped.
    Truncate,
}

/// Which polygons `partition_poly` should try to lasso.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LassoScope {
    /// Only lasso polygons with more caps than `one_boundary_cap_threshold`
    /// when they have a single boundary loop (the `ALL_ONEBOUNDARY` default).
    MultiCapOnly,
    /// Always attempt to lasso, even single-boundary-loop, few-cap polygons.
    AlwaysLasso,
}

/// How a successful lasso split folds its first child back into the caller's array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverwriteMode {
    /// The first child replaces the polygon at the original slot (the
    /// `OVERWRITE_ORIGINAL` default; both children still count toward the
    /// return value per spec.md §4.3's "not counting the in-place replacement").
    ReplaceFirst,
    /// Both children are appended and the original slot is nulled out.
    Append,
}

/// How the driver assigns ids to its output polygons (spec.md §4.5 stage 3,
/// `fmt->newid` in the original).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdAssignment {
    /// Keep each output polygon's inherited id (the default).
    Preserve,
    /// Renumber sequentially from zero, in final sort order.
    Sequential,
    /// Use each polygon's pixel id as its new id.
    PixelAsId,
}

/// Runtime configuration for [`crate::balkanize::balkanize`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BalkanizeConfig {
    /// Default angular tolerance (radians) for multiple-intersection merging
    /// and redundancy coalescing, used where a call site does not override it.
    pub mtol: f64,
    /// Behaviour when the output array's capacity is exceeded.
    pub on_capacity: OnCapacity,
    /// Scope of polygons `partition_poly` attempts to lasso.
    pub lasso_scope: LassoScope,
    /// Cap-count threshold above which a single-boundary-loop polygon is
    /// still considered for lassoing under [`LassoScope::MultiCapOnly`].
    /// spec.md leaves the exact cutoff an open, tunable question; this
    /// defaults to 4 caps (see DESIGN.md).
    pub one_boundary_cap_threshold: usize,
    /// Whether `partition_poly` tightens a lasso that fails to cleanly
    /// separate one boundary loop from the rest (`ADJUST_LASSO`).
    pub lasso_adjust: bool,
    /// Bound on lasso-tightening retries before giving up on a cap.
    pub max_lasso_adjustments: usize,
    /// Whether to force a split via the smallest-enclosing cap of one
    /// boundary loop when no lasso can be found (`FORCE_SPLIT`), reporting
    /// `PartitionIncomplete` rather than leaving the polygon disconnected.
    pub force_split: bool,
    /// How a lasso split folds its first child back into the array.
    pub overwrite_mode: OverwriteMode,
    /// Maximum number of per-category warnings to emit before collapsing
    /// into a single "... more" summary line (`WARNMAX`).
    pub max_warnings: usize,
    /// Upper bound on the driver's output array; `None` for unbounded.
    pub max_output_polygons: Option<usize>,
    /// How the driver assigns final polygon ids.
    pub id_assignment: IdAssignment,
}

impl Default for BalkanizeConfig {
    fn default() -> BalkanizeConfig {
        BalkanizeConfig {
            mtol: 1e-10,
            on_capacity: OnCapacity::Abort,
            lasso_scope: LassoScope::MultiCapOnly,
            one_boundary_cap_threshold: 4,
            lasso_adjust: true,
            max_lasso_adjustments: 20,
            force_split: true,
            overwrite_mode: OverwriteMode::ReplaceFirst,
            max_warnings: 8,
            max_output_polygons: None,
            id_assignment: IdAssignment::Preserve,
        }
    }
}
