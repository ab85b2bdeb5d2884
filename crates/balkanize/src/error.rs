//! Error types.
//!
//! spec.md §7 splits failures into two classes: per-polygon geometric
//! problems, which are recovered locally (logged via `tracing::warn!` and
//! the polygon is skipped — see [`crate::balkanize::BalkanizeReport`]), and
//! capacity/allocation failures, which are fatal and surfaced to the
//! caller. Only the latter class appears as a variant here; the former is
//! not modelled as `Result::Err` at all, per the original's propagation
//! policy.

use thiserror::Error;

/// Fatal errors from the core engine (spec.md §7's `CAPACITY_EXCEEDED` and
/// `ALLOCATION_FAILED`, plus the `FAIL` return of `prune_poly` escalated
/// when a caller has no reasonable recovery).
#[derive(Debug, Error)]
pub enum BalkanizeError {
    /// A geometric routine could not resolve an intersection within
    /// tolerance even after the caller's retries (spec.md's
    /// `NUMERIC_DEGENERACY`), escalated because no fallback remained.
    #[error("numeric degeneracy on polygon {polygon_id}: {detail}")]
    NumericDegeneracy {
        /// Id of the offending polygon.
        polygon_id: i64,
        /// Human-readable description of what could not be resolved.
        detail: String,
    },

    /// Growing the output array failed (modelled with `Vec::try_reserve`,
    /// mirroring the original's checked `malloc`).
    #[error("failed to allocate storage for {requested} polygons")]
    AllocationFailed {
        /// Number of polygon slots that were being requested.
        requested: usize,
    },

    /// The output array's configured capacity was exceeded and
    /// `on_capacity` was `Abort`.
    #[error("output capacity exceeded: produced {produced}, capacity {capacity}")]
    CapacityExceeded {
        /// Number of polygons produced before the limit was hit.
        produced: usize,
        /// The configured capacity.
        capacity: usize,
    },
}
