//! Spherical-polygon mask algebra: fragment and partition overlapping
//! cap-polygons into a disjoint, connected tiling.
//!
//! A polygon is the intersection of a small set of spherical caps; a
//! mask is a collection of polygons that may freely overlap or nest.
//! [`balkanize::balkanize`] turns such a mask into a set of polygons that
//! tile the sphere with no overlap and no multiply-connected pieces,
//! preserving area and (subject to the overlap-priority rule documented
//! on [`balkanize::balkanize`]) the original polygons' ids, pixels, and
//! weights.
//!
//! This crate does no I/O and knows nothing about any particular
//! pixelisation scheme or mask file format — see [`pixel::Pixelization`]
//! and the `balkanize` binary crate for those.

#![warn(missing_docs)]

pub mod balkanize;
pub mod config;
pub mod error;
pub mod fragment;
pub mod partition;
pub mod pixel;
pub mod polygon;
pub mod primitives;
pub mod quad;
pub mod vertices;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::balkanize::{balkanize, BalkanizeReport};
    pub use crate::config::{BalkanizeConfig, IdAssignment, LassoScope, OnCapacity, OverwriteMode};
    pub use crate::error::BalkanizeError;
    pub use crate::fragment::fragment_poly;
    pub use crate::partition::{partition_poly, PartitionOutcome};
    pub use crate::pixel::{PixelBuckets, Pixelization, UnitPixelization};
    pub use crate::polygon::{prune_poly, PixelId, Polygon, PruneOutcome};
    pub use crate::primitives::Cap;
    pub use crate::quad::Quad;
}
