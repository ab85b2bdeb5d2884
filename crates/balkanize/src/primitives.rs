//! Spherical primitives: caps, axis vectors, and the `cm = 1 - cos(theta)`
//! distance convention used throughout this crate.
//!
//! A cap is `{ x : 1 - r.x < cm }` for `cm >= 0`, or the complement of that
//! set (same axis, unsigned radius `-cm`) for `cm < 0`. `cm == 0` is a null
//! (empty) cap, used as a tombstone by [`crate::polygon`].
//!
//! References
//! - TH: spec.md §3 ("Data model"), §4.1 ("Spherical primitives and pruning").

use nalgebra::Vector3;

use crate::quad::{dot3_quad, Quad};

/// A spherical cap: axis `r` (unit vector) and `cm = 1 - cos(theta)` (signed).
#[derive(Clone, Copy, Debug)]
pub struct Cap {
    /// Unit vector at the centre of the cap.
    pub axis: Vector3<f64>,
    /// `1 - cos(theta)`, negative to denote the complement of the unsigned cap.
    pub cm: Quad,
}

impl Cap {
    /// Builds a cap from an (unnormalised) axis and signed `cm`. The axis is normalised.
    pub fn new(axis: Vector3<f64>, cm: Quad) -> Cap {
        Cap {
            axis: axis.normalize(),
            cm,
        }
    }

    /// Whether this is the null (empty) cap tombstone.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.cm == Quad::ZERO
    }

    /// Whether this cap is stored in complemented form (`cm < 0`).
    #[inline]
    pub fn is_complemented(&self) -> bool {
        self.cm < Quad::ZERO
    }

    /// The complement of this cap: same axis, opposite region.
    #[inline]
    pub fn complement(&self) -> Cap {
        Cap {
            axis: self.axis,
            cm: -self.cm,
        }
    }

    /// `cm` of `x` with respect to this cap's axis, `1 - r.x`, in extended precision.
    #[inline]
    pub fn cm_of(&self, x: Vector3<f64>) -> Quad {
        cm_between(self.axis, x)
    }

    /// Whether unit vector `x` lies in this cap's region (§4.1's "cap-on-unit-vector test").
    pub fn contains(&self, x: Vector3<f64>) -> bool {
        let cm_x = self.cm_of(x);
        if self.cm >= Quad::ZERO {
            cm_x < self.cm
        } else {
            cm_x >= -self.cm
        }
    }

    /// Whether unit vector `x` lies in this cap's region, enlarged/shrunk by `tol`
    /// (an angular tolerance in radians, converted to an additive slack on `cm`).
    pub fn contains_tol(&self, x: Vector3<f64>, tol: f64) -> bool {
        let slack = Quad::from_f64(tol * tol / 2.0);
        let cm_x = self.cm_of(x);
        if self.cm >= Quad::ZERO {
            cm_x < self.cm + slack
        } else {
            cm_x >= -self.cm - slack
        }
    }

    /// Effective unsigned angular extent, `cm` if `cm >= 0` else `2 + cm`
    /// (the convention used by the original's `cmminf`/smallest-cap routines).
    #[inline]
    pub fn extent(&self) -> Quad {
        if self.cm >= Quad::ZERO {
            self.cm
        } else {
            Quad::from_f64(2.0) + self.cm
        }
    }

    /// Angular radius theta, in `[0, pi]`, ignoring the complement sign.
    pub fn theta(&self) -> f64 {
        theta_of_cm(self.extent())
    }

    /// Two caps are mutually exclusive (their regions never both hold) when
    /// the angular separation of their axes exceeds the sum of their angular
    /// radii, for two ordinary (non-complemented) caps. Complemented caps
    /// can only be mutually exclusive with another cap in degenerate
    /// (near-antipodal) configurations handled by the fuller redundancy
    /// analysis in [`crate::polygon::prune_poly`]; this is the cheap,
    /// common-case test.
    pub fn disjoint_from(&self, other: &Cap, tol: f64) -> bool {
        if self.is_complemented() || other.is_complemented() {
            return false;
        }
        let cm_sep = cm_between(self.axis, other.axis);
        let th_sep = theta_of_cm(cm_sep);
        let sum = self.theta() + other.theta();
        th_sep > sum + tol
    }
}

/// `cm = 1 - a.b`, the extended-precision distance convention (`cmij` in the original).
#[inline]
pub fn cm_between(a: Vector3<f64>, b: Vector3<f64>) -> Quad {
    Quad::from_f64(1.0) - dot3_quad([a.x, a.y, a.z], [b.x, b.y, b.z])
}

/// `cm` from an angular radius `theta` (radians).
#[inline]
pub fn cm_of_theta(theta: f64) -> Quad {
    Quad::from_f64(1.0 - theta.cos())
}

/// Angular radius `theta` (radians, in `[0, pi]`) from an (unsigned, non-negative) `cm`.
#[inline]
pub fn theta_of_cm(cm: Quad) -> f64 {
    (1.0 - cm.to_f64()).clamp(-1.0, 1.0).acos()
}

/// Smallest-extent cap of a polygon: index and effective extent of the most
/// restrictive cap, by the `cmminf` convention (complemented caps compared by
/// `2 + cm`). Returns `None` for an empty cap list.
pub fn smallest_cap(caps: &[Cap]) -> Option<(usize, Quad)> {
    caps.iter()
        .map(|c| c.extent())
        .enumerate()
        .fold(None, |acc, (i, e)| match acc {
            None => Some((i, e)),
            Some((_, best)) if e < best => Some((i, e)),
            some => some,
        })
}

/// Azimuth/elevation (radians) to unit vector, the minimal `azel -> rp` helper
/// the core needs for its own vertex bookkeeping (spec.md §6: the angle/frame
/// collaborator owns everything beyond this).
pub fn azel_to_unit(az: f64, el: f64) -> Vector3<f64> {
    let (sin_el, cos_el) = el.sin_cos();
    let (sin_az, cos_az) = az.sin_cos();
    Vector3::new(cos_el * cos_az, cos_el * sin_az, sin_el)
}

/// Unit vector to azimuth/elevation (radians), the `rp -> azel` counterpart.
pub fn unit_to_azel(v: Vector3<f64>) -> (f64, f64) {
    let az = v.y.atan2(v.x);
    let el = v.z.clamp(-1.0, 1.0).asin();
    (az, el)
}
