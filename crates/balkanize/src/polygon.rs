//! Polygon representation and housekeeping: allocation, copying, cap
//! trimming, and redundancy pruning.
//!
//! spec.md §3 defines a polygon as the intersection of a finite,
//! explicitly-owned list of caps plus `{id, pixel, weight}`, with an empty
//! cap list denoting the whole sphere. §4.1 defines `prune_poly`'s
//! contract. Where the original leaned on a global scratch buffer and
//! `malloc`/`realloc` bookkeeping (`room_poly`), a `Vec<Cap>` already gives
//! growth-on-push and owned storage for free, so there is no separate
//! "allocate with growth" routine here — `Vec::push`/`Vec::extend` is it.

use nalgebra::Vector3;

use crate::error::BalkanizeError;
use crate::primitives::Cap;
use crate::quad::Quad;

/// Spatial-index bucket id; meaningful only in relation to whatever
/// [`crate::pixel::Pixelization`] assigned it (spec.md §6).
pub type PixelId = u32;

/// A polygon: the intersection of its caps, plus identity/weight metadata.
///
/// Invariant (spec.md §3): while "live" (owned by a slot the driver treats
/// as non-empty), no cap has `cm == 0`, and every cap's axis is unit
/// length (enforced by [`Cap::new`]). An empty `caps` list means "whole
/// sphere".
#[derive(Clone, Debug)]
pub struct Polygon {
    /// The caps whose intersection defines this polygon's region.
    pub caps: Vec<Cap>,
    /// Caller-assigned identity, preserved through fragmentation and
    /// partitioning unless [`crate::config::IdAssignment`] says otherwise.
    pub id: i64,
    /// Spatial-index bucket this polygon lives in.
    pub pixel: PixelId,
    /// Caller-assigned weight (e.g. a survey completeness fraction),
    /// carried through untouched.
    pub weight: f64,
}

impl Polygon {
    /// Builds a polygon from caps and metadata.
    pub fn new(caps: Vec<Cap>, id: i64, pixel: PixelId, weight: f64) -> Polygon {
        Polygon {
            caps,
            id,
            pixel,
            weight,
        }
    }

    /// The whole-sphere polygon (no caps).
    pub fn whole_sphere(id: i64, pixel: PixelId, weight: f64) -> Polygon {
        Polygon {
            caps: Vec::new(),
            id,
            pixel,
            weight,
        }
    }

    /// `gptin`: a point lies in the polygon iff it lies in every cap.
    pub fn contains(&self, x: Vector3<f64>) -> bool {
        self.caps.iter().all(|c| c.contains(x))
    }

    /// Tolerant membership test (`eps > 0` enlarges, `eps < 0` shrinks each
    /// cap), used by the fragmenter and partitioner's feasibility checks.
    pub fn contains_tol(&self, x: Vector3<f64>, tol: f64) -> bool {
        self.caps.iter().all(|c| c.contains_tol(x, tol))
    }

    /// Appends a cap to the polygon (the `Vec` growth the original's
    /// `room_poly` had to do by hand).
    pub fn push_cap(&mut self, cap: Cap) {
        self.caps.push(cap);
    }

    /// Whether any cap currently makes the polygon the null-cap tombstone.
    pub fn has_null_cap(&self) -> bool {
        self.caps.iter().any(Cap::is_null)
    }
}

/// Result of [`prune_poly`]: the normal form a polygon settled into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneOutcome {
    /// The polygon was kept (possibly with caps coalesced/removed in place).
    Kept,
    /// The polygon bounds zero area and should be discarded.
    Empty,
    /// Every remaining cap was vacuous; the polygon is the whole sphere.
    /// `poly.caps` is left empty.
    WholeSphere,
}

/// Normalises a polygon's cap list in place (spec.md §4.1).
///
/// - `Empty` if any cap is null, or any pair of caps is mutually exclusive.
/// - `WholeSphere` if every remaining cap is vacuous (covers the whole
///   sphere); `poly.caps` is cleared.
/// - Otherwise coalesces near-duplicate caps (same axis and radius within
///   `tol`, keeping the tighter) and drops caps rendered redundant by a
///   tighter cap sharing (approximately) the same axis, returning `Kept`.
///
/// `tol` is an angular tolerance in radians; callers may relax it and
/// retry on repeated `Empty`/numeric-degeneracy results, per spec.md.
pub fn prune_poly(poly: &mut Polygon, tol: f64) -> Result<PruneOutcome, BalkanizeError> {
    if poly.has_null_cap() {
        return Ok(PruneOutcome::Empty);
    }

    for i in 0..poly.caps.len() {
        for j in (i + 1)..poly.caps.len() {
            if poly.caps[i].disjoint_from(&poly.caps[j], tol) {
                return Ok(PruneOutcome::Empty);
            }
        }
    }

    coalesce_duplicates(&mut poly.caps, tol);
    remove_redundant(&mut poly.caps, tol);

    if poly.caps.iter().all(is_vacuous) {
        poly.caps.clear();
        return Ok(PruneOutcome::WholeSphere);
    }

    Ok(PruneOutcome::Kept)
}

/// A cap that imposes no constraint: an ordinary cap with `cm >= 2`
/// (angular radius `pi`, i.e. the whole sphere up to a measure-zero point).
fn is_vacuous(cap: &Cap) -> bool {
    !cap.is_complemented() && cap.cm.to_f64() >= 2.0
}

/// Merges caps whose axis and angular radius coincide within `tol`,
/// keeping the tighter (smaller `cm`) of each coincident group. This is
/// the "near-coincident cap boundaries...are merged" half of spec.md
/// §4.1; it does not touch caps at different radii around the same axis
/// (e.g. an annulus's outer/inner pair), which are legitimate distinct
/// constraints, not duplicates.
fn coalesce_duplicates(caps: &mut Vec<Cap>, tol: f64) {
    let mut keep = vec![true; caps.len()];
    for i in 0..caps.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..caps.len() {
            if !keep[j] {
                continue;
            }
            if is_near_duplicate(&caps[i], &caps[j], tol) {
                if caps[j].cm < caps[i].cm {
                    caps.swap(i, j);
                }
                keep[j] = false;
            }
        }
    }
    let mut it = keep.iter();
    caps.retain(|_| *it.next().unwrap());
}

fn is_near_duplicate(a: &Cap, b: &Cap, tol: f64) -> bool {
    if a.is_complemented() != b.is_complemented() {
        return false;
    }
    let axis_sep = crate::primitives::theta_of_cm(crate::primitives::cm_between(a.axis, b.axis));
    if axis_sep > tol {
        return false;
    }
    (a.cm.to_f64() - b.cm.to_f64()).abs() < tol
}

/// Drops a cap when another cap on (approximately) the same axis already
/// implies it, and — for caps on distinct axes — when one ordinary cap's
/// disk is wholly contained in another's (a cheap, common-case
/// containment test: `separation(axis_i, axis_j) + theta_j <= theta_i`
/// means cap `j` already forces cap `i`).
///
/// This does not attempt the original's full multi-cap LP-style
/// redundancy elimination (see DESIGN.md): pruning is a normalisation and
/// efficiency step, not a correctness requirement — fragmentation and
/// partitioning remain correct in the presence of extra, non-maximal
/// caps.
fn remove_redundant(caps: &mut Vec<Cap>, tol: f64) {
    caps.retain(|c| !is_vacuous(c) || caps.len() == 1);
    let n = caps.len();
    let mut keep = vec![true; n];
    for i in 0..n {
        if !keep[i] {
            continue;
        }
        for j in 0..n {
            if i == j || !keep[j] {
                continue;
            }
            if caps[i].is_complemented() || caps[j].is_complemented() {
                continue;
            }
            let sep = crate::primitives::theta_of_cm(crate::primitives::cm_between(
                caps[i].axis,
                caps[j].axis,
            ));
            if sep + caps[j].theta() <= caps[i].theta() + tol {
                keep[i] = false;
                break;
            }
        }
    }
    let mut it = keep.iter();
    caps.retain(|_| *it.next().unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cm_of_theta;
    use std::f64::consts::FRAC_PI_2;

    fn axis(x: f64, y: f64, z: f64) -> Vector3<f64> {
        Vector3::new(x, y, z).normalize()
    }

    #[test]
    fn null_cap_is_empty() {
        let mut poly = Polygon::new(
            vec![Cap::new(axis(0.0, 0.0, 1.0), Quad::ZERO)],
            0,
            0,
            1.0,
        );
        assert_eq!(prune_poly(&mut poly, 1e-9).unwrap(), PruneOutcome::Empty);
    }

    #[test]
    fn mutually_exclusive_caps_are_empty() {
        let mut poly = Polygon::new(
            vec![
                Cap::new(axis(1.0, 0.0, 0.0), cm_of_theta(0.1)),
                Cap::new(axis(-1.0, 0.0, 0.0), cm_of_theta(0.1)),
            ],
            0,
            0,
            1.0,
        );
        assert_eq!(prune_poly(&mut poly, 1e-9).unwrap(), PruneOutcome::Empty);
    }

    #[test]
    fn all_vacuous_caps_is_whole_sphere() {
        let mut poly = Polygon::new(
            vec![Cap::new(axis(0.0, 0.0, 1.0), Quad::from_f64(2.0))],
            0,
            0,
            1.0,
        );
        assert_eq!(
            prune_poly(&mut poly, 1e-9).unwrap(),
            PruneOutcome::WholeSphere
        );
        assert!(poly.caps.is_empty());
    }

    #[test]
    fn duplicate_caps_are_coalesced_to_the_tighter() {
        let mut poly = Polygon::new(
            vec![
                Cap::new(axis(0.0, 0.0, 1.0), cm_of_theta(0.3)),
                Cap::new(axis(0.0, 0.0, 1.0), cm_of_theta(0.30000000001)),
            ],
            0,
            0,
            1.0,
        );
        assert_eq!(prune_poly(&mut poly, 1e-6).unwrap(), PruneOutcome::Kept);
        assert_eq!(poly.caps.len(), 1);
    }

    #[test]
    fn redundant_wider_cap_on_same_axis_is_dropped() {
        let mut poly = Polygon::new(
            vec![
                Cap::new(axis(0.0, 0.0, 1.0), cm_of_theta(FRAC_PI_2)),
                Cap::new(axis(0.0, 0.0, 1.0), cm_of_theta(0.1)),
            ],
            0,
            0,
            1.0,
        );
        assert_eq!(prune_poly(&mut poly, 1e-9).unwrap(), PruneOutcome::Kept);
        assert_eq!(poly.caps.len(), 1);
        assert!((poly.caps[0].theta() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn gptin_requires_all_caps() {
        let poly = Polygon::new(
            vec![
                Cap::new(axis(0.0, 0.0, 1.0), cm_of_theta(0.5)),
                Cap::new(axis(0.1, 0.0, 1.0), cm_of_theta(0.5)),
            ],
            0,
            0,
            1.0,
        );
        assert!(poly.contains(axis(0.0, 0.0, 1.0)));
        assert!(!poly.contains(axis(0.0, 1.0, 0.0)));
    }
}
