//! Pairwise polygon fragmentation: splitting `A` against `B` into `A \ B`
//! and, optionally, `A ∩ B`.
//!
//! Grounded on the original's `fragment_poly`: to subtract
//! `B = cap_1 ∩ ... ∩ cap_m` from `A`, de Morgan gives
//! `A \ B = A ∩ (not cap_1 ∪ ... ∪ not cap_m)`, which is decomposed into
//! `m` pairwise-disjoint pieces by picking, for each piece, the first `B`
//! cap that fails:
//!
//! `piece_i = A ∩ cap_1 ∩ ... ∩ cap_(i-1) ∩ (not cap_i)`  for `i = 1..=m`
//!
//! Each piece inherits every one of `A`'s own caps plus that prefix. Most
//! pieces prune away to `Empty` in practice; only the ones that survive
//! `prune_poly` are returned. `A ∩ B` (all of `A`'s caps plus all of `B`'s)
//! is appended last unless the caller discards it.

use crate::error::BalkanizeError;
use crate::polygon::{prune_poly, Polygon, PruneOutcome};

/// Computes `A \ B`, and `A ∩ B` unless `discard_intersection` is set, as
/// a set of disjoint output polygons. `tol` is the pruning tolerance
/// passed through to [`prune_poly`] on each candidate piece.
///
/// The intersection piece, when kept, is given `a`'s `id`/`pixel`/`weight`
/// — the original's comment on this routine is "intersection inherits
/// weight of polygon being fragmented", and `a` is the polygon being
/// fragmented here. The balkanizer driver (see DESIGN.md) gets its
/// later-polygon-wins overlap rule by choosing, for each pairwise
/// comparison, which of the two polygons plays the role of `a`.
pub fn fragment_poly(
    a: &Polygon,
    b: &Polygon,
    discard_intersection: bool,
    tol: f64,
) -> Result<Vec<Polygon>, BalkanizeError> {
    let mut pieces = Vec::new();

    if b.caps.is_empty() {
        // B is the whole sphere: A \ B is empty, A ∩ B is all of A.
        if !discard_intersection {
            pieces.push(a.clone());
        }
        return Ok(pieces);
    }

    for i in 0..b.caps.len() {
        let mut caps = a.caps.clone();
        caps.extend(b.caps[..i].iter().copied());
        caps.push(b.caps[i].complement());
        let mut piece = Polygon::new(caps, a.id, a.pixel, a.weight);
        if !matches!(prune_poly(&mut piece, tol)?, PruneOutcome::Empty) {
            pieces.push(piece);
        }
    }

    if !discard_intersection {
        let mut caps = a.caps.clone();
        caps.extend(b.caps.iter().copied());
        let mut piece = Polygon::new(caps, a.id, a.pixel, a.weight);
        if !matches!(prune_poly(&mut piece, tol)?, PruneOutcome::Empty) {
            pieces.push(piece);
        }
    }

    Ok(pieces)
}
