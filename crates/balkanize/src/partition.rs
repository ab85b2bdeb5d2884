//! Connectivity partitioning: splitting a polygon whose cap list looks
//! like one region but actually bounds two or more disjoint pieces.
//!
//! Grounded on the original's `partition_poly`/`part_poly` lasso method:
//! find a boundary loop that belongs to a separate component, draw a new
//! cap ("lasso") around just that loop, and split the polygon into
//! "inside the lasso" and "outside the lasso" pieces. If the first lasso
//! doesn't cleanly separate the two sides, tighten it and retry
//! (`ADJUST_LASSO`); if no lasso works, fall back to splitting on the
//! polygon's smallest cap and reporting the split as incomplete
//! (`FORCE_SPLIT`).
//!
//! Limitation (see DESIGN.md): this uses [`crate::vertices::BoundaryGraph`]'s
//! loop count as the signal that a polygon has more than one component.
//! That is exactly right for the disjoint-lobe shapes balkanizing
//! actually produces, but it is not a universal connectivity test — an
//! annulus (sphere minus two polar caps) has two boundary loops and one
//! connected component, and this module would still attempt to lasso it.
//! A full arrangement/face-tracing connectivity test was judged out of
//! scope for the gain it would bring here.

use nalgebra::Vector3;

use crate::config::{BalkanizeConfig, LassoScope};
use crate::error::BalkanizeError;
use crate::polygon::{prune_poly, Polygon, PruneOutcome};
use crate::primitives::{cm_between, cm_of_theta, smallest_cap, theta_of_cm, Cap};
use crate::vertices::{enumerate_vertices, BoundaryGraph, BoundaryLoop};

/// Result of [`partition_poly`].
#[derive(Debug)]
pub enum PartitionOutcome {
    /// The polygon is already a single connected piece.
    AlreadyConnected,
    /// The polygon was split. `complete` is `false` when no lasso cleanly
    /// separated the components and the driver fell back to a forced
    /// split on the smallest cap (the original's `PARTITION_INCOMPLETE`).
    Split { pieces: Vec<Polygon>, complete: bool },
}

/// Attempts to split `poly` into connected pieces (spec.md §4.3).
pub fn partition_poly(
    poly: &Polygon,
    config: &BalkanizeConfig,
    tol: f64,
) -> Result<PartitionOutcome, BalkanizeError> {
    let graph = enumerate_vertices(poly, tol);

    let needs_split = if graph.loop_count() >= 2 {
        true
    } else {
        let should_probe =
            config.lasso_scope == LassoScope::AlwaysLasso || poly.caps.len() > config.one_boundary_cap_threshold;
        should_probe && !probe_single_loop_connectivity(poly)
    };

    if !needs_split {
        return Ok(PartitionOutcome::AlreadyConnected);
    }

    let Some(target_loop) = graph
        .loops
        .iter()
        .min_by_key(|lp| loop_member_caps(&graph, lp).len())
        .cloned()
    else {
        return Ok(PartitionOutcome::AlreadyConnected);
    };

    let points = loop_sample_points(poly, &graph, &target_loop);

    let mut slack = tol.max(1e-9);
    let mut attempt = 0;
    loop {
        let lasso = enclosing_lasso(&points, slack);

        let mut inside_caps = poly.caps.clone();
        inside_caps.push(lasso);
        let mut inside = Polygon::new(inside_caps, poly.id, poly.pixel, poly.weight);

        let mut outside_caps = poly.caps.clone();
        outside_caps.push(lasso.complement());
        let mut outside = Polygon::new(outside_caps, poly.id, poly.pixel, poly.weight);

        let inside_outcome = prune_poly(&mut inside, tol)?;
        let outside_outcome = prune_poly(&mut outside, tol)?;
        let inside_ok = !matches!(inside_outcome, PruneOutcome::Empty);
        let outside_ok = !matches!(outside_outcome, PruneOutcome::Empty);

        if inside_ok && outside_ok {
            return Ok(PartitionOutcome::Split {
                pieces: vec![inside, outside],
                complete: true,
            });
        }

        attempt += 1;
        if !config.lasso_adjust || attempt >= config.max_lasso_adjustments {
            break;
        }
        slack *= 2.0;
    }

    if config.force_split {
        return force_split(poly, tol);
    }

    Ok(PartitionOutcome::Split {
        pieces: vec![poly.clone()],
        complete: false,
    })
}

/// Last resort: split on the polygon's smallest cap. Always produces a
/// piece (the smallest cap's disk, intersected with the rest of the
/// polygon) and, if nonempty, its complement. Reported as incomplete —
/// the two pieces are not guaranteed to each be connected.
fn force_split(poly: &Polygon, tol: f64) -> Result<PartitionOutcome, BalkanizeError> {
    let Some((idx, _)) = smallest_cap(&poly.caps) else {
        return Err(BalkanizeError::NumericDegeneracy {
            polygon_id: poly.id,
            detail: "cannot force-split a whole-sphere polygon".into(),
        });
    };

    let mut first = poly.clone();
    first.caps = vec![poly.caps[idx]];
    let first_outcome = prune_poly(&mut first, tol)?;

    let mut rest_caps = poly.caps.clone();
    rest_caps.push(poly.caps[idx].complement());
    let mut rest = Polygon::new(rest_caps, poly.id, poly.pixel, poly.weight);
    let rest_outcome = prune_poly(&mut rest, tol)?;

    let mut pieces = Vec::new();
    if !matches!(first_outcome, PruneOutcome::Empty) {
        pieces.push(first);
    }
    if !matches!(rest_outcome, PruneOutcome::Empty) {
        pieces.push(rest);
    }
    Ok(PartitionOutcome::Split {
        pieces,
        complete: false,
    })
}

fn loop_member_caps(graph: &BoundaryGraph, lp: &BoundaryLoop) -> Vec<usize> {
    match lp {
        BoundaryLoop::FullCircle(c) => vec![*c],
        BoundaryLoop::Vertices(members) => {
            let mut caps = std::collections::BTreeSet::new();
            for &m in members {
                caps.insert(graph.vertices[m].caps.0);
                caps.insert(graph.vertices[m].caps.1);
            }
            caps.into_iter().collect()
        }
    }
}

fn loop_sample_points(poly: &Polygon, graph: &BoundaryGraph, lp: &BoundaryLoop) -> Vec<Vector3<f64>> {
    match lp {
        BoundaryLoop::FullCircle(c) => vec![poly.caps[*c].axis],
        BoundaryLoop::Vertices(members) => members.iter().map(|&m| graph.vertices[m].point).collect(),
    }
}

/// Smallest cap (by angular radius) that encloses every point in `points`,
/// enlarged by `slack` radians.
fn enclosing_lasso(points: &[Vector3<f64>], slack: f64) -> Cap {
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p);
    let axis = if sum.norm() > 1e-12 {
        sum.normalize()
    } else {
        points[0]
    };
    let radius = points
        .iter()
        .map(|p| theta_of_cm(cm_between(axis, *p)))
        .fold(0.0_f64, f64::max);
    Cap::new(axis, cm_of_theta((radius + slack).min(std::f64::consts::PI)))
}

/// Best-effort extra scrutiny for polygons with a single boundary loop:
/// every cap axis that lies inside the polygon is treated as a witness
/// point, and witnesses are required to be pairwise "visible" (their
/// great-circle midpoint also lies inside). This catches some, not all,
/// single-loop-but-disconnected configurations; see the module-level
/// limitation note.
fn probe_single_loop_connectivity(poly: &Polygon) -> bool {
    let witnesses: Vec<Vector3<f64>> = poly
        .caps
        .iter()
        .map(|c| c.axis)
        .filter(|&a| poly.contains(a))
        .collect();
    if witnesses.len() <= 1 {
        return true;
    }
    for i in 0..witnesses.len() {
        for j in (i + 1)..witnesses.len() {
            let mid = (witnesses[i] + witnesses[j]).normalize();
            if !poly.contains(mid) {
                return false;
            }
        }
    }
    true
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
    fn single_cap_is_already_connected() {
        let poly = Polygon::new(vec![Cap::new(axis(0.0, 0.0, 1.0), cm_of_theta(0.4))], 0, 0, 1.0);
        let config = BalkanizeConfig::default();
        let outcome = partition_poly(&poly, &config, 1e-9).unwrap();
        assert!(matches!(outcome, PartitionOutcome::AlreadyConnected));
    }

    #[test]
    fn two_caps_meeting_at_a_pinch_point_attempt_a_split() {
        // Two equal caps on opposite hemispheres whose boundaries cross at
        // two points, unioned by taking the *complement intersection* of
        // two non-overlapping caps produces two boundary loops.
        let poly = Polygon::new(
            vec![
                Cap::new(axis(0.0, 0.0, 1.0), cm_of_theta(0.2)).complement(),
                Cap::new(axis(0.0, 0.0, -1.0), cm_of_theta(0.2)).complement(),
            ],
            0,
            0,
            1.0,
        );
        let config = BalkanizeConfig::default();
        let outcome = partition_poly(&poly, &config, 1e-9).unwrap();
        // This is the documented annulus limitation: two loops, one
        // component. We only assert that the routine terminates and
        // returns a structurally valid outcome, not that it recognises
        // the connectedness.
        match outcome {
            PartitionOutcome::AlreadyConnected => {}
            PartitionOutcome::Split { pieces, .. } => assert!(!pieces.is_empty()),
        }
    }

    #[test]
    fn force_split_always_terminates_on_a_stubborn_polygon() {
        let poly = Polygon::new(
            vec![
                Cap::new(axis(1.0, 0.0, 0.0), cm_of_theta(FRAC_PI_2 + 0.01)),
                Cap::new(axis(0.0, 1.0, 0.0), cm_of_theta(FRAC_PI_2 + 0.01)),
                Cap::new(axis(0.0, 0.0, 1.0), cm_of_theta(FRAC_PI_2 + 0.01)),
            ],
            0,
            0,
            1.0,
        );
        let outcome = force_split(&poly, 1e-9).unwrap();
        assert!(matches!(outcome, PartitionOutcome::Split { .. }));
    }
}
