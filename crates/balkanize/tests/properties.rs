//! End-to-end scenarios and sampled properties for the full `balkanize`
//! pipeline, against the seed scenarios and testable properties this
//! crate is expected to satisfy.

use nalgebra::Vector3;
use proptest::prelude::*;

use balkanize::prelude::{balkanize, BalkanizeConfig, Cap, Polygon, UnitPixelization};
use balkanize::primitives::{azel_to_unit, cm_of_theta};

fn deg(d: f64) -> f64 {
    d.to_radians()
}

/// Samples `n` roughly-evenly-spaced points on the sphere (a simple
/// Fibonacci lattice), used to approximate coverage/disjointness/weight
/// checks without a full spherical-area quadrature.
fn fibonacci_sphere(n: usize) -> Vec<Vector3<f64>> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..n)
        .map(|i| {
            let z = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let r = (1.0 - z * z).max(0.0).sqrt();
            let theta = golden_angle * i as f64;
            Vector3::new(r * theta.cos(), r * theta.sin(), z)
        })
        .collect()
}

fn assert_disjoint(output: &[Polygon], sample: &[Vector3<f64>]) {
    for &x in sample {
        let owners: Vec<_> = output.iter().filter(|p| p.contains(x)).collect();
        assert!(
            owners.len() <= 1,
            "point {x:?} is covered by {} output polygons, expected at most 1",
            owners.len()
        );
    }
}

/// S1: two disjoint caps pass straight through unchanged.
#[test]
fn s1_two_disjoint_caps_pass_through() {
    let a = Polygon::new(
        vec![Cap::new(azel_to_unit(0.0, 0.0), cm_of_theta(deg(10.0)))],
        0,
        0,
        1.0,
    );
    let b = Polygon::new(
        vec![Cap::new(azel_to_unit(deg(90.0), 0.0), cm_of_theta(deg(10.0)))],
        1,
        0,
        2.0,
    );
    let config = BalkanizeConfig::default();
    let (output, report) = balkanize(vec![a, b], &config, &UnitPixelization).unwrap();

    assert_eq!(output.len(), 2);
    assert_eq!(report.empty_discarded, 0);
    let mut weights: Vec<f64> = output.iter().map(|p| p.weight).collect();
    weights.sort_by(|x, y| x.partial_cmp(y).unwrap());
    assert_eq!(weights, vec![1.0, 2.0]);
}

/// S2: two overlapping caps fragment into exactly three pieces
/// (A\B, A∩B, B\A), and the shared region carries B's (the later
/// polygon's) weight.
#[test]
fn s2_two_overlapping_caps_fragment_into_three_pieces() {
    let a = Polygon::new(
        vec![Cap::new(azel_to_unit(0.0, 0.0), cm_of_theta(deg(30.0)))],
        0,
        0,
        1.0,
    );
    let b = Polygon::new(
        vec![Cap::new(azel_to_unit(deg(20.0), 0.0), cm_of_theta(deg(30.0)))],
        1,
        0,
        2.0,
    );
    let config = BalkanizeConfig::default();
    let (output, _) = balkanize(vec![a, b], &config, &UnitPixelization).unwrap();

    assert_eq!(output.len(), 3);

    let sample = fibonacci_sphere(4000);
    assert_disjoint(&output, &sample);

    // Every sampled point in either input cap must be covered by exactly
    // one output polygon.
    let cap_a = Cap::new(azel_to_unit(0.0, 0.0), cm_of_theta(deg(30.0)));
    let cap_b = Cap::new(azel_to_unit(deg(20.0), 0.0), cm_of_theta(deg(30.0)));
    for &x in &sample {
        if cap_a.contains(x) || cap_b.contains(x) {
            let owners = output.iter().filter(|p| p.contains(x)).count();
            assert_eq!(owners, 1, "point {x:?} should be covered exactly once");
        }
    }

    // A point well inside the overlap region must end up weighted 2.0
    // (B, the later/higher-id polygon, wins the overlap).
    let overlap_point = azel_to_unit(deg(10.0), 0.0);
    assert!(cap_a.contains(overlap_point) && cap_b.contains(overlap_point));
    let owner = output
        .iter()
        .find(|p| p.contains(overlap_point))
        .expect("overlap point covered");
    assert_eq!(owner.weight, 2.0);
}

/// S3: a nested cap inside a larger one produces an annulus plus the
/// inner cap, and the inner cap's weight wins inside its radius.
#[test]
fn s3_nested_caps_produce_annulus_and_inner_cap() {
    let axis = azel_to_unit(0.0, 0.0);
    let outer = Polygon::new(vec![Cap::new(axis, cm_of_theta(deg(40.0)))], 0, 0, 1.0);
    let inner = Polygon::new(vec![Cap::new(axis, cm_of_theta(deg(10.0)))], 1, 0, 5.0);
    let config = BalkanizeConfig::default();
    let (output, _) = balkanize(vec![outer, inner], &config, &UnitPixelization).unwrap();

    assert_eq!(output.len(), 2);
    let annulus = output
        .iter()
        .find(|p| p.caps.len() == 2)
        .expect("one polygon should be the annulus with both an outer and complemented cap");
    assert_eq!(annulus.weight, 1.0);

    let inner_point = axis;
    let owner = output.iter().find(|p| p.contains(inner_point)).unwrap();
    assert_eq!(owner.weight, 5.0);

    let mid_point = azel_to_unit(deg(25.0), 0.0);
    let owner = output.iter().find(|p| p.contains(mid_point)).unwrap();
    assert_eq!(owner.weight, 1.0);
}

/// S4: after fragmentation, `A\B\C` is a single connected piece; the
/// partitioner must not further split it.
#[test]
fn s4_connected_fragment_is_not_further_split() {
    let a = Polygon::new(
        vec![Cap::new(azel_to_unit(0.0, 0.0), cm_of_theta(deg(30.0)))],
        0,
        0,
        1.0,
    );
    let b = Polygon::new(
        vec![Cap::new(azel_to_unit(deg(60.0), 0.0), cm_of_theta(deg(30.0)))],
        1,
        0,
        1.0,
    );
    let c = Polygon::new(
        vec![Cap::new(azel_to_unit(0.0, 0.0), cm_of_theta(deg(10.0)))],
        2,
        0,
        1.0,
    );
    let config = BalkanizeConfig::default();
    let (output, report) = balkanize(vec![a, b, c], &config, &UnitPixelization).unwrap();

    assert_eq!(report.partition_incomplete, 0);
    // The region near a's axis but outside c's inner cap and away from b
    // should be covered by exactly one output polygon.
    let probe = azel_to_unit(deg(-10.0), 0.0);
    let owners = output.iter().filter(|p| p.contains(probe)).count();
    assert_eq!(owners, 1);
}

/// S5: a tiling of non-overlapping caps passes through essentially
/// unchanged (weights preserved, same count).
#[test]
fn s5_tiling_of_disjoint_caps_is_preserved() {
    let mut polys = Vec::new();
    for i in 0..6 {
        let az = deg(60.0 * i as f64);
        polys.push(Polygon::new(
            vec![Cap::new(azel_to_unit(az, deg(45.0)), cm_of_theta(deg(20.0)))],
            i,
            0,
            1.0 + i as f64,
        ));
    }
    let config = BalkanizeConfig::default();
    let (output, report) = balkanize(polys, &config, &UnitPixelization).unwrap();

    assert_eq!(output.len(), 6);
    assert_eq!(report.empty_discarded, 0);
    let mut weights: Vec<f64> = output.iter().map(|p| p.weight).collect();
    weights.sort_by(|x, y| x.partial_cmp(y).unwrap());
    assert_eq!(weights, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

/// S6: three mutually overlapping caps with ids 0/1/2 and weights
/// 1/2/3 — the triple-intersection region must carry weight 3 (id 2,
/// the highest original id).
#[test]
fn s6_triple_overlap_inherits_highest_id_weight() {
    let shared = azel_to_unit(0.0, 0.0);
    let p0 = Polygon::new(vec![Cap::new(shared, cm_of_theta(deg(40.0)))], 0, 0, 1.0);
    let p1 = Polygon::new(
        vec![Cap::new(azel_to_unit(deg(10.0), 0.0), cm_of_theta(deg(40.0)))],
        1,
        0,
        2.0,
    );
    let p2 = Polygon::new(
        vec![Cap::new(azel_to_unit(deg(-10.0), 0.0), cm_of_theta(deg(40.0)))],
        2,
        0,
        3.0,
    );
    let config = BalkanizeConfig::default();
    let (output, _) = balkanize(vec![p0, p1, p2], &config, &UnitPixelization).unwrap();

    let owner = output.iter().find(|p| p.contains(shared)).expect("covered");
    assert_eq!(owner.id, 2);
    assert_eq!(owner.weight, 3.0);
}

/// Idempotence (property 5): balkanizing an already-balkanized output
/// returns the same polygon set up to pruning/re-sort.
#[test]
fn balkanizing_twice_is_idempotent() {
    let a = Polygon::new(
        vec![Cap::new(azel_to_unit(0.0, 0.0), cm_of_theta(deg(30.0)))],
        0,
        0,
        1.0,
    );
    let b = Polygon::new(
        vec![Cap::new(azel_to_unit(deg(20.0), 0.0), cm_of_theta(deg(30.0)))],
        1,
        0,
        2.0,
    );
    let config = BalkanizeConfig::default();
    let (first, _) = balkanize(vec![a, b], &config, &UnitPixelization).unwrap();
    let first_count = first.len();
    let mut first_weights: Vec<f64> = first.iter().map(|p| p.weight).collect();
    first_weights.sort_by(|x, y| x.partial_cmp(y).unwrap());

    let (second, _) = balkanize(first, &config, &UnitPixelization).unwrap();
    let mut second_weights: Vec<f64> = second.iter().map(|p| p.weight).collect();
    second_weights.sort_by(|x, y| x.partial_cmp(y).unwrap());

    assert_eq!(second.len(), first_count);
    assert_eq!(second_weights, first_weights);
}

proptest! {
    /// Disjointness (property 1) and weight dominance (property 3) over
    /// randomly placed, randomly weighted overlapping caps: every sampled
    /// point covered by some input is covered by exactly one output
    /// polygon, carrying the weight of the highest-id input that covers
    /// it.
    #[test]
    fn random_overlapping_caps_stay_disjoint_and_respect_weight_dominance(
        count in 2usize..6,
        seed in 0u64..10_000,
    ) {
        let mut rng_state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        let mut next = move || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;
            (rng_state % 1_000_000) as f64 / 1_000_000.0
        };

        let mut inputs = Vec::with_capacity(count);
        for i in 0..count {
            let az = next() * std::f64::consts::TAU;
            let el = (next() - 0.5) * std::f64::consts::PI;
            let theta = deg(10.0) + next() * deg(30.0);
            let axis = azel_to_unit(az, el);
            inputs.push(Polygon::new(
                vec![Cap::new(axis, cm_of_theta(theta))],
                i as i64,
                0,
                1.0 + i as f64,
            ));
        }

        let config = BalkanizeConfig::default();
        let (output, _) = balkanize(inputs.clone(), &config, &UnitPixelization).unwrap();

        let sample = fibonacci_sphere(600);
        for &x in &sample {
            let covering_inputs: Vec<&Polygon> = inputs.iter().filter(|p| p.contains(x)).collect();
            if covering_inputs.is_empty() {
                continue;
            }
            let winner = covering_inputs.iter().max_by_key(|p| p.id).unwrap();

            let owners: Vec<&Polygon> = output.iter().filter(|p| p.contains(x)).collect();
            prop_assert!(owners.len() <= 1, "point covered by {} output polygons", owners.len());
            if let Some(owner) = owners.first() {
                prop_assert_eq!(owner.weight, winner.weight);
            }
        }
    }
}
