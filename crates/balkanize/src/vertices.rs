//! Polygon boundary enumeration: circle-circle intersection vertices and
//! the boundary loops they stitch together.
//!
//! Grounded on the original's `gverts`/`gvlims` pair: `gverts` finds every
//! point where two of a polygon's cap boundaries cross and survives inside
//! every other cap, and `gvlims` walks those vertices, plus any cap whose
//! whole circle survives untouched, into the polygon's boundary loops. The
//! loop count is what the partitioner (spec.md §4.3) uses to tell a
//! genuinely connected region from one that only looks connected from its
//! cap list.
//!
//! This structure is transient: it is never serialized or kept around
//! between calls, only built, consulted, and dropped (spec.md §6).

use nalgebra::Vector3;

use crate::polygon::Polygon;

/// A point where two cap boundaries cross and which survives inside every
/// other cap of the polygon.
#[derive(Clone, Copy, Debug)]
pub struct Vertex {
    /// The vertex location, a unit vector.
    pub point: Vector3<f64>,
    /// The two caps whose boundaries cross here.
    pub caps: (usize, usize),
}

/// One connected piece of a polygon's boundary.
#[derive(Clone, Debug)]
pub enum BoundaryLoop {
    /// A loop stitched together from two or more [`Vertex`] entries
    /// (indices into [`BoundaryGraph::vertices`]); membership only, not a
    /// guaranteed cyclic visitation order.
    Vertices(Vec<usize>),
    /// A cap whose entire boundary circle survives untouched by any other
    /// cap, forming an isolated loop on its own.
    FullCircle(usize),
}

/// A polygon's boundary, decomposed into vertices and loops.
#[derive(Clone, Debug, Default)]
pub struct BoundaryGraph {
    /// Every true polygon vertex found.
    pub vertices: Vec<Vertex>,
    /// The boundary loops those vertices (and any untouched full-circle
    /// caps) stitch together.
    pub loops: Vec<BoundaryLoop>,
}

impl BoundaryGraph {
    /// Number of distinct boundary loops. Zero caps (whole sphere) has no
    /// boundary at all; this is `0` in that case, not `1`.
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }
}

/// Builds the boundary graph of `poly`, assuming it has already been
/// pruned (spec.md assumes `prune_poly` ran first; an un-pruned polygon
/// with a null or mutually exclusive cap pair has an undefined boundary
/// here).
pub fn enumerate_vertices(poly: &Polygon, tol: f64) -> BoundaryGraph {
    let n = poly.caps.len();
    if n == 0 {
        return BoundaryGraph::default();
    }
    if n == 1 {
        return BoundaryGraph {
            vertices: Vec::new(),
            loops: vec![BoundaryLoop::FullCircle(0)],
        };
    }

    let mut vertices = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            for point in circle_intersections(&poly.caps[i], &poly.caps[j], tol) {
                if survives_other_caps(poly, i, j, point, tol) {
                    vertices.push(Vertex {
                        point,
                        caps: (i, j),
                    });
                }
            }
        }
    }

    let mut loops = Vec::new();
    let mut uf = UnionFind::new(vertices.len());

    for c in 0..n {
        let axis = poly.caps[c].axis;
        let theta = poly.caps[c].theta();
        let (e1, e2) = frame(axis);

        let mut on_this_cap: Vec<usize> = (0..vertices.len())
            .filter(|&k| vertices[k].caps.0 == c || vertices[k].caps.1 == c)
            .collect();

        if on_this_cap.is_empty() {
            let probe = circle_point(axis, theta, 0.0, e1, e2);
            if survives_other_caps_excluding(poly, c, probe, tol) {
                loops.push(BoundaryLoop::FullCircle(c));
            }
            continue;
        }

        on_this_cap.sort_by(|&a, &b| {
            angle_on_circle(axis, vertices[a].point, e1, e2)
                .partial_cmp(&angle_on_circle(axis, vertices[b].point, e1, e2))
                .unwrap()
        });

        let k = on_this_cap.len();
        for m in 0..k {
            let a = on_this_cap[m];
            let b = on_this_cap[(m + 1) % k];
            let phi_a = angle_on_circle(axis, vertices[a].point, e1, e2);
            let mut phi_b = angle_on_circle(axis, vertices[b].point, e1, e2);
            if phi_b <= phi_a {
                phi_b += std::f64::consts::TAU;
            }
            let mid = 0.5 * (phi_a + phi_b);
            let probe = circle_point(axis, theta, mid, e1, e2);
            if survives_other_caps_excluding(poly, c, probe, tol) {
                uf.union(a, b);
            }
        }
    }

    let mut groups: std::collections::BTreeMap<usize, Vec<usize>> = std::collections::BTreeMap::new();
    for idx in 0..vertices.len() {
        groups.entry(uf.find(idx)).or_default().push(idx);
    }
    for (_, members) in groups {
        if members.len() > 1 || matches!(
            members.first().map(|&m| vertices[m].caps),
            Some((a, b)) if a != b
        ) {
            loops.push(BoundaryLoop::Vertices(members));
        }
    }

    BoundaryGraph { vertices, loops }
}

fn survives_other_caps(poly: &Polygon, i: usize, j: usize, point: Vector3<f64>, tol: f64) -> bool {
    poly.caps
        .iter()
        .enumerate()
        .all(|(k, c)| k == i || k == j || c.contains_tol(point, tol))
}

fn survives_other_caps_excluding(poly: &Polygon, skip: usize, point: Vector3<f64>, tol: f64) -> bool {
    poly.caps
        .iter()
        .enumerate()
        .all(|(k, c)| k == skip || c.contains_tol(point, tol))
}

/// Orthonormal frame `(e1, e2)` spanning the plane perpendicular to `axis`.
fn frame(axis: Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let reference = if axis.x.abs() < 0.9 {
        Vector3::new(1.0, 0.0, 0.0)
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    };
    let e1 = (reference - axis * reference.dot(&axis)).normalize();
    let e2 = axis.cross(&e1);
    (e1, e2)
}

fn circle_point(axis: Vector3<f64>, theta: f64, phi: f64, e1: Vector3<f64>, e2: Vector3<f64>) -> Vector3<f64> {
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    axis * cos_t + e1 * (sin_t * cos_p) + e2 * (sin_t * sin_p)
}

fn angle_on_circle(axis: Vector3<f64>, point: Vector3<f64>, e1: Vector3<f64>, e2: Vector3<f64>) -> f64 {
    let perp = point - axis * point.dot(&axis);
    perp.dot(&e2).atan2(perp.dot(&e1))
}

/// The (up to two) points where two cap boundary circles cross, found via
/// the spherical law of cosines. Boundary location depends only on each
/// cap's unsigned angular radius (`theta`), not its complement sign.
fn circle_intersections(
    a: &crate::primitives::Cap,
    b: &crate::primitives::Cap,
    tol: f64,
) -> Vec<Vector3<f64>> {
    let theta_a = a.theta();
    let theta_b = b.theta();
    let gamma = crate::primitives::theta_of_cm(crate::primitives::cm_between(a.axis, b.axis));

    if gamma < tol || (std::f64::consts::PI - gamma) < tol {
        return Vec::new();
    }
    let (sin_ta, _) = theta_a.sin_cos();
    if sin_ta.abs() < tol {
        return Vec::new();
    }
    let (sin_g, _) = gamma.sin_cos();
    if sin_g.abs() < tol {
        return Vec::new();
    }

    let cos_phi = (theta_b.cos() - theta_a.cos() * gamma.cos()) / (sin_ta * sin_g);
    if cos_phi > 1.0 + tol || cos_phi < -1.0 - tol {
        return Vec::new();
    }
    let cos_phi = cos_phi.clamp(-1.0, 1.0);
    let phi = cos_phi.acos();

    let (e1, e2) = frame(a.axis);
    if phi.abs() < tol || (std::f64::consts::PI - phi).abs() < tol {
        return vec![circle_point(a.axis, theta_a, phi, e1, e2)];
    }
    vec![
        circle_point(a.axis, theta_a, phi, e1, e2),
        circle_point(a.axis, theta_a, -phi, e1, e2),
    ]
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> UnionFind {
        UnionFind {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}
