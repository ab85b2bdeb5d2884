//! The top-level driver: prune, fragment pairwise within each pixel
//! neighbourhood, partition for connectivity, prune again, and assign
//! final ids (spec.md §4.5).
//!
//! Grounded on `balkanizepolys.c`'s three-stage structure. Stage 1 here
//! differs from the original's in-place array bookkeeping in one
//! deliberate way (see DESIGN.md): rather than the original's symmetric
//! `i < j` / `i > j` discard-or-keep comparison across a flat polygon
//! array, polygons are processed once, in input order, bucketed by pixel,
//! and each new polygon is subtracted out of every already-accepted
//! polygon it could overlap — a reverse-painter's algorithm ("paint the
//! newest polygon on top") that gives the same disjointness guarantee
//! with a simpler ownership story in Rust. This reproduces the original's
//! overlap rule exactly: **later polygons in the input override earlier
//! ones on overlap** (spec.md §4.2's tie-break rule, §8 property 3).
//! A later-indexed polygon is always kept whole when accepted and never
//! itself trimmed by an earlier one; only earlier, already-accepted
//! polygons get cut down to make room for it.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{BalkanizeConfig, IdAssignment, OnCapacity};
use crate::error::BalkanizeError;
use crate::fragment::fragment_poly;
use crate::partition::{partition_poly, PartitionOutcome};
use crate::pixel::Pixelization;
use crate::polygon::{prune_poly, PixelId, Polygon, PruneOutcome};

/// Counts of what happened during a [`balkanize`] run, for the caller to
/// log or report — the recoverable-error bookkeeping spec.md §7 asks for
/// instead of threading every per-polygon anomaly through `Result::Err`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BalkanizeReport {
    /// Number of polygons the run was given.
    pub polygons_in: usize,
    /// Number of polygons the run produced.
    pub polygons_out: usize,
    /// Polygons (input or intermediate) discarded as zero-area.
    pub empty_discarded: usize,
    /// Polygons whose connectivity split was forced rather than clean
    /// (`PARTITION_INCOMPLETE`).
    pub partition_incomplete: usize,
    /// Whether the output was truncated to `max_output_polygons`.
    pub warnings_truncated: bool,
}

/// Runs the full balkanize pipeline over `polys`, consuming them.
pub fn balkanize<P: Pixelization>(
    polys: Vec<Polygon>,
    config: &BalkanizeConfig,
    pixelization: &P,
) -> Result<(Vec<Polygon>, BalkanizeReport), BalkanizeError> {
    let mut report = BalkanizeReport {
        polygons_in: polys.len(),
        ..BalkanizeReport::default()
    };

    tracing::info!(polygons = report.polygons_in, "balkanize stage 0: initial prune");
    let pruned = prune_stage(polys, config, &mut report)?;

    tracing::info!(polygons = pruned.len(), "balkanize stage 1: pairwise fragmentation");
    let fragmented = fragment_stage(pruned, config, pixelization, &mut report)?;

    tracing::info!(polygons = fragmented.len(), "balkanize stage 2: connectivity partitioning");
    let partitioned = partition_stage(fragmented, config, &mut report)?;

    tracing::info!(polygons = partitioned.len(), "balkanize stage 3: final prune and sort");
    let mut output = prune_stage(partitioned, config, &mut report)?;

    // spec.md §4.5 stage 3: stable sort by pixel before any renumbering,
    // so that a fixed input/config/tolerance always yields the same
    // output order (spec.md §5's determinism requirement).
    output.sort_by_key(|p| p.pixel);
    assign_ids(&mut output, config);
    report.polygons_out = output.len();

    Ok((output, report))
}

fn prune_stage(
    polys: Vec<Polygon>,
    config: &BalkanizeConfig,
    report: &mut BalkanizeReport,
) -> Result<Vec<Polygon>, BalkanizeError> {
    let mut kept = Vec::with_capacity(polys.len());
    let mut empty_warnings = WarnThrottle::new(config.max_warnings);
    for mut p in polys {
        match prune_poly(&mut p, config.mtol)? {
            PruneOutcome::Empty => {
                report.empty_discarded += 1;
                let id = p.id;
                empty_warnings.note(|| {
                    tracing::warn!(polygon_id = id, "polygon pruned to zero area; discarding");
                });
            }
            PruneOutcome::WholeSphere | PruneOutcome::Kept => kept.push(p),
        }
    }
    empty_warnings.finish("empty_region");
    Ok(kept)
}

/// Stage 1: bucket already-accepted polygons by pixel (spec.md §4.4) so
/// that fragmenting a new polygon against everything accepted so far only
/// has to touch the pixels it could actually overlap, not the whole
/// output-so-far.
fn fragment_stage<P: Pixelization>(
    polys: Vec<Polygon>,
    config: &BalkanizeConfig,
    pixelization: &P,
    report: &mut BalkanizeReport,
) -> Result<Vec<Polygon>, BalkanizeError> {
    let mut buckets: BTreeMap<PixelId, Vec<Polygon>> = BTreeMap::new();
    let mut total = 0usize;

    for p in polys {
        if let Some(max) = config.max_output_polygons {
            if total >= max {
                match config.on_capacity {
                    OnCapacity::Abort => {
                        tracing::error!(produced = total, capacity = max, "output capacity exceeded");
                        return Err(BalkanizeError::CapacityExceeded {
                            produced: total,
                            capacity: max,
                        });
                    }
                    OnCapacity::Truncate => {
                        report.warnings_truncated = true;
                        tracing::warn!(capacity = max, "output capacity reached; truncating");
                        break;
                    }
                }
            }
        }

        let relevant: BTreeSet<PixelId> = pixelization.relevant_pixels(p.pixel).into_iter().collect();

        for pixel in relevant {
            let Some(bucket) = buckets.get_mut(&pixel) else {
                continue;
            };
            let before = bucket.len();
            let mut shrunk = Vec::with_capacity(before);
            for a in bucket.drain(..) {
                // `a` came first, `p` came later: `p` keeps its full
                // extent and `a` gives up whatever `p` now claims.
                shrunk.extend(fragment_poly(&a, &p, true, config.mtol)?);
            }
            total = total - before + shrunk.len();
            *bucket = shrunk;
        }

        buckets.entry(p.pixel).or_default().push(p);
        total += 1;
    }

    Ok(buckets.into_values().flatten().collect())
}

fn partition_stage(
    polys: Vec<Polygon>,
    config: &BalkanizeConfig,
    report: &mut BalkanizeReport,
) -> Result<Vec<Polygon>, BalkanizeError> {
    let mut finalized = Vec::with_capacity(polys.len());
    let mut incomplete_warnings = WarnThrottle::new(config.max_warnings);

    for poly in polys {
        match partition_poly(&poly, config, config.mtol)? {
            PartitionOutcome::AlreadyConnected => finalized.push(poly),
            PartitionOutcome::Split { pieces, complete } => {
                if !complete {
                    report.partition_incomplete += 1;
                    let id = poly.id;
                    incomplete_warnings.note(|| {
                        tracing::warn!(
                            polygon_id = id,
                            "partition_poly could not cleanly separate every component; forced split"
                        );
                    });
                }
                finalized.extend(pieces);
            }
        }
    }

    incomplete_warnings.finish("partition_incomplete");
    Ok(finalized)
}

fn assign_ids(polys: &mut [Polygon], config: &BalkanizeConfig) {
    match config.id_assignment {
        IdAssignment::Preserve => {}
        IdAssignment::Sequential => {
            for (i, p) in polys.iter_mut().enumerate() {
                p.id = i as i64;
            }
        }
        IdAssignment::PixelAsId => {
            for p in polys.iter_mut() {
                p.id = p.pixel as i64;
            }
        }
    }
}

/// Caps how many warnings of one category get logged individually before
/// collapsing the rest into a single "N more" summary (`WARNMAX` in the
/// original).
struct WarnThrottle {
    limit: usize,
    emitted: usize,
    total: usize,
}

impl WarnThrottle {
    fn new(limit: usize) -> WarnThrottle {
        WarnThrottle {
            limit,
            emitted: 0,
            total: 0,
        }
    }

    fn note(&mut self, emit: impl FnOnce()) {
        self.total += 1;
        if self.emitted < self.limit {
            emit();
            self.emitted += 1;
        }
    }

    fn finish(&self, label: &str) {
        if self.total > self.emitted {
            tracing::warn!(
                category = label,
                suppressed = self.total - self.emitted,
                "further warnings suppressed"
            );
        }
    }
}
