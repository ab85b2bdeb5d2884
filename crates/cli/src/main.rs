use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::fmt::SubscriberBuilder;

use balkanize::prelude::{BalkanizeConfig, IdAssignment, OnCapacity, UnitPixelization};

mod mask_format;

#[derive(Parser)]
#[command(name = "balkanize")]
#[command(about = "Fragment and partition overlapping spherical-polygon masks into a disjoint tiling")]
struct Cli {
    /// Input mask files; their polygons are concatenated before balkanizing.
    inputs: Vec<PathBuf>,

    /// Output mask file.
    #[arg(short, long)]
    output: PathBuf,

    /// TOML file overriding the default [`BalkanizeConfig`].
    #[arg(long)]
    config: Option<PathBuf>,

    /// Angular tolerance (radians) for merging and redundancy coalescing.
    #[arg(long)]
    mtol: Option<f64>,

    /// Renumber output polygon ids sequentially from zero.
    #[arg(short = 'n', long = "sequential-ids", conflicts_with = "pixel_ids")]
    sequential_ids: bool,

    /// Use each output polygon's pixel id as its new id.
    #[arg(short = 'p', long = "pixel-ids", conflicts_with = "sequential_ids")]
    pixel_ids: bool,

    /// Behaviour when the configured output capacity is exceeded.
    #[arg(long, value_enum)]
    on_capacity: Option<OnCapacityArg>,

    /// Maximum per-category warnings to log individually before
    /// collapsing into a summary line.
    #[arg(long)]
    max_warnings: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnCapacityArg {
    Abort,
    Truncate,
}

impl From<OnCapacityArg> for OnCapacity {
    fn from(arg: OnCapacityArg) -> OnCapacity {
        match arg {
            OnCapacityArg::Abort => OnCapacity::Abort,
            OnCapacityArg::Truncate => OnCapacity::Truncate,
        }
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(mtol) = cli.mtol {
        config.mtol = mtol;
    }
    if cli.sequential_ids {
        config.id_assignment = IdAssignment::Sequential;
    }
    if cli.pixel_ids {
        config.id_assignment = IdAssignment::PixelAsId;
    }
    if let Some(on_capacity) = cli.on_capacity {
        config.on_capacity = on_capacity.into();
    }
    if let Some(max_warnings) = cli.max_warnings {
        config.max_warnings = max_warnings;
    }

    let mut polys = Vec::new();
    for path in &cli.inputs {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading mask file {}", path.display()))?;
        let parsed = mask_format::parse_mask(&text)
            .with_context(|| format!("parsing mask file {}", path.display()))?;
        tracing::info!(path = %path.display(), polygons = parsed.len(), "loaded mask file");
        polys.extend(parsed);
    }

    // This crate does not implement a real hierarchical pixelisation
    // (spec.md §6 treats it as an external collaborator); running on a
    // single global bucket is correct for any input, just not fast for
    // very large masks. Link a real `Pixelization` through the library
    // API for that.
    let (output, report) = balkanize::prelude::balkanize(polys, &config, &UnitPixelization)
        .context("balkanize run failed")?;

    tracing::info!(
        polygons_in = report.polygons_in,
        polygons_out = report.polygons_out,
        empty_discarded = report.empty_discarded,
        partition_incomplete = report.partition_incomplete,
        truncated = report.warnings_truncated,
        "balkanize complete"
    );

    if report.partition_incomplete > 0 {
        tracing::warn!(
            count = report.partition_incomplete,
            "some polygons could not be cleanly split into connected pieces \
             (forgot to snap the input, a polygon is too small for the \
             tolerance, or its shape is too irregular for a single-cap \
             lasso); the output is still a valid disjoint mask, but weights \
             on the unsplit polygons may not reflect what you intended"
        );
    }

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&cli.output, mask_format::write_mask(&output))
        .with_context(|| format!("writing {}", cli.output.display()))?;

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<BalkanizeConfig> {
    match path {
        None => Ok(BalkanizeConfig::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
        }
    }
}
