//! Textual mask file reader/writer.
//!
//! spec.md §6 treats mask file I/O as an external collaborator to the
//! core engine; this module is where it actually lives, following the
//! original's polygon-format ASCII mask files: a `<n> polygons` header,
//! then for each polygon a `polygon <id> ( <np> caps, <weight>, <pixel>,
//! <area> ):` line followed by `<np>` cap lines of `x y z cm`.
//!
//! Area is always written as `0.0`: computing a polygon's solid angle is
//! outside this crate's scope (spec.md §6 names it as a separate
//! collaborator); tools that need it recompute it from the cap list.

use anyhow::{Context, Result};
use nalgebra::Vector3;

use balkanize::prelude::{Cap, PixelId, Polygon, Quad};

/// Parses every polygon out of a mask file's contents.
pub fn parse_mask(text: &str) -> Result<Vec<Polygon>> {
    let mut lines = text.lines();
    let header = lines
        .by_ref()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .context("empty mask file")?;
    let declared: usize = header
        .split_whitespace()
        .next()
        .context("missing polygon count header")?
        .parse()
        .with_context(|| format!("invalid polygon count in header {header:?}"))?;

    let mut polys = Vec::with_capacity(declared);
    while let Some(line) = lines.next() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (id, np, weight, pixel) =
            parse_polygon_header(line).with_context(|| format!("parsing header line {line:?}"))?;
        let mut caps = Vec::with_capacity(np);
        for _ in 0..np {
            let cap_line = lines
                .next()
                .with_context(|| format!("polygon {id} ended before its {np} caps were read"))?;
            caps.push(parse_cap_line(cap_line)?);
        }
        polys.push(Polygon::new(caps, id, pixel, weight));
    }

    Ok(polys)
}

fn parse_polygon_header(line: &str) -> Result<(i64, usize, f64, PixelId)> {
    let after_kw = line
        .strip_prefix("polygon")
        .context("expected line to start with 'polygon'")?
        .trim();
    let open = after_kw.find('(').context("expected '(' after polygon id")?;
    let close = after_kw.find(')').context("expected ')' closing polygon header")?;

    let id: i64 = after_kw[..open]
        .trim()
        .parse()
        .context("invalid polygon id")?;

    let fields: Vec<&str> = after_kw[open + 1..close].split(',').map(str::trim).collect();
    let np: usize = fields
        .first()
        .context("missing cap count field")?
        .split_whitespace()
        .next()
        .context("missing cap count")?
        .parse()
        .context("invalid cap count")?;
    let weight: f64 = fields
        .get(1)
        .context("missing weight field")?
        .parse()
        .context("invalid weight")?;
    let pixel: PixelId = fields
        .get(2)
        .context("missing pixel field")?
        .parse()
        .context("invalid pixel id")?;

    Ok((id, np, weight, pixel))
}

fn parse_cap_line(line: &str) -> Result<Cap> {
    let mut fields = line.split_whitespace();
    let mut next = |name: &str| -> Result<f64> {
        fields
            .next()
            .with_context(|| format!("missing cap field {name}"))?
            .parse()
            .with_context(|| format!("invalid cap field {name}"))
    };
    let x = next("x")?;
    let y = next("y")?;
    let z = next("z")?;
    let cm = next("cm")?;
    Ok(Cap::new(Vector3::new(x, y, z), Quad::from_f64(cm)))
}

/// Renders polygons as mask file text.
pub fn write_mask(polys: &[Polygon]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} polygons\n", polys.len()));
    for p in polys {
        out.push_str(&format!(
            "polygon {} ( {} caps, {:.6}, {}, {:.6} ):\n",
            p.id,
            p.caps.len(),
            p.weight,
            p.pixel,
            0.0,
        ));
        for cap in &p.caps {
            out.push_str(&format!(
                "{:.15} {:.15} {:.15} {:.15}\n",
                cap.axis.x,
                cap.axis.y,
                cap.axis.z,
                cap.cm.to_f64(),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_text() {
        let polys = vec![
            Polygon::new(
                vec![Cap::new(Vector3::new(0.0, 0.0, 1.0), Quad::from_f64(0.3))],
                7,
                12,
                0.5,
            ),
            Polygon::whole_sphere(8, 0, 1.0),
        ];
        let text = write_mask(&polys);
        let parsed = parse_mask(&text).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, 7);
        assert_eq!(parsed[0].pixel, 12);
        assert!((parsed[0].weight - 0.5).abs() < 1e-12);
        assert_eq!(parsed[0].caps.len(), 1);
        assert_eq!(parsed[1].caps.len(), 0);
    }

    #[test]
    fn rejects_truncated_cap_list() {
        let text = "1 polygons\npolygon 1 ( 2 caps, 1.000000, 0, 0.000000 ):\n0 0 1 0.3\n";
        assert!(parse_mask(text).is_err());
    }
}
