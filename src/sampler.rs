//! Arc-length utilities over vector paths.
//!
//! [`sample`] is a general-purpose resampler: it turns any SVG path string
//! into `n` points spaced equally by arc length, plus the total length. It is
//! not tied to the card's two curves — it exists for rendering approaches
//! that need explicit polylines instead of native path strokes.
//!
//! [`trim`] is the piece the renderer does use: the prefix of a path up to a
//! fraction of its arc length, which is what a curve's draw-on progress means.

use kurbo::{ParamCurve, ParamCurveArclen, PathSeg};

use crate::core::{BezPath, Point};
use crate::error::{CardError, CardResult};

/// Accuracy for arc-length computation and inversion.
const ARCLEN_ACCURACY: f64 = 1e-6;

/// Points sampled at equal arc-length spacing, as parallel coordinate arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampledPath {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub len: f64,
}

impl SampledPath {
    /// The documented result for an empty path description.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Sample `n` equally-spaced (by arc length) points along an SVG path string.
///
/// An empty `d` returns [`SampledPath::empty`] for any `n`; that is a
/// documented degenerate case, not an error. Otherwise `n` must be at least 2
/// and `d` must parse.
pub fn sample(d: &str, n: usize) -> CardResult<SampledPath> {
    if d.is_empty() {
        return Ok(SampledPath::empty());
    }
    if n < 2 {
        return Err(CardError::validation("sample count must be >= 2"));
    }
    let path = BezPath::from_svg(d.trim())
        .map_err(|e| CardError::validation(format!("invalid svg path data: {e}")))?;
    sample_path(&path, n)
}

/// [`sample`] over an already-parsed path.
pub fn sample_path(path: &BezPath, n: usize) -> CardResult<SampledPath> {
    if n < 2 {
        return Err(CardError::validation("sample count must be >= 2"));
    }

    let segs: Vec<PathSeg> = path.segments().collect();
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);

    if segs.is_empty() {
        // A bare MoveTo (or nothing at all) has zero length; every sample is
        // the start point if one exists.
        let Some(start) = path_start(path) else {
            return Ok(SampledPath::empty());
        };
        xs.resize(n, start.x);
        ys.resize(n, start.y);
        return Ok(SampledPath { xs, ys, len: 0.0 });
    }

    let seg_lens: Vec<f64> = segs.iter().map(|s| s.arclen(ARCLEN_ACCURACY)).collect();
    let total: f64 = seg_lens.iter().sum();

    for i in 0..n {
        let target = total * (i as f64) / ((n - 1) as f64);
        let p = point_at_arclen(&segs, &seg_lens, target);
        xs.push(p.x);
        ys.push(p.y);
    }

    Ok(SampledPath { xs, ys, len: total })
}

/// The prefix of `path` covering the first `t` (clamped to `[0, 1]`) of its
/// arc length. `t >= 1` returns the whole path unchanged.
pub fn trim(path: &BezPath, t: f64) -> BezPath {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        return path.clone();
    }

    let segs: Vec<PathSeg> = path.segments().collect();
    let seg_lens: Vec<f64> = segs.iter().map(|s| s.arclen(ARCLEN_ACCURACY)).collect();
    let total: f64 = seg_lens.iter().sum();
    let target = total * t;

    let mut kept: Vec<PathSeg> = Vec::new();
    let mut walked = 0.0;
    for (seg, len) in segs.iter().zip(&seg_lens) {
        if walked + len <= target {
            kept.push(*seg);
            walked += len;
            continue;
        }
        let remaining = target - walked;
        if remaining > 0.0 && *len > 0.0 {
            let t_local = seg.inv_arclen(remaining, ARCLEN_ACCURACY);
            kept.push(seg.subsegment(0.0..t_local));
        }
        break;
    }

    if kept.is_empty() {
        let mut p = BezPath::new();
        if let Some(start) = path_start(path) {
            p.move_to(start);
        }
        return p;
    }
    BezPath::from_path_segments(kept.into_iter())
}

fn path_start(path: &BezPath) -> Option<Point> {
    match path.elements().first() {
        Some(kurbo::PathEl::MoveTo(p)) => Some(*p),
        _ => None,
    }
}

fn point_at_arclen(segs: &[PathSeg], seg_lens: &[f64], target: f64) -> Point {
    let mut walked = 0.0;
    for (seg, len) in segs.iter().zip(seg_lens) {
        if target <= walked + len && *len > 0.0 {
            let t = seg.inv_arclen(target - walked, ARCLEN_ACCURACY);
            return seg.eval(t);
        }
        walked += len;
    }
    // Past the end (floating-point slack): the path's endpoint.
    segs[segs.len() - 1].eval(1.0)
}
