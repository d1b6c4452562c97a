//! Responsive layout math for the card illustration.
//!
//! Everything here is a pure function of the canvas size: the padded usable
//! box, the named anchor points the curves hang off, and the Bézier chains
//! themselves. Re-invoking with the same `(width, height)` yields bit-identical
//! output; there is no hidden state and no rounding to device pixels.

use crate::core::{BezPath, Point};

/// Fixed padding between the canvas edge and the usable drawing box.
pub const PAD: f64 = 22.0;

/// Horizontal guide lines, as fractions of the usable height.
pub const GUIDE_FRACTIONS: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.85];

/// Width of the fade-out strip at the right end of the x axis.
pub const AXIS_FADE_LEN: f64 = 80.0;

/// Padding-adjusted drawing box plus the reference points derived from it.
///
/// For inputs at or below `2 * PAD` the usable extent goes non-positive and
/// the visual result is undefined; that is a caller error, not a failure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub gx: f64,
    pub gy: f64,
    pub gw: f64,
    pub gh: f64,
}

impl Layout {
    pub fn compute(width: f64, height: f64) -> Self {
        Self {
            gx: PAD,
            gy: PAD,
            gw: width - 2.0 * PAD,
            gh: height - 2.0 * PAD,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.gw > 0.0 && self.gh > 0.0)
    }

    /// Fractional x within the usable box.
    pub fn fx(&self, f: f64) -> f64 {
        self.gx + self.gw * f
    }

    /// Fractional y within the usable box.
    pub fn fy(&self, f: f64) -> f64 {
        self.gy + self.gh * f
    }

    /// Shared origin of both curves (the "Now" anchor).
    pub fn curve_start(&self) -> Point {
        Point::new(self.fx(0.03), self.baseline_y())
    }

    /// The dashed "Now" baseline.
    pub fn baseline_y(&self) -> f64 {
        self.fy(0.62)
    }

    /// Right edge of the curve drawing range (gradient end anchor).
    pub fn curve_end_x(&self) -> f64 {
        self.fx(0.96)
    }

    /// Height the positive curve climbs to.
    pub fn curve_top_y(&self) -> f64 {
        self.fy(0.26)
    }

    /// Where the negative curve bottoms out.
    pub fn negative_end_y(&self) -> f64 {
        self.fy(0.88)
    }

    /// Visible endpoint of the positive curve (pulse marker position).
    pub fn positive_end(&self) -> Point {
        Point::new(self.fx(0.85), self.curve_top_y())
    }

    pub fn axis_left(&self) -> f64 {
        self.gx
    }

    pub fn axis_right(&self) -> f64 {
        self.gx + self.gw
    }

    pub fn axis_top(&self) -> f64 {
        self.gy
    }

    pub fn axis_bottom(&self) -> f64 {
        self.gy + self.gh
    }

    pub fn guide_ys(&self) -> [f64; 5] {
        GUIDE_FRACTIONS.map(|f| self.fy(f))
    }
}

/// The ascending "positive outcome" curve: two cubic segments from the
/// baseline anchor up to [`Layout::positive_end`], forming a smooth S-shaped
/// climb that starts shallow and steepens mid-way.
pub fn positive_curve(l: &Layout) -> BezPath {
    let start = l.curve_start();
    let y_base = l.baseline_y();
    let mid = Point::new(l.fx(0.50), y_base - l.gh * 0.24);
    let end = l.positive_end();

    let mut p = BezPath::new();
    p.move_to(start);
    p.curve_to(
        Point::new(l.fx(0.18), y_base - l.gh * 0.03),
        Point::new(l.fx(0.32), y_base - l.gh * 0.14),
        mid,
    );
    p.curve_to(
        Point::new(l.fx(0.62), y_base - l.gh * 0.34),
        Point::new(l.fx(0.74), l.curve_top_y() + l.gh * 0.04),
        end,
    );
    p
}

/// [`positive_curve`] with a short straight extension past the visible
/// endpoint. The extension sits under the transparent tail of the stroke
/// gradient, so the curve fades out instead of stopping at the marker.
pub fn positive_curve_extended(l: &Layout) -> BezPath {
    let mut p = positive_curve(l);
    p.line_to(Point::new(l.fx(0.93), l.curve_top_y() - l.gh * 0.02));
    p
}

/// The descending "negative outcome" curve: a gentle drift below the baseline
/// followed by a steep drop to the bottom-right.
pub fn negative_curve(l: &Layout) -> BezPath {
    let start = l.curve_start();
    let y_base = l.baseline_y();

    let mut p = BezPath::new();
    p.move_to(start);
    p.curve_to(
        Point::new(l.fx(0.32), y_base + l.gh * 0.02),
        Point::new(l.fx(0.58), y_base + l.gh * 0.10),
        Point::new(l.fx(0.76), y_base + l.gh * 0.18),
    );
    p.curve_to(
        Point::new(l.fx(0.88), y_base + l.gh * 0.26),
        Point::new(l.fx(0.92), y_base + l.gh * 0.30),
        Point::new(l.fx(0.95), l.negative_end_y()),
    );
    p
}

/// Closed triangular arrowhead capping the top of the y axis.
pub fn axis_arrowhead(l: &Layout) -> BezPath {
    let base_x = l.axis_left();
    let top = l.axis_top();

    let mut p = BezPath::new();
    p.move_to(Point::new(base_x - 8.0, top + 6.0));
    p.line_to(Point::new(base_x + 8.0, top + 6.0));
    p.line_to(Point::new(base_x, top - 6.0));
    p.close_path();
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_point(p: &BezPath) -> Point {
        match p.elements().first() {
            Some(kurbo::PathEl::MoveTo(pt)) => *pt,
            other => panic!("path does not start with MoveTo: {other:?}"),
        }
    }

    #[test]
    fn layout_matches_reference_dimensions() {
        let l = Layout::compute(412.0, 270.0);
        assert_eq!(l.gw, 368.0);
        assert_eq!(l.gh, 226.0);
        assert!((l.baseline_y() - 162.12).abs() < 1e-9);
        assert!(!l.is_degenerate());
    }

    #[test]
    fn layout_is_deterministic() {
        let a = Layout::compute(800.0, 600.0);
        let b = Layout::compute(800.0, 600.0);
        assert_eq!(a, b);
        assert_eq!(positive_curve(&a).elements(), positive_curve(&b).elements());
        assert_eq!(negative_curve(&a).elements(), negative_curve(&b).elements());
    }

    #[test]
    fn curves_share_the_now_anchor() {
        for (w, h) in [(412.0, 270.0), (320.0, 200.0), (1024.0, 768.0)] {
            let l = Layout::compute(w, h);
            let pos = first_point(&positive_curve(&l));
            let neg = first_point(&negative_curve(&l));
            assert_eq!(pos, neg);
            assert_eq!(pos, l.curve_start());
        }
    }

    #[test]
    fn positive_curve_ends_at_marker() {
        let l = Layout::compute(412.0, 270.0);
        let p = positive_curve(&l);
        let last = match p.elements().last() {
            Some(kurbo::PathEl::CurveTo(_, _, end)) => *end,
            other => panic!("unexpected final element: {other:?}"),
        };
        assert_eq!(last, l.positive_end());
    }

    #[test]
    fn extended_curve_appends_one_line() {
        let l = Layout::compute(412.0, 270.0);
        let base = positive_curve(&l);
        let ext = positive_curve_extended(&l);
        assert_eq!(ext.elements().len(), base.elements().len() + 1);
        assert!(matches!(
            ext.elements().last(),
            Some(kurbo::PathEl::LineTo(_))
        ));
    }

    #[test]
    fn degenerate_inputs_flag_but_do_not_fail() {
        let l = Layout::compute(30.0, 30.0);
        assert!(l.is_degenerate());
        // Still computable, just visually meaningless.
        let _ = positive_curve(&l);
        let _ = negative_curve(&l);
    }

    #[test]
    fn arrowhead_is_closed() {
        let l = Layout::compute(412.0, 270.0);
        let p = axis_arrowhead(&l);
        assert!(matches!(p.elements().last(), Some(kurbo::PathEl::ClosePath)));
    }

    #[test]
    fn guide_lines_sit_inside_the_box() {
        let l = Layout::compute(412.0, 270.0);
        for y in l.guide_ys() {
            assert!(y > l.axis_top() && y < l.axis_bottom());
        }
    }
}
