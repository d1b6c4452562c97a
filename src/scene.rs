//! Scene assembly: geometry + timeline values + theme -> ordered layer list.
//!
//! `Scene::build` is pure data-in data-out; it never touches assets or pixels.
//! The renderer walks the layers in order, so this module is the single place
//! the card's draw order is defined:
//!
//! background glow, y axis + arrowhead, fading x axis, guide lines, the two
//! gradient-masked curves, the dashed baseline, markers (with pulsing halo),
//! the arrow glyph, and finally the text labels.

use kurbo::Shape as _;

use crate::core::{BezPath, Dimensions, Point, Rect};
use crate::geometry::{self, AXIS_FADE_LEN, Layout};
use crate::theme::Theme;
use crate::timeline::TimelineValues;

/// Tolerance for flattening circles into Bézier paths.
const CIRCLE_TOLERANCE: f64 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient axis, 0..=1.
    pub offset: f64,
    /// Straight (non-premultiplied) RGBA8.
    pub color: [u8; 4],
}

/// A linear gradient between two canvas-space anchors.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub stops: Vec<GradientStop>,
}

impl LinearGradient {
    /// Straight-RGBA color at fraction `t` along the axis.
    pub fn color_at(&self, t: f64) -> [u8; 4] {
        let t = t.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return [0, 0, 0, 0];
        };
        if t <= first.offset {
            return first.color;
        }
        for w in self.stops.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if t <= b.offset {
                let denom = b.offset - a.offset;
                if denom <= 0.0 {
                    return b.color;
                }
                let f = (t - a.offset) / denom;
                let lerp = |x: u8, y: u8| -> u8 {
                    (f64::from(x) + (f64::from(y) - f64::from(x)) * f).round() as u8
                };
                return [
                    lerp(a.color[0], b.color[0]),
                    lerp(a.color[1], b.color[1]),
                    lerp(a.color[2], b.color[2]),
                    lerp(a.color[3], b.color[3]),
                ];
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

#[derive(Clone, Debug)]
pub enum Layer {
    /// Background glow image stretched over the whole canvas.
    Backdrop { opacity: f64 },
    Fill {
        path: BezPath,
        color: [u8; 4],
        opacity: f64,
    },
    Stroke {
        path: BezPath,
        color: [u8; 4],
        width: f64,
        round_cap: bool,
        dash: Option<[f64; 2]>,
        opacity: f64,
    },
    /// Axis-aligned rect filled with a linear gradient (the x-axis fade).
    GradientRect { rect: Rect, gradient: LinearGradient },
    /// A curve stroked to `progress` of its arc length and colored through a
    /// luminance mask over `gradient`.
    CurveDraw {
        path: BezPath,
        progress: f64,
        width: f64,
        gradient: LinearGradient,
    },
    /// Raster arrow glyph anchored at its tip, stretched down to `bottom_y`.
    ArrowGlyph {
        tip: Point,
        bottom_y: f64,
        min_height: f64,
        opacity: f64,
        scale: f64,
    },
    Label {
        text: String,
        origin: Point,
        size_px: f32,
        color: [u8; 4],
        opacity: f64,
        scale: f64,
    },
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub layers: Vec<Layer>,
}

impl Scene {
    pub fn build(dims: Dimensions, l: &Layout, v: &TimelineValues, theme: &Theme) -> Self {
        let mut layers = Vec::with_capacity(24);
        let y_base = l.baseline_y();
        let pos_end = l.positive_end();

        layers.push(Layer::Backdrop { opacity: 1.0 });

        // Y axis with arrowhead.
        layers.push(Layer::Stroke {
            path: line(
                Point::new(l.axis_left(), l.axis_bottom()),
                Point::new(l.axis_left(), l.axis_top()),
            ),
            color: theme.axis,
            width: 2.0,
            round_cap: false,
            dash: None,
            opacity: 1.0,
        });
        layers.push(Layer::Fill {
            path: geometry::axis_arrowhead(l),
            color: theme.axis,
            opacity: 1.0,
        });

        // X axis: solid run, then a strip fading to transparent.
        let fade_x = l.axis_right() - AXIS_FADE_LEN;
        layers.push(Layer::Stroke {
            path: line(
                Point::new(l.axis_left(), l.axis_bottom()),
                Point::new(fade_x, l.axis_bottom()),
            ),
            color: theme.axis,
            width: 2.0,
            round_cap: false,
            dash: None,
            opacity: 1.0,
        });
        layers.push(Layer::GradientRect {
            rect: Rect::new(
                fade_x,
                l.axis_bottom() - 1.0,
                l.axis_right(),
                l.axis_bottom() + 1.0,
            ),
            gradient: LinearGradient {
                start: Point::new(fade_x, l.axis_bottom()),
                end: Point::new(l.axis_right(), l.axis_bottom()),
                stops: vec![
                    GradientStop {
                        offset: 0.0,
                        color: theme.axis,
                    },
                    GradientStop {
                        offset: 1.0,
                        color: Theme::with_alpha(theme.axis, 0.0),
                    },
                ],
            },
        });

        for y in l.guide_ys() {
            layers.push(Layer::Stroke {
                path: line(Point::new(l.axis_left(), y), Point::new(l.axis_right(), y)),
                color: theme.guide,
                width: 1.0,
                round_cap: false,
                dash: None,
                opacity: 1.0,
            });
        }

        // Positive curve: transparent ramp-in, solid green, half-alpha tail
        // over the fade extension.
        layers.push(Layer::CurveDraw {
            path: geometry::positive_curve_extended(l),
            progress: v.green_progress,
            width: theme.curve_stroke_width,
            gradient: LinearGradient {
                start: l.curve_start(),
                end: Point::new(l.curve_end_x(), l.curve_top_y()),
                stops: vec![
                    GradientStop {
                        offset: 0.0,
                        color: [0, 0, 0, 0],
                    },
                    GradientStop {
                        offset: 0.55,
                        color: theme.green,
                    },
                    GradientStop {
                        offset: 1.0,
                        color: Theme::with_alpha(theme.green, 0.5),
                    },
                ],
            },
        });

        // Negative curve: green near the shared anchor, turning red on the
        // way down, fading out at the end.
        layers.push(Layer::CurveDraw {
            path: geometry::negative_curve(l),
            progress: v.red_progress,
            width: theme.curve_stroke_width,
            gradient: LinearGradient {
                start: l.curve_start(),
                end: Point::new(l.curve_end_x(), l.negative_end_y()),
                stops: vec![
                    GradientStop {
                        offset: 0.0,
                        color: [0, 0, 0, 0],
                    },
                    GradientStop {
                        offset: 0.25,
                        color: theme.green,
                    },
                    GradientStop {
                        offset: 0.7,
                        color: theme.red,
                    },
                    GradientStop {
                        offset: 1.0,
                        color: Theme::with_alpha(theme.red, 0.0),
                    },
                ],
            },
        });

        // Dashed baseline, inset from both axis ends.
        layers.push(Layer::Stroke {
            path: line(
                Point::new(l.axis_left() + 6.0, y_base),
                Point::new(l.axis_right() - 6.0, y_base),
            ),
            color: theme.baseline,
            width: 3.0,
            round_cap: true,
            dash: Some([14.0, 10.0]),
            opacity: 1.0,
        });

        // End marker: pulsing halo, soft disc, solid core, white ring.
        layers.push(Layer::Fill {
            path: circle(pos_end, v.pulse_radius),
            color: theme.green,
            opacity: v.pulse_opacity,
        });
        layers.push(Layer::Fill {
            path: circle(pos_end, 14.0),
            color: Theme::with_alpha(theme.green, 0.25),
            opacity: 1.0,
        });
        layers.push(Layer::Fill {
            path: circle(pos_end, 9.0),
            color: theme.green,
            opacity: 1.0,
        });
        layers.push(Layer::Stroke {
            path: circle(pos_end, 9.0),
            color: theme.marker_core,
            width: 2.0,
            round_cap: false,
            dash: None,
            opacity: 1.0,
        });

        // Start marker at the shared "Now" anchor.
        let now_center = Point::new(l.curve_start().x + 30.0, y_base);
        layers.push(Layer::Fill {
            path: circle(now_center, 15.0),
            color: theme.now_marker,
            opacity: 1.0,
        });
        layers.push(Layer::Fill {
            path: circle(now_center, 6.0),
            color: theme.marker_core,
            opacity: 1.0,
        });

        // Arrow glyph: tip hangs a gap below the end marker, feet end just
        // above the baseline.
        let tip = Point::new(pos_end.x, pos_end.y + l.gh * 0.06);
        let bottom_y = y_base - l.gh * 0.04;
        layers.push(Layer::ArrowGlyph {
            tip,
            bottom_y,
            min_height: 48.0,
            opacity: v.arrow_opacity,
            scale: v.arrow_scale,
        });

        layers.push(Layer::Label {
            text: theme.now_label.clone(),
            origin: Point::new(now_center.x, y_base - 34.0),
            size_px: theme.label_size_px,
            color: theme.label_text,
            opacity: 1.0,
            scale: 1.0,
        });
        layers.push(Layer::Label {
            text: theme.multiplier_label.clone(),
            origin: Point::new(pos_end.x + 15.0, bottom_y - 25.0),
            size_px: theme.label_size_px,
            color: theme.label_text,
            opacity: v.arrow_opacity,
            scale: v.arrow_scale,
        });

        Self {
            width: dims.width,
            height: dims.height,
            layers,
        }
    }
}

fn line(p0: Point, p1: Point) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(p0);
    p.line_to(p1);
    p
}

fn circle(center: Point, radius: f64) -> BezPath {
    kurbo::Circle::new(center, radius.max(0.0)).to_path(CIRCLE_TOLERANCE)
}
