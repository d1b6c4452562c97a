//! CPU rasterization of a [`Scene`](crate::scene::Scene).
//!
//! Each layer is rendered into a transparent scratch pixmap with `vello_cpu`
//! and composited src-over onto the frame buffer. Everything is premultiplied
//! RGBA8 end to end; straight colors are premultiplied at the boundary.
//!
//! The two curve layers take the long way around: the path is trimmed to its
//! draw-on progress, stroked into a white mask, and the mask's luminance
//! gates a full-frame linear gradient. That reproduces gradient-along-stroke
//! without per-segment coloring.

use std::borrow::Cow;
use std::sync::Arc;

use kurbo::{Cap, Join, Stroke, StrokeOpts};

use crate::assets::{AssetStore, PreparedImage};
use crate::core::{Affine, BezPath, Dimensions, Point, Rect, Rgba8Premul, Vec2};
use crate::error::{CardError, CardResult};
use crate::math::mul_div255_u8;
use crate::sampler;
use crate::scene::{Layer, LinearGradient, Scene};

/// Tolerance for stroke-to-fill expansion.
const STROKE_TOLERANCE: f64 = 0.1;

/// One rendered frame, premultiplied RGBA8 row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRgba8 {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgba8 {
    /// Un-premultiplied copy of the pixel data, for image encoders that
    /// expect straight alpha.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Brush carried through Parley layouts; plain straight RGBA8.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Parley contexts reused across frames.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl TextLayoutEngine {
    fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    fn layout_plain(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> CardResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CardError::validation("text size_px must be finite and > 0"));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CardError::validation("no font families registered from font bytes"))?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Renderer for a fixed frame size. Owns the scratch surfaces so repeated
/// frames reuse their allocations.
pub struct CpuRenderer {
    width: u16,
    height: u16,
    base: Vec<u8>,
    scratch: vello_cpu::Pixmap,
    mask: vello_cpu::Pixmap,
    grad: Vec<u8>,
    text: TextLayoutEngine,
}

impl CpuRenderer {
    pub fn new(dims: Dimensions) -> CardResult<Self> {
        let width = dim_to_u16(dims.width, "width")?;
        let height = dim_to_u16(dims.height, "height")?;
        let n = usize::from(width) * usize::from(height) * 4;
        Ok(Self {
            width,
            height,
            base: vec![0u8; n],
            scratch: vello_cpu::Pixmap::new(width, height),
            mask: vello_cpu::Pixmap::new(width, height),
            grad: vec![0u8; n],
            text: TextLayoutEngine::new(),
        })
    }

    /// Rasterize `scene` over `clear` (straight RGBA8) and return the frame.
    pub fn render(
        &mut self,
        scene: &Scene,
        assets: &AssetStore,
        clear: [u8; 4],
    ) -> CardResult<FrameRgba8> {
        let bg = premul_rgba8(clear);
        for px in self.base.chunks_exact_mut(4) {
            px.copy_from_slice(&bg);
        }

        for layer in &scene.layers {
            match layer {
                Layer::Backdrop { opacity } => {
                    let Some(glow) = &assets.glow else { continue };
                    self.render_image(glow, backdrop_transform(glow, self.width, self.height), *opacity)?;
                }
                Layer::Fill { path, color, opacity } => {
                    self.render_fill(path, *color, *opacity)?;
                }
                Layer::Stroke {
                    path,
                    color,
                    width,
                    round_cap,
                    dash,
                    opacity,
                } => {
                    let outline = expand_stroke(path, *width, *round_cap, *dash);
                    self.render_fill(&outline, *color, *opacity)?;
                }
                Layer::GradientRect { rect, gradient } => {
                    self.blend_gradient_rect(rect, gradient);
                }
                Layer::CurveDraw {
                    path,
                    progress,
                    width,
                    gradient,
                } => {
                    self.render_curve(path, *progress, *width, gradient)?;
                }
                Layer::ArrowGlyph {
                    tip,
                    bottom_y,
                    min_height,
                    opacity,
                    scale,
                } => {
                    let Some(arrow) = &assets.arrow else { continue };
                    if *opacity <= 0.0 {
                        continue;
                    }
                    let tr = arrow_transform(arrow, *tip, *bottom_y, *min_height, *scale);
                    self.render_image(arrow, tr, *opacity)?;
                }
                Layer::Label {
                    text,
                    origin,
                    size_px,
                    color,
                    opacity,
                    scale,
                } => {
                    let Some(font) = &assets.label_font else { continue };
                    if *opacity <= 0.0 || text.is_empty() {
                        continue;
                    }
                    let font = Arc::clone(font);
                    self.render_label(text, &font, *origin, *size_px, *color, *opacity, *scale)?;
                }
            }
        }

        Ok(FrameRgba8 {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.base.clone(),
        })
    }

    fn composite_scratch(&mut self) -> CardResult<()> {
        premul_over_in_place(&mut self.base, self.scratch.data_as_u8_slice())
    }

    fn render_fill(&mut self, path: &BezPath, color: [u8; 4], opacity: f64) -> CardResult<()> {
        if opacity <= 0.0 || color[3] == 0 || path.elements().is_empty() {
            return Ok(());
        }
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color[0], color[1], color[2], color[3],
        ));
        let opacity = opacity.clamp(0.0, 1.0) as f32;
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_path(&bezpath_to_cpu(path));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut self.scratch);
        self.composite_scratch()
    }

    fn render_image(
        &mut self,
        img: &PreparedImage,
        transform: Affine,
        opacity: f64,
    ) -> CardResult<()> {
        if opacity <= 0.0 {
            return Ok(());
        }
        let paint = image_paint(img)?;
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(paint);
        let opacity = opacity.clamp(0.0, 1.0) as f32;
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(img.width),
            f64::from(img.height),
        ));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut self.scratch);
        self.composite_scratch()
    }

    fn render_curve(
        &mut self,
        path: &BezPath,
        progress: f64,
        width: f64,
        gradient: &LinearGradient,
    ) -> CardResult<()> {
        if progress <= 0.0 {
            return Ok(());
        }
        let trimmed = sampler::trim(path, progress);
        if trimmed.segments().next().is_none() {
            return Ok(());
        }
        let outline = expand_stroke(&trimmed, width, true, None);

        // White stroke into the mask surface.
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        ctx.fill_path(&bezpath_to_cpu(&outline));
        ctx.flush();
        ctx.render_to_pixmap(&mut self.mask);

        self.fill_gradient_buffer(gradient);
        mask_apply_luma_premul(&mut self.grad, self.mask.data_as_u8_slice())?;
        let grad = std::mem::take(&mut self.grad);
        let result = premul_over_in_place(&mut self.base, &grad);
        self.grad = grad;
        result
    }

    /// Full-frame linear gradient into `self.grad`, premultiplied.
    fn fill_gradient_buffer(&mut self, gradient: &LinearGradient) {
        let axis = gradient.end - gradient.start;
        let len2 = axis.hypot2();
        let w = usize::from(self.width);
        for (i, px) in self.grad.chunks_exact_mut(4).enumerate() {
            let x = (i % w) as f64 + 0.5;
            let y = (i / w) as f64 + 0.5;
            let t = if len2 > 0.0 {
                (Point::new(x, y) - gradient.start).dot(axis) / len2
            } else {
                0.0
            };
            px.copy_from_slice(&premul_rgba8(gradient.color_at(t)));
        }
    }

    /// Blend a gradient-filled axis-aligned rect straight onto the frame.
    fn blend_gradient_rect(&mut self, rect: &Rect, gradient: &LinearGradient) {
        let x0 = rect.x0.floor().max(0.0) as usize;
        let y0 = rect.y0.floor().max(0.0) as usize;
        let x1 = (rect.x1.ceil() as usize).min(usize::from(self.width));
        let y1 = (rect.y1.ceil() as usize).min(usize::from(self.height));
        let axis = gradient.end - gradient.start;
        let len2 = axis.hypot2();
        let w = usize::from(self.width);
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let t = if len2 > 0.0 {
                    (p - gradient.start).dot(axis) / len2
                } else {
                    0.0
                };
                let src = premul_rgba8(gradient.color_at(t));
                let idx = (y * w + x) * 4;
                let d = &mut self.base[idx..idx + 4];
                let out = premul_over_px([d[0], d[1], d[2], d[3]], src);
                d.copy_from_slice(&out);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_label(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        origin: Point,
        size_px: f32,
        color: [u8; 4],
        opacity: f64,
        scale: f64,
    ) -> CardResult<()> {
        let brush = TextBrushRgba8 {
            r: color[0],
            g: color[1],
            b: color[2],
            a: color[3],
        };
        let layout = self.text.layout_plain(text, font_bytes, size_px, brush)?;
        let (w, h) = (f64::from(layout.width()), f64::from(layout.height()));

        // Layout is centered on `origin`; the pop scale pivots there too.
        let place = Affine::translate(Vec2::new(origin.x - w / 2.0, origin.y - h / 2.0));
        let transform = Affine::translate(origin.to_vec2())
            * Affine::scale(scale)
            * Affine::translate(-origin.to_vec2())
            * place;

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
            0,
        );
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(affine_to_cpu(transform));
        let opacity = opacity.clamp(0.0, 1.0) as f32;
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut self.scratch);
        self.composite_scratch()
    }
}

fn dim_to_u16(v: f64, what: &str) -> CardResult<u16> {
    let r = v.round();
    if !(1.0..=f64::from(u16::MAX)).contains(&r) {
        return Err(CardError::validation(format!(
            "{what} must be in 1..=65535, got {v}"
        )));
    }
    Ok(r as u16)
}

/// Stretch the backdrop image over the whole canvas.
fn backdrop_transform(img: &PreparedImage, width: u16, height: u16) -> Affine {
    Affine::scale_non_uniform(
        f64::from(width) / f64::from(img.width.max(1)),
        f64::from(height) / f64::from(img.height.max(1)),
    )
}

/// Place the arrow glyph with its tip at `tip`, stretched down to `bottom_y`
/// (at least `min_height` tall), then scale about the tip.
fn arrow_transform(
    img: &PreparedImage,
    tip: Point,
    bottom_y: f64,
    min_height: f64,
    scale: f64,
) -> Affine {
    let h = (bottom_y - tip.y).max(min_height);
    let aspect = f64::from(img.width.max(1)) / f64::from(img.height.max(1));
    let w = h * aspect;
    let place = Affine::translate(Vec2::new(tip.x - w / 2.0, tip.y))
        * Affine::scale_non_uniform(w / f64::from(img.width.max(1)), h / f64::from(img.height.max(1)));
    Affine::translate(tip.to_vec2()) * Affine::scale(scale) * Affine::translate(-tip.to_vec2()) * place
}

fn expand_stroke(path: &BezPath, width: f64, round_cap: bool, dash: Option<[f64; 2]>) -> BezPath {
    let mut style = Stroke::new(width);
    if round_cap {
        style = style.with_caps(Cap::Round).with_join(Join::Round);
    }
    if let Some([on, off]) = dash {
        style = style.with_dashes(0.0, [on, off]);
    }
    kurbo::stroke(
        path.elements().iter().copied(),
        &style,
        &StrokeOpts::default(),
        STROKE_TOLERANCE,
    )
}

fn image_paint(img: &PreparedImage) -> CardResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> CardResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CardError::evaluation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CardError::evaluation("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(CardError::evaluation("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let c = Rgba8Premul::from_straight_rgba(rgba[0], rgba[1], rgba[2], rgba[3]);
    [c.r, c.g, c.b, c.a]
}

fn premul_over_px(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - sa;
    let mut out = [0u8; 4];
    out[3] = src[3].saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        let dc = mul_div255_u8(u16::from(dst[c]), inv);
        out[c] = src[c].saturating_add(dc);
    }
    out
}

fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> CardResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(CardError::evaluation(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - sa;
        d[3] = s[3].saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = s[c].saturating_add(dc);
        }
    }
    Ok(())
}

/// Multiply `dst` by the luminance of `mask`, in place, both premultiplied.
fn mask_apply_luma_premul(dst: &mut [u8], mask: &[u8]) -> CardResult<()> {
    if dst.len() != mask.len() || !dst.len().is_multiple_of(4) {
        return Err(CardError::evaluation(
            "mask_apply_luma_premul expects equal-length rgba8 buffers",
        ));
    }
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let r = u16::from(m[0]);
        let g = u16::from(m[1]);
        let b = u16::from(m[2]);
        let luma = (r * 54 + g * 183 + b * 19 + 128) >> 8;
        for c in d.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), luma);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FrameIndex, Fps};
    use crate::geometry::Layout;
    use crate::scene::Scene;
    use crate::theme::Theme;
    use crate::timeline::Timeline;

    fn render_frame(frame: u64) -> FrameRgba8 {
        let dims = Dimensions::default();
        let theme = Theme::default();
        let layout = Layout::compute(dims.width, dims.height);
        let tl = Timeline::new(Fps::new(60, 1).unwrap()).unwrap();
        let scene = Scene::build(dims, &layout, &tl.sample(FrameIndex(frame)), &theme);
        let mut renderer = CpuRenderer::new(dims).unwrap();
        renderer
            .render(&scene, &AssetStore::empty(), theme.background)
            .unwrap()
    }

    #[test]
    fn renders_without_assets() {
        let frame = render_frame(60);
        assert_eq!(frame.width, 412);
        assert_eq!(frame.height, 270);
        assert_eq!(frame.data.len(), 412 * 270 * 4);
        // Opaque background everywhere.
        assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn deterministic_across_runs() {
        let a = render_frame(90);
        let b = render_frame(90);
        assert_eq!(a, b);
    }

    #[test]
    fn frames_differ_while_animating() {
        let a = render_frame(0);
        let b = render_frame(60);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn premul_over_is_noop_for_transparent_src() {
        let mut dst = vec![10, 20, 30, 255, 1, 2, 3, 4];
        let src = vec![0u8; 8];
        premul_over_in_place(&mut dst, &src).unwrap();
        assert_eq!(dst, vec![10, 20, 30, 255, 1, 2, 3, 4]);
    }

    #[test]
    fn premul_over_opaque_src_replaces() {
        let mut dst = vec![10, 20, 30, 255];
        let src = vec![100, 110, 120, 255];
        premul_over_in_place(&mut dst, &src).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn mask_luma_gates_pixels() {
        let mut dst = vec![100, 100, 100, 255, 100, 100, 100, 255];
        let mask = vec![255, 255, 255, 255, 0, 0, 0, 255];
        mask_apply_luma_premul(&mut dst, &mask).unwrap();
        assert_eq!(&dst[..4], &[100, 100, 100, 255]);
        assert_eq!(&dst[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn mismatched_buffers_error() {
        let mut dst = vec![0u8; 8];
        assert!(premul_over_in_place(&mut dst, &[0u8; 4]).is_err());
        assert!(mask_apply_luma_premul(&mut dst, &[0u8; 4]).is_err());
    }

    #[test]
    fn to_straight_rgba_inverts_premultiply() {
        let frame = FrameRgba8 {
            width: 1,
            height: 1,
            data: vec![64, 32, 16, 128],
        };
        let straight = frame.to_straight_rgba();
        assert_eq!(straight[3], 128);
        assert_eq!(straight[0], 127);
    }

    #[test]
    fn oversized_dimensions_rejected() {
        let dims = Dimensions {
            width: 1e6,
            height: 100.0,
        };
        assert!(CpuRenderer::new(dims).is_err());
    }
}
