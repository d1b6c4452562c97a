//! Session-oriented entry point: a [`Card`] owns the layout, timeline, and
//! renderer for one canvas size and frame rate, and renders frames on demand.

use crate::assets::AssetStore;
use crate::core::{Dimensions, FrameIndex, Fps};
use crate::error::{CardError, CardResult};
use crate::geometry::Layout;
use crate::render::{CpuRenderer, FrameRgba8};
use crate::scene::Scene;
use crate::theme::Theme;
use crate::timeline::Timeline;

pub struct Card {
    dims: Dimensions,
    fps: Fps,
    theme: Theme,
    layout: Layout,
    timeline: Timeline,
    renderer: CpuRenderer,
}

impl Card {
    pub fn new(dims: Dimensions, fps: Fps, theme: Theme) -> CardResult<Self> {
        if !dims.width.is_finite() || !dims.height.is_finite() || dims.width <= 0.0 || dims.height <= 0.0
        {
            return Err(CardError::validation("dimensions must be finite and > 0"));
        }
        let layout = Layout::compute(dims.width, dims.height);
        let timeline = Timeline::new(fps)?;
        let renderer = CpuRenderer::new(dims)?;
        Ok(Self {
            dims,
            fps,
            theme,
            layout,
            timeline,
            renderer,
        })
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The frame index covering `millis` on this card's clock.
    pub fn frame_at_millis(&self, millis: f64) -> FrameIndex {
        FrameIndex(self.fps.millis_to_frames(millis))
    }

    /// The scene for one frame, before rasterization.
    pub fn scene_at(&self, frame: FrameIndex) -> Scene {
        let values = self.timeline.sample(frame);
        Scene::build(self.dims, &self.layout, &values, &self.theme)
    }

    /// Render one frame.
    #[tracing::instrument(skip(self, assets), fields(frame = frame.0))]
    pub fn render_frame(&mut self, frame: FrameIndex, assets: &AssetStore) -> CardResult<FrameRgba8> {
        let scene = self.scene_at(frame);
        self.renderer.render(&scene, assets, self.theme.background)
    }

    /// Render `count` consecutive frames starting at `start`, handing each to
    /// `sink` as it completes.
    #[tracing::instrument(skip(self, assets, sink), fields(start = start.0, count))]
    pub fn render_frames<F>(
        &mut self,
        start: FrameIndex,
        count: u64,
        assets: &AssetStore,
        mut sink: F,
    ) -> CardResult<()>
    where
        F: FnMut(FrameIndex, &FrameRgba8) -> CardResult<()>,
    {
        for i in 0..count {
            let frame = FrameIndex(start.0 + i);
            let out = self.render_frame(frame, assets)?;
            sink(frame, &out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card::new(
            Dimensions::default(),
            Fps::new(60, 1).unwrap(),
            Theme::default(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_bad_dimensions() {
        let fps = Fps::new(60, 1).unwrap();
        for (w, h) in [(0.0, 100.0), (-1.0, 100.0), (f64::NAN, 100.0)] {
            let dims = Dimensions {
                width: w,
                height: h,
            };
            assert!(Card::new(dims, fps, Theme::default()).is_err());
        }
    }

    #[test]
    fn frame_at_millis_uses_card_clock() {
        let card = card();
        assert_eq!(card.frame_at_millis(0.0), FrameIndex(0));
        assert_eq!(card.frame_at_millis(2000.0), FrameIndex(120));
    }

    #[test]
    fn render_frames_visits_every_frame_in_order() {
        let mut card = card();
        let mut seen = Vec::new();
        card.render_frames(FrameIndex(10), 3, &AssetStore::empty(), |f, out| {
            assert_eq!(out.width, 412);
            seen.push(f.0);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![10, 11, 12]);
    }

    #[test]
    fn sink_errors_propagate() {
        let mut card = card();
        let err = card.render_frames(FrameIndex(0), 2, &AssetStore::empty(), |_, _| {
            Err(CardError::evaluation("sink rejected frame"))
        });
        assert!(err.is_err());
    }
}
