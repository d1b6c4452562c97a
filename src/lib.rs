//! Curvecard renders an animated market-trend card, deterministically and on
//! the CPU.
//!
//! The card is a fixed composition: a pair of gradient-stroked curves drawn
//! on over a chart scaffold, an arrow glyph that pops in, and a pulsing end
//! marker. The public API is session-oriented:
//!
//! - Build a [`Card`] for a canvas size, frame rate, and [`Theme`]
//! - Render single frames or stream a range through [`Card::render_frames`]
//!
//! Rendering is a pure function of the frame index; no clocks, no IO inside
//! the render path. Asset loading happens once, up front, in [`AssetStore`].
#![forbid(unsafe_code)]

mod math;

pub mod assets;
pub mod core;
pub mod ease;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod render;
pub mod sampler;
pub mod scene;
pub mod theme;
pub mod timeline;

pub use crate::assets::AssetStore;
pub use crate::core::{Affine, BezPath, Dimensions, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2};
pub use crate::error::{CardError, CardResult};
pub use crate::geometry::Layout;
pub use crate::pipeline::Card;
pub use crate::render::{CpuRenderer, FrameRgba8};
pub use crate::sampler::{SampledPath, sample, sample_path, trim};
pub use crate::scene::Scene;
pub use crate::theme::Theme;
pub use crate::timeline::{Timeline, TimelineValues, TrackId, TrackState};
