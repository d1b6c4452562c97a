//! The card's fixed animation choreography.
//!
//! Every animated scalar is a [`Track`]: a delay plus eased keyframes, sampled
//! purely by frame index. Nothing here mutates per frame — the "driver" is
//! whoever asks [`Timeline::sample`] for a [`FrameIndex`], which keeps the
//! whole schedule deterministic and trivially testable.
//!
//! Ordering between tracks (red staggered after green, arrow after both are
//! underway) is enforced only through the delay constants. There is no
//! completion callback, so a slow host can show the arrow before the curves
//! finish; that is an accepted approximation.

use crate::core::{Fps, FrameIndex};
use crate::ease::Ease;
use crate::error::{CardError, CardResult};

const GREEN_DURATION_MS: f64 = 2000.0;
const RED_DELAY_MS: f64 = 500.0;
const RED_DURATION_MS: f64 = 2000.0;
const ARROW_OPACITY_DELAY_MS: f64 = 1500.0;
const ARROW_OPACITY_DURATION_MS: f64 = 600.0;
const ARROW_SCALE_DELAY_MS: f64 = 900.0;
const ARROW_SCALE_POP_MS: f64 = 320.0;
const ARROW_SCALE_SETTLE_MS: f64 = 140.0;
const ARROW_SCALE_REST: f64 = 0.65;
const ARROW_SCALE_OVERSHOOT: f64 = 1.08;
const PULSE_PERIOD_MS: f64 = 1000.0;
const PULSE_RADIUS_MIN: f64 = 14.0;
const PULSE_RADIUS_MAX: f64 = 24.0;
const PULSE_OPACITY_MAX: f64 = 0.2;
const PULSE_OPACITY_MIN: f64 = 0.06;

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Track-local frame (0 = the moment the delay elapses).
    pub frame: u64,
    pub value: f64,
    /// Ease applied toward the next key.
    pub ease: Ease,
}

/// One animated scalar: an optional start delay, a sorted keyframe chain, and
/// an optional ping-pong loop over the chain's span.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub delay: u64,
    pub keys: Vec<Keyframe>,
    pub looping: bool,
}

/// Lifecycle of a track at a given frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    Idle,
    Animating,
    Settled,
    Looping,
}

impl Track {
    pub fn validate(&self) -> CardResult<()> {
        if self.keys.is_empty() {
            return Err(CardError::animation("track must have at least one key"));
        }
        if !self.keys.windows(2).all(|w| w[0].frame <= w[1].frame) {
            return Err(CardError::animation("track keys must be sorted by frame"));
        }
        if self.keys.iter().any(|k| !k.value.is_finite()) {
            return Err(CardError::animation("track key values must be finite"));
        }
        if self.looping && self.span() == 0 {
            return Err(CardError::animation("looping track span must be > 0"));
        }
        Ok(())
    }

    /// Track-local frame of the last key.
    fn span(&self) -> u64 {
        self.keys.last().map(|k| k.frame).unwrap_or(0)
    }

    pub fn state(&self, frame: FrameIndex) -> TrackState {
        if frame.0 < self.delay {
            return TrackState::Idle;
        }
        if self.looping {
            return TrackState::Looping;
        }
        if frame.0 - self.delay < self.span() {
            TrackState::Animating
        } else {
            TrackState::Settled
        }
    }

    pub fn sample(&self, frame: FrameIndex) -> f64 {
        let Some(first) = self.keys.first() else {
            return 0.0;
        };
        if frame.0 < self.delay {
            return first.value;
        }
        let mut local = frame.0 - self.delay;

        if self.looping {
            let span = self.span();
            let cycle = 2 * span;
            let pos = local % cycle;
            local = if pos <= span { pos } else { cycle - pos };
        }

        let idx = self.keys.partition_point(|k| k.frame <= local);
        if idx == 0 {
            return first.value;
        }
        if idx >= self.keys.len() {
            return self.keys[self.keys.len() - 1].value;
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.frame.saturating_sub(a.frame);
        if denom == 0 {
            return a.value;
        }
        let t = ((local - a.frame) as f64) / (denom as f64);
        let te = a.ease.apply(t);
        a.value + (b.value - a.value) * te
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackId {
    GreenProgress,
    RedProgress,
    ArrowOpacity,
    ArrowScale,
    PulseRadius,
    PulseOpacity,
}

/// All track values at one frame, ready for scene assembly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineValues {
    pub green_progress: f64,
    pub red_progress: f64,
    pub arrow_opacity: f64,
    pub arrow_scale: f64,
    pub pulse_radius: f64,
    pub pulse_opacity: f64,
}

/// The fixed transition schedule, converted from milliseconds to whole frames
/// at construction. There is no pause/resume/replay surface: the timeline is
/// a function of the frame index and nothing else.
#[derive(Clone, Debug)]
pub struct Timeline {
    green: Track,
    red: Track,
    arrow_opacity: Track,
    arrow_scale: Track,
    pulse_radius: Track,
    pulse_opacity: Track,
}

impl Timeline {
    pub fn new(fps: Fps) -> CardResult<Self> {
        let ms = |m: f64| fps.millis_to_frames(m);

        let ramp = |delay_ms: f64, duration_ms: f64| Track {
            delay: ms(delay_ms),
            keys: vec![
                Keyframe {
                    frame: 0,
                    value: 0.0,
                    ease: Ease::OutCubic,
                },
                Keyframe {
                    frame: ms(duration_ms).max(1),
                    value: 1.0,
                    ease: Ease::Linear,
                },
            ],
            looping: false,
        };

        let pop = ms(ARROW_SCALE_POP_MS).max(1);
        let arrow_scale = Track {
            delay: ms(ARROW_SCALE_DELAY_MS),
            keys: vec![
                Keyframe {
                    frame: 0,
                    value: ARROW_SCALE_REST,
                    ease: Ease::OutBack,
                },
                Keyframe {
                    frame: pop,
                    value: ARROW_SCALE_OVERSHOOT,
                    ease: Ease::Linear,
                },
                Keyframe {
                    frame: pop + ms(ARROW_SCALE_SETTLE_MS).max(1),
                    value: 1.0,
                    ease: Ease::Linear,
                },
            ],
            looping: false,
        };

        let pulse = |min: f64, max: f64, ease: Ease| Track {
            delay: 0,
            keys: vec![
                Keyframe {
                    frame: 0,
                    value: min,
                    ease,
                },
                Keyframe {
                    frame: ms(PULSE_PERIOD_MS).max(1),
                    value: max,
                    ease: Ease::Linear,
                },
            ],
            looping: true,
        };

        let tl = Self {
            green: ramp(0.0, GREEN_DURATION_MS),
            red: ramp(RED_DELAY_MS, RED_DURATION_MS),
            arrow_opacity: ramp(ARROW_OPACITY_DELAY_MS, ARROW_OPACITY_DURATION_MS),
            arrow_scale,
            pulse_radius: pulse(PULSE_RADIUS_MIN, PULSE_RADIUS_MAX, Ease::OutCubic),
            pulse_opacity: pulse(PULSE_OPACITY_MAX, PULSE_OPACITY_MIN, Ease::Linear),
        };
        tl.validate()?;
        Ok(tl)
    }

    fn validate(&self) -> CardResult<()> {
        for t in [
            &self.green,
            &self.red,
            &self.arrow_opacity,
            &self.arrow_scale,
            &self.pulse_radius,
            &self.pulse_opacity,
        ] {
            t.validate()?;
        }
        Ok(())
    }

    fn track(&self, id: TrackId) -> &Track {
        match id {
            TrackId::GreenProgress => &self.green,
            TrackId::RedProgress => &self.red,
            TrackId::ArrowOpacity => &self.arrow_opacity,
            TrackId::ArrowScale => &self.arrow_scale,
            TrackId::PulseRadius => &self.pulse_radius,
            TrackId::PulseOpacity => &self.pulse_opacity,
        }
    }

    pub fn state(&self, id: TrackId, frame: FrameIndex) -> TrackState {
        self.track(id).state(frame)
    }

    pub fn sample(&self, frame: FrameIndex) -> TimelineValues {
        TimelineValues {
            green_progress: self.green.sample(frame),
            red_progress: self.red.sample(frame),
            arrow_opacity: self.arrow_opacity.sample(frame),
            arrow_scale: self.arrow_scale.sample(frame),
            pulse_radius: self.pulse_radius.sample(frame),
            pulse_opacity: self.pulse_opacity.sample(frame),
        }
    }
}
