use crate::error::{CardError, CardResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// 0-based frame index within the card's animation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> CardResult<Self> {
        if den == 0 {
            return Err(CardError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(CardError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Nearest frame for a duration given in milliseconds.
    ///
    /// The animation schedule is specified in milliseconds; tracks are built
    /// in whole frames, so delays and durations round to the nearest frame.
    pub fn millis_to_frames(self, millis: f64) -> u64 {
        (millis.max(0.0) / 1000.0 * self.as_f64()).round() as u64
    }
}

/// Card canvas size in logical pixels. Anything positive and finite is valid;
/// sizes at or below twice the layout padding produce a degenerate layout.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 412.0,
            height: 270.0,
        }
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
    }

    #[test]
    fn millis_to_frames_rounds_to_nearest() {
        let fps = Fps::new(60, 1).unwrap();
        assert_eq!(fps.millis_to_frames(2000.0), 120);
        assert_eq!(fps.millis_to_frames(500.0), 30);
        assert_eq!(fps.millis_to_frames(8.0), 0);
        assert_eq!(fps.millis_to_frames(9.0), 1);
        assert_eq!(fps.millis_to_frames(-5.0), 0);
    }

    #[test]
    fn premul_halves_at_half_alpha() {
        let c = Rgba8Premul::from_straight_rgba(255, 0, 255, 128);
        assert_eq!(c.r, 128);
        assert_eq!(c.g, 0);
        assert_eq!(c.b, 128);
        assert_eq!(c.a, 128);
    }
}
