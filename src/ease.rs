#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    OutQuad,
    OutCubic,
    /// Decelerating ease that overshoots its target slightly before arriving.
    /// Used for the arrow "pop"; the overshoot magnitude is fixed.
    OutBack,
}

const BACK_OVERSHOOT: f64 = 1.05;

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::OutBack => {
                let s = BACK_OVERSHOOT;
                let u = 1.0 - t;
                1.0 - u * u * ((s + 1.0) * u - s)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_stable() {
        for ease in [Ease::Linear, Ease::OutQuad, Ease::OutCubic, Ease::OutBack] {
            assert!((ease.apply(0.0)).abs() < 1e-12);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn out_eases_decelerate() {
        for ease in [Ease::OutQuad, Ease::OutCubic] {
            assert!(ease.apply(0.5) > 0.5);
            assert!(ease.apply(0.25) < ease.apply(0.5));
            assert!(ease.apply(0.5) < ease.apply(0.75));
        }
    }

    #[test]
    fn out_back_overshoots() {
        let peak = (1..100)
            .map(|i| Ease::OutBack.apply(f64::from(i) / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
        assert!(peak < 1.1);
    }
}
