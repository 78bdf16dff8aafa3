//! Closed-form vertical motion
//!
//! Airborne bodies follow discrete projectile motion from a launch point:
//! `height(n) = origin + power·n − ½·gravity·n²`, with `n` the number of ticks
//! since launch. Power is in px/tick and gravity in px/tick².

use serde::{Deserialize, Serialize};

/// Peak height gained above the launch point for a given launch power
#[inline]
pub fn max_jump_height(power: f64, gravity: f64) -> f64 {
    power * power / (2.0 * gravity)
}

/// A launch: where it started and how hard
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpArc {
    pub origin: f64,
    pub power: f64,
}

impl JumpArc {
    pub fn new(origin: f64, power: f64) -> Self {
        Self { origin, power }
    }

    /// Free fall from `origin`
    pub fn fall(origin: f64) -> Self {
        Self::new(origin, 0.0)
    }

    #[inline]
    pub fn height_at(&self, frame: u32, gravity: f64) -> f64 {
        let n = frame as f64;
        self.origin + self.power * n - 0.5 * gravity * n * n
    }

    /// Height one tick ahead of `frame`
    #[inline]
    pub fn next_height(&self, frame: u32, gravity: f64) -> f64 {
        self.height_at(frame + 1, gravity)
    }

    /// Height one tick before `frame` (the launch point at frame 0)
    #[inline]
    pub fn prev_height(&self, frame: u32, gravity: f64) -> f64 {
        self.height_at(frame.saturating_sub(1), gravity)
    }

    pub fn apex(&self, gravity: f64) -> f64 {
        self.origin + max_jump_height(self.power, gravity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_matches_closed_form() {
        let arc = JumpArc::new(64.0, 14.0);
        let gravity = 1.2;
        for frame in 0..40u32 {
            let n = frame as f64;
            let expected = 64.0 + 14.0 * n - 0.5 * gravity * n * n;
            assert_eq!(arc.height_at(frame, gravity), expected);
        }
    }

    #[test]
    fn test_max_jump_height_energy_identity() {
        assert_eq!(max_jump_height(14.0, 1.2), 14.0 * 14.0 / (2.0 * 1.2));
        assert_eq!(max_jump_height(0.0, 1.0), 0.0);
        assert_eq!(JumpArc::new(10.0, 4.0).apex(2.0), 14.0);
    }

    #[test]
    fn test_free_fall_only_descends() {
        let arc = JumpArc::fall(100.0);
        assert_eq!(arc.height_at(0, 1.0), 100.0);
        let mut last = arc.height_at(0, 1.0);
        for n in 1..10 {
            let h = arc.height_at(n, 1.0);
            assert!(h < last);
            last = h;
        }
    }

    #[test]
    fn test_lookahead() {
        let arc = JumpArc::new(0.0, 10.0);
        assert_eq!(arc.next_height(2, 2.0), arc.height_at(3, 2.0));
        assert_eq!(arc.prev_height(2, 2.0), arc.height_at(1, 2.0));
        assert_eq!(arc.prev_height(0, 2.0), 0.0);
    }
}
