//! Difficulty curves
//!
//! A tunable that may ramp with progress is a `Curve`: either a constant or a
//! pure function of `(score, elapsed_ms)`. Curves are sampled once per tick
//! into a [`Difficulty`](crate::settings::Difficulty) snapshot and never cached,
//! since both inputs move every tick.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// A value that is either fixed or derived from live game progress
pub enum Curve<T> {
    Constant(T),
    Dynamic(Rc<dyn Fn(u64, f64) -> T>),
}

impl<T: Clone> Curve<T> {
    pub fn constant(value: T) -> Self {
        Curve::Constant(value)
    }

    /// Wrap an arbitrary function of `(score, elapsed_ms)`
    pub fn from_fn(f: impl Fn(u64, f64) -> T + 'static) -> Self {
        Curve::Dynamic(Rc::new(f))
    }

    #[inline]
    pub fn evaluate(&self, score: u64, elapsed_ms: f64) -> T {
        match self {
            Curve::Constant(value) => value.clone(),
            Curve::Dynamic(f) => f(score, elapsed_ms),
        }
    }
}

impl<T> From<T> for Curve<T> {
    fn from(value: T) -> Self {
        Curve::Constant(value)
    }
}

impl<T: Clone> Clone for Curve<T> {
    fn clone(&self) -> Self {
        match self {
            Curve::Constant(value) => Curve::Constant(value.clone()),
            Curve::Dynamic(f) => Curve::Dynamic(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Curve<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Curve::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Linear ramp over score and elapsed seconds, optionally clamped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    pub base: f64,
    #[serde(default)]
    pub per_score: f64,
    #[serde(default)]
    pub per_second: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl Ramp {
    pub fn sample(&self, score: u64, elapsed_ms: f64) -> f64 {
        let mut value =
            self.base + self.per_score * score as f64 + self.per_second * elapsed_ms / 1000.0;
        if let Some(max) = self.max {
            value = value.min(max);
        }
        if let Some(min) = self.min {
            value = value.max(min);
        }
        value
    }
}

/// Config-file form of a scalar curve: a bare number or a ramp table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurveSpec {
    Fixed(f64),
    Ramp(Ramp),
}

impl CurveSpec {
    pub fn sample(&self, score: u64, elapsed_ms: f64) -> f64 {
        match self {
            CurveSpec::Fixed(value) => *value,
            CurveSpec::Ramp(ramp) => ramp.sample(score, elapsed_ms),
        }
    }

    /// Largest value the curve can ever produce, if it is capped
    pub fn upper_bound(&self) -> Option<f64> {
        match self {
            CurveSpec::Fixed(value) => Some(*value),
            CurveSpec::Ramp(ramp) => match ramp.max {
                Some(max) => Some(max),
                // A ramp that never grows is capped by its base
                None if ramp.per_score <= 0.0 && ramp.per_second <= 0.0 => {
                    Some(ramp.min.map_or(ramp.base, |min| ramp.base.max(min)))
                }
                None => None,
            },
        }
    }

    pub fn to_curve(&self) -> Curve<f64> {
        match self {
            CurveSpec::Fixed(value) => Curve::Constant(*value),
            CurveSpec::Ramp(ramp) => {
                let ramp = ramp.clone();
                Curve::from_fn(move |score, elapsed_ms| ramp.sample(score, elapsed_ms))
            }
        }
    }
}

impl From<f64> for CurveSpec {
    fn from(value: f64) -> Self {
        CurveSpec::Fixed(value)
    }
}

/// Inclusive {min, max} bound on a run of tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    /// Build bounds, lifting `max` to at least `min`
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Raise both ends to at least `floor`
    pub fn at_least(self, floor: u32) -> Self {
        Self::new(self.min.max(floor), self.max.max(floor))
    }

    /// Decide whether a run that would have `len` tiles once closed ends now.
    ///
    /// Below `min` never, at or above `max` always, in between with a
    /// probability that grows linearly from `1/(span)` to `1`. `roll` is a
    /// uniform sample in `[0, 1)`.
    pub fn should_close(&self, len: u32, roll: f64) -> bool {
        if len < self.min {
            false
        } else if len >= self.max {
            true
        } else {
            let span = (self.max - self.min + 1) as f64;
            roll < (len - self.min + 1) as f64 / span
        }
    }
}

/// Config-file form of a bounds curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsSpec {
    pub min: CurveSpec,
    pub max: CurveSpec,
}

impl BoundsSpec {
    pub fn fixed(min: u32, max: u32) -> Self {
        Self {
            min: CurveSpec::Fixed(min as f64),
            max: CurveSpec::Fixed(max as f64),
        }
    }

    pub fn sample(&self, score: u64, elapsed_ms: f64) -> Bounds {
        bounds_from(
            self.min.sample(score, elapsed_ms),
            self.max.sample(score, elapsed_ms),
        )
    }

    pub fn to_curve(&self) -> Curve<Bounds> {
        match (&self.min, &self.max) {
            (CurveSpec::Fixed(min), CurveSpec::Fixed(max)) => {
                Curve::Constant(bounds_from(*min, *max))
            }
            _ => {
                let spec = self.clone();
                Curve::from_fn(move |score, elapsed_ms| spec.sample(score, elapsed_ms))
            }
        }
    }
}

fn bounds_from(min: f64, max: f64) -> Bounds {
    let clamp = |v: f64| if v.is_finite() { v.round().max(0.0) as u32 } else { 0 };
    Bounds::new(clamp(min), clamp(max))
}
