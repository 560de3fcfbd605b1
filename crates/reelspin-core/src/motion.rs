//! Closed-form motion helpers shared by the reel and wheel simulations.
//!
//! Everything here is a pure function of its inputs so simulations can land
//! on exact positions regardless of how the frame times were sliced.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

/// A monotonic ease from an initial speed to rest over a fixed duration,
/// covering an exact distance.
///
/// Modelled as a cubic Hermite segment with `s(0) = 0`, `s'(0) = v0`,
/// `s(T) = distance`, `s'(T) = 0`. The initial speed is capped at
/// `3 * distance / T`, the largest value for which the curve never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrakeCurve {
    pub initial_speed: f32,
    pub distance: f32,
    pub duration: f32,
}

impl BrakeCurve {
    pub fn new(initial_speed: f32, distance: f32, duration: f32) -> Self {
        let distance = finite_or(distance, 0.0).max(0.0);
        let duration = finite_or(duration, 0.0).max(1e-4);
        let max_speed = 3.0 * distance / duration;
        let initial_speed = finite_or(initial_speed, 0.0).clamp(0.0, max_speed);
        Self {
            initial_speed,
            distance,
            duration,
        }
    }

    fn progress(&self, t: f32) -> f32 {
        (t / self.duration).clamp(0.0, 1.0)
    }

    /// Distance covered after `t` seconds. Exactly `distance` once `t >= duration`.
    pub fn distance_at(&self, t: f32) -> f32 {
        if t >= self.duration {
            return self.distance;
        }
        let u = self.progress(t);
        let u2 = u * u;
        let u3 = u2 * u;
        let h10 = u3 - 2.0 * u2 + u;
        let h01 = -2.0 * u3 + 3.0 * u2;
        (h10 * self.duration * self.initial_speed + h01 * self.distance).min(self.distance)
    }

    /// Speed after `t` seconds. Zero once `t >= duration`.
    pub fn speed_at(&self, t: f32) -> f32 {
        if t >= self.duration {
            return 0.0;
        }
        let u = self.progress(t);
        let slope = 6.0 * self.distance / self.duration - 3.0 * self.initial_speed;
        ((1.0 - u) * (self.initial_speed + u * slope)).max(0.0)
    }

    /// Earliest time at which the curve has covered `d`, found by bisection.
    pub fn time_to_reach(&self, d: f32) -> f32 {
        if d <= 0.0 {
            return 0.0;
        }
        if d >= self.distance {
            return self.duration;
        }
        let (mut lo, mut hi) = (0.0f32, self.duration);
        for _ in 0..32 {
            let mid = 0.5 * (lo + hi);
            if self.distance_at(mid) < d {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        hi
    }
}

/// Advance an exponentially decaying velocity by `dt` seconds.
///
/// Returns `(distance_travelled, new_velocity)` for `v(t) = v0 * e^(-rate t)`,
/// integrated exactly so the result does not depend on frame slicing.
pub fn exp_decay_step(velocity: f32, rate: f32, dt: f32) -> (f32, f32) {
    if rate <= 0.0 || !rate.is_finite() {
        return (velocity * dt, velocity);
    }
    let factor = (-rate * dt).exp();
    let travelled = velocity * (1.0 - factor) / rate;
    (travelled, velocity * factor)
}

/// Wrap an angle into `[0, TAU)`.
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Wrap a scalar into `[0, extent)`. Returns the wrapped value and the number
/// of whole extents removed (negative when wrapping backwards).
pub fn wrap_extent(value: f32, extent: f32) -> (f32, i64) {
    if !value.is_finite() || extent <= 0.0 {
        return (0.0, 0);
    }
    let turns = (value / extent).floor();
    let mut wrapped = value - turns * extent;
    let mut turns = turns as i64;
    if wrapped >= extent {
        wrapped -= extent;
        turns += 1;
    }
    if wrapped < 0.0 {
        wrapped += extent;
        turns -= 1;
    }
    if wrapped >= extent || wrapped < 0.0 {
        wrapped = 0.0;
    }
    (wrapped, turns)
}

/// Replace NaN/Infinity with a fallback.
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
