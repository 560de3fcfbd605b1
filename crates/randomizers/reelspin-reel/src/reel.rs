use serde::{Deserialize, Serialize};

use reelspin_core::clock::sanitize_dt;
use reelspin_core::motion::{BrakeCurve, finite_or, wrap_extent};

use crate::config::{PhysicsConfig, TimingProfile};
use crate::strip::ReelStrip;

/// Item boundaries wrap to this position, so every landing target is here.
const ALIGNED_POSITION: f32 = 0.0;

/// Lifecycle of a single reel. Strictly forward-moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReelPhase {
    Waiting,
    Accelerating,
    Spinning,
    Decelerating,
    Bouncing,
    Stopped,
}

/// Per-column constants resolved from the shared config and timing profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ReelParams {
    acceleration: f32,
    max_velocity: f32,
    deceleration: f32,
    bounce_dampening: f32,
    item_extent: f32,
    overshoot: f32,
    bounce_duration: f32,
    max_dt: f32,
    position_epsilon: f32,
    velocity_epsilon: f32,
    visible_rows: u32,
    /// Scheduled run time of this column (s).
    column_duration: f32,
    /// Braking window at the end of the run (s).
    deceleration_window: f32,
    /// Elapsed time after which the reel is force-stopped (s).
    deadline: f32,
}

impl ReelParams {
    fn new(config: &PhysicsConfig, timing: &TimingProfile, index: usize) -> Self {
        let column_duration = timing.column_duration(index);
        let deceleration_window = timing.deceleration_secs();
        let bounce_duration = config.bounce_duration_ms / 1000.0;
        // Braking is stretched when the window would need more than `deceleration`
        let stretch = (config.max_velocity / config.deceleration - deceleration_window).max(0.0);
        Self {
            acceleration: config.acceleration,
            max_velocity: config.max_velocity,
            deceleration: config.deceleration,
            bounce_dampening: config.bounce_dampening,
            item_extent: config.item_extent,
            overshoot: config.overshoot(),
            bounce_duration,
            max_dt: config.max_dt(),
            position_epsilon: config.position_epsilon,
            velocity_epsilon: config.velocity_epsilon,
            visible_rows: config.visible_rows,
            column_duration,
            deceleration_window,
            deadline: column_duration + stretch + bounce_duration + config.safety_margin_ms / 1000.0,
        }
    }
}

/// Braking plan fixed when the reel commits to its landing slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Landing {
    origin_position: f32,
    origin_cursor: i64,
    /// Distance from the commit point to the target boundary.
    target_distance: f32,
    /// Item boundaries between the commit slot and the landing slot.
    landing_items: i64,
    brake: BrakeCurve,
    brake_time: f32,
    bounce: Option<BrakeCurve>,
    bounce_time: f32,
}

/// Renderable view of a reel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelSnapshot {
    pub column: usize,
    pub phase: ReelPhase,
    pub position: f32,
    pub velocity: f32,
    pub motion_blur: f32,
    pub cursor: i64,
    pub center_item: usize,
    pub target_position: Option<f32>,
}

/// One column of the slot machine.
///
/// Turns elapsed time into a wrapped scroll offset in `[0, item_extent)`, an
/// item cursor and a blur level. Once committed it lands the winning item
/// exactly in the centre slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReelState {
    index: usize,
    position: f32,
    velocity: f32,
    phase: ReelPhase,
    target_position: Option<f32>,
    cursor: i64,
    winner: usize,
    strip: ReelStrip,
    params: ReelParams,
    landing: Option<Landing>,
    last_elapsed: f32,
    stopped_at: Option<f32>,
    forced: bool,
}

impl ReelState {
    /// Create a reel at rest showing `start_item`, destined to land on `winner`.
    /// Inputs are validated by the sequence that owns the reel.
    pub fn new(
        index: usize,
        pool_size: usize,
        start_item: usize,
        winner: usize,
        config: &PhysicsConfig,
        timing: &TimingProfile,
    ) -> Self {
        Self {
            index,
            position: 0.0,
            velocity: 0.0,
            phase: ReelPhase::Waiting,
            target_position: None,
            cursor: 0,
            winner,
            strip: ReelStrip::new(pool_size, start_item),
            params: ReelParams::new(config, timing, index),
            landing: None,
            last_elapsed: 0.0,
            stopped_at: None,
            forced: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> ReelPhase {
        self.phase
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == ReelPhase::Stopped
    }

    /// Scroll offset within the current item, always in `[0, item_extent)`.
    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Landing offset, fixed once the reel starts decelerating.
    pub fn target_position(&self) -> Option<f32> {
        self.target_position
    }

    /// Item boundaries crossed since the spin began.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn winner(&self) -> usize {
        self.winner
    }

    /// Scheduled run time of this column in seconds.
    pub fn column_duration(&self) -> f32 {
        self.params.column_duration
    }

    /// Elapsed time (s) at which the reel stopped.
    pub fn stopped_at(&self) -> Option<f32> {
        self.stopped_at
    }

    /// Whether the stop came from a safety cutoff or explicit force stop.
    pub fn was_forced(&self) -> bool {
        self.forced
    }

    /// Visual feedback level in `[0, 1]`, proportional to speed.
    pub fn motion_blur(&self) -> f32 {
        (self.velocity.abs() / self.params.max_velocity).clamp(0.0, 1.0)
    }

    /// Pool index of the item in the centre slot.
    pub fn visible_item(&self) -> usize {
        self.strip.item_at(self.cursor)
    }

    /// Pool indices from `rows` above the centre to `rows` below, top first.
    pub fn visible_items(&self, rows: u32) -> Vec<usize> {
        let rows = i64::from(rows);
        (-rows..=rows)
            .map(|offset| self.strip.item_at(self.cursor + offset))
            .collect()
    }

    pub fn snapshot(&self) -> ReelSnapshot {
        ReelSnapshot {
            column: self.index,
            phase: self.phase,
            position: self.position,
            velocity: self.velocity,
            motion_blur: self.motion_blur(),
            cursor: self.cursor,
            center_item: self.visible_item(),
            target_position: self.target_position,
        }
    }

    /// Advance the reel by one frame. Returns `true` on the call that stops it.
    ///
    /// `dt` is clamped to the configured frame ceiling; `elapsed` (seconds
    /// since the sequence started) drives scheduling and the safety cutoff.
    /// At most one phase transition happens per call.
    pub fn advance(&mut self, elapsed: f32, dt: f32) -> bool {
        if self.phase == ReelPhase::Stopped {
            return false;
        }
        if !dt.is_finite() || !elapsed.is_finite() {
            tracing::warn!(column = self.index, dt, elapsed, "Non-finite frame time, skipping integration");
        }
        let elapsed = finite_or(elapsed, self.last_elapsed).max(self.last_elapsed);
        self.last_elapsed = elapsed;

        if elapsed > self.params.deadline {
            tracing::warn!(
                column = self.index,
                elapsed,
                deadline = self.params.deadline,
                phase = ?self.phase,
                "Reel exceeded safety ceiling, forcing stop"
            );
            return self.force_stop();
        }

        let dt = sanitize_dt(dt, self.params.max_dt);
        self.velocity = finite_or(self.velocity, 0.0);

        match self.phase {
            ReelPhase::Waiting => {
                self.enter(ReelPhase::Accelerating);
                self.accelerate(dt);
                false
            },
            ReelPhase::Accelerating => {
                self.accelerate(dt);
                if self.velocity >= self.params.max_velocity {
                    self.velocity = self.params.max_velocity;
                    self.enter(ReelPhase::Spinning);
                } else if self.brake_window_open(elapsed) {
                    self.enter(ReelPhase::Spinning);
                }
                false
            },
            ReelPhase::Spinning => {
                if self.brake_window_open(elapsed) {
                    self.commit(self.natural_braking());
                    self.enter(ReelPhase::Decelerating);
                    self.brake(dt)
                } else {
                    self.scroll(dt);
                    false
                }
            },
            ReelPhase::Decelerating => self.brake(dt),
            ReelPhase::Bouncing => self.bounce_back(dt),
            ReelPhase::Stopped => false,
        }
    }

    /// Land on the committed target immediately (committing first if the reel
    /// is still spinning). Returns `false` if the reel was already stopped.
    pub fn force_stop(&mut self) -> bool {
        if self.phase == ReelPhase::Stopped {
            return false;
        }
        if self.landing.is_none() {
            let braking = (0.0, self.params.deceleration_window);
            self.commit(braking);
        }
        self.forced = true;
        self.land()
    }

    fn enter(&mut self, phase: ReelPhase) {
        tracing::debug!(column = self.index, from = ?self.phase, to = ?phase, "Reel phase change");
        self.phase = phase;
    }

    fn brake_window_open(&self, elapsed: f32) -> bool {
        self.params.column_duration - elapsed < self.params.deceleration_window
    }

    fn accelerate(&mut self, dt: f32) {
        self.velocity = (self.velocity + self.params.acceleration * dt).min(self.params.max_velocity);
        self.scroll(dt);
    }

    fn scroll(&mut self, dt: f32) {
        let (position, turns) = wrap_extent(self.position + self.velocity * dt, self.params.item_extent);
        self.position = position;
        self.cursor += turns;
    }

    /// Braking distance and duration for the current speed: a linear ramp to
    /// rest over the window, stretched if that would brake harder than allowed.
    fn natural_braking(&self) -> (f32, f32) {
        let v0 = self.velocity.max(0.0);
        let duration = self
            .params
            .deceleration_window
            .max(v0 / self.params.deceleration)
            .max(1e-3);
        (v0 * duration / 2.0, duration)
    }

    /// Fix the landing slot at the first item boundary at or beyond the
    /// natural stopping point, and splice the winner into it.
    fn commit(&mut self, (natural_distance, duration): (f32, f32)) {
        let extent = self.params.item_extent;
        let stop_point = self.position + natural_distance;
        let landing_items = (stop_point / extent).ceil().max(0.0) as i64;
        let target_distance = (landing_items as f32 * extent - self.position).max(0.0);
        let brake = BrakeCurve::new(
            self.velocity.max(0.0),
            target_distance + self.params.overshoot,
            duration,
        );

        self.strip
            .splice(self.cursor + landing_items, self.winner, self.params.visible_rows);
        self.target_position = Some(ALIGNED_POSITION);
        self.landing = Some(Landing {
            origin_position: self.position,
            origin_cursor: self.cursor,
            target_distance,
            landing_items,
            brake,
            brake_time: 0.0,
            bounce: None,
            bounce_time: 0.0,
        });
        tracing::debug!(
            column = self.index,
            landing_items,
            target_distance,
            winner = self.winner,
            "Reel committed to landing slot"
        );
    }

    fn travel_to(&mut self, landing: &Landing, distance: f32) {
        let (position, turns) = wrap_extent(
            landing.origin_position + distance,
            self.params.item_extent,
        );
        self.position = position;
        self.cursor = landing.origin_cursor + turns;
    }

    fn brake(&mut self, dt: f32) -> bool {
        let Some(mut landing) = self.landing else {
            return self.force_stop();
        };
        landing.brake_time += dt;
        let travelled = landing.brake.distance_at(landing.brake_time);
        let speed = landing.brake.speed_at(landing.brake_time);
        self.travel_to(&landing, travelled);
        self.velocity = speed;

        let remaining = landing.target_distance - travelled;
        if remaining.abs() < self.params.position_epsilon && speed < self.params.velocity_epsilon {
            self.landing = Some(landing);
            return self.land();
        }

        if landing.brake_time >= landing.brake.duration {
            // Came to rest past the target: bounce back with damped speed
            let crossing = landing.brake.time_to_reach(landing.target_distance);
            let rebound = landing.brake.speed_at(crossing) * self.params.bounce_dampening;
            let bounce = BrakeCurve::new(rebound, -remaining, self.params.bounce_duration);
            landing.bounce = Some(bounce);
            landing.bounce_time = 0.0;
            self.velocity = -bounce.initial_speed;
            self.landing = Some(landing);
            self.enter(ReelPhase::Bouncing);
            return false;
        }

        self.landing = Some(landing);
        false
    }

    fn bounce_back(&mut self, dt: f32) -> bool {
        let Some(mut landing) = self.landing else {
            return self.force_stop();
        };
        let Some(bounce) = landing.bounce else {
            return self.land();
        };
        landing.bounce_time += dt;
        let returned = bounce.distance_at(landing.bounce_time);
        let remaining = bounce.distance - returned;
        self.travel_to(&landing, landing.target_distance + remaining);
        self.velocity = -bounce.speed_at(landing.bounce_time);
        self.landing = Some(landing);

        let settled = remaining < self.params.position_epsilon
            && self.velocity.abs() < self.params.velocity_epsilon;
        if settled || landing.bounce_time >= bounce.duration {
            return self.land();
        }
        false
    }

    /// Snap exactly onto the target and stop.
    fn land(&mut self) -> bool {
        let Some(landing) = self.landing else {
            return false;
        };
        self.position = ALIGNED_POSITION;
        self.cursor = landing.origin_cursor + landing.landing_items;
        self.velocity = 0.0;
        self.stopped_at = Some(self.last_elapsed);
        self.enter(ReelPhase::Stopped);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_reel(config: &PhysicsConfig, index: usize, winner: usize) -> ReelState {
        ReelState::new(index, 12, 0, winner, config, &config.quick)
    }

    /// Run at 60 Hz until stopped; returns the elapsed stop time.
    fn run_to_stop(reel: &mut ReelState) -> f32 {
        let dt = 1.0 / 60.0;
        for i in 1..2000 {
            let elapsed = i as f32 * dt;
            if reel.advance(elapsed, dt) {
                return elapsed;
            }
        }
        panic!("reel never stopped, phase = {:?}", reel.phase());
    }

    #[test]
    fn first_advance_starts_accelerating() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 3);
        assert_eq!(reel.phase(), ReelPhase::Waiting);
        reel.advance(0.016, 0.016);
        assert_eq!(reel.phase(), ReelPhase::Accelerating);
        assert!(reel.velocity() > 0.0);
    }

    #[test]
    fn reaches_exact_cruise_speed() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 3);
        let dt = 1.0 / 60.0;
        let mut i = 1;
        while reel.phase() != ReelPhase::Spinning {
            reel.advance(i as f32 * dt, dt);
            i += 1;
            assert!(i < 100, "never reached cruise speed");
        }
        assert_eq!(reel.velocity(), config.max_velocity);
    }

    #[test]
    fn stops_exactly_on_target_with_winner_centred() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 7);
        run_to_stop(&mut reel);

        assert_eq!(reel.phase(), ReelPhase::Stopped);
        assert_eq!(reel.position(), 0.0);
        assert_eq!(Some(reel.position()), reel.target_position());
        assert_eq!(reel.velocity(), 0.0);
        assert_eq!(reel.visible_item(), 7);
        assert!(!reel.was_forced());
    }

    #[test]
    fn fast_reel_lands_on_zero() {
        // itemExtent 80, maxVelocity 4000, target boundary wraps to 0
        let config = PhysicsConfig {
            item_extent: 80.0,
            max_velocity: 4000.0,
            ..Default::default()
        };
        let mut reel = quick_reel(&config, 0, 0);
        run_to_stop(&mut reel);
        assert_eq!(reel.position(), 0.0);
        assert_eq!(reel.phase(), ReelPhase::Stopped);
        assert_eq!(reel.visible_item(), 0);
    }

    #[test]
    fn phases_only_move_forward() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 2, 5);
        let dt = 1.0 / 60.0;
        let mut seen = vec![reel.phase()];
        for i in 1..2000 {
            reel.advance(i as f32 * dt, dt);
            if *seen.last().unwrap() != reel.phase() {
                seen.push(reel.phase());
            }
            if reel.is_stopped() {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                ReelPhase::Waiting,
                ReelPhase::Accelerating,
                ReelPhase::Spinning,
                ReelPhase::Decelerating,
                ReelPhase::Bouncing,
                ReelPhase::Stopped,
            ]
        );
    }

    #[test]
    fn bounce_moves_backwards() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 1);
        let dt = 1.0 / 60.0;
        let mut saw_reverse = false;
        for i in 1..2000 {
            reel.advance(i as f32 * dt, dt);
            if reel.phase() == ReelPhase::Bouncing {
                assert!(reel.velocity() <= 0.0);
                saw_reverse |= reel.velocity() < 0.0;
            }
            if reel.is_stopped() {
                break;
            }
        }
        assert!(saw_reverse, "bounce should reverse the reel");
    }

    #[test]
    fn zero_overshoot_skips_bounce() {
        let config = PhysicsConfig {
            overshoot_ratio: 0.0,
            ..Default::default()
        };
        let mut reel = quick_reel(&config, 0, 4);
        let dt = 1.0 / 60.0;
        for i in 1..2000 {
            reel.advance(i as f32 * dt, dt);
            assert_ne!(reel.phase(), ReelPhase::Bouncing);
            if reel.is_stopped() {
                break;
            }
        }
        assert!(reel.is_stopped());
        assert_eq!(reel.visible_item(), 4);
    }

    #[test]
    fn stop_time_matches_schedule() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 3, 2);
        let stopped = run_to_stop(&mut reel);
        let expected = config.quick.column_duration(3) + config.bounce_duration_ms / 1000.0;
        assert!(
            (stopped - expected).abs() <= 3.0 / 60.0,
            "stopped at {stopped}, expected about {expected}"
        );
    }

    #[test]
    fn target_fixed_once_decelerating() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 9);
        let dt = 1.0 / 60.0;
        let mut target = None;
        for i in 1..2000 {
            reel.advance(i as f32 * dt, dt);
            match reel.phase() {
                ReelPhase::Waiting | ReelPhase::Accelerating | ReelPhase::Spinning => {
                    assert_eq!(reel.target_position(), None);
                },
                _ => {
                    let t = reel.target_position();
                    assert!(t.is_some());
                    if target.is_none() {
                        target = t;
                    }
                    assert_eq!(t, target);
                },
            }
            if reel.is_stopped() {
                break;
            }
        }
    }

    #[test]
    fn safety_ceiling_forces_exact_stop() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 6);
        reel.advance(0.016, 0.016);
        reel.advance(0.032, 0.016);
        // Wall clock jumps far past the deadline
        let stopped = reel.advance(60.0, 0.016);
        assert!(stopped);
        assert!(reel.was_forced());
        assert_eq!(reel.position(), 0.0);
        assert_eq!(reel.velocity(), 0.0);
        assert_eq!(reel.visible_item(), 6);
    }

    #[test]
    fn force_stop_is_idempotent() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 1, 8);
        for i in 1..30 {
            reel.advance(i as f32 / 60.0, 1.0 / 60.0);
        }
        assert!(reel.force_stop());
        let snapshot = reel.snapshot();
        assert!(!reel.force_stop());
        assert_eq!(reel.snapshot(), snapshot);
        assert!(!reel.advance(1.0, 1.0 / 60.0));
        assert_eq!(reel.snapshot(), snapshot);
    }

    #[test]
    fn force_stop_before_first_tick_lands_winner() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 11);
        assert!(reel.force_stop());
        assert_eq!(reel.position(), 0.0);
        assert_eq!(reel.visible_item(), 11);
    }

    #[test]
    fn hitch_is_clamped() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 4, 0);
        let dt = 1.0 / 60.0;
        let mut i = 1;
        while reel.phase() != ReelPhase::Spinning {
            reel.advance(i as f32 * dt, dt);
            i += 1;
        }
        let before = reel.cursor() as f32 * config.item_extent + reel.position();
        reel.advance(i as f32 * dt + 5.0, 5.0);
        let after = reel.cursor() as f32 * config.item_extent + reel.position();
        let jump = after - before;
        assert!(jump <= config.max_velocity * config.max_dt() + 1e-3);
        assert!(jump < config.item_extent, "jumped {jump}px in one tick");
    }

    #[test]
    fn nan_dt_does_not_poison_state() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 2);
        reel.advance(0.016, 0.016);
        reel.advance(0.032, f32::NAN);
        reel.advance(f32::NAN, 0.016);
        assert!(reel.position().is_finite());
        assert!(reel.velocity().is_finite());
        run_to_stop(&mut reel);
        assert_eq!(reel.visible_item(), 2);
    }

    #[test]
    fn start_item_is_visible_before_spin() {
        let config = PhysicsConfig::default();
        let reel = ReelState::new(0, 12, 5, 1, &config, &config.quick);
        assert_eq!(reel.visible_item(), 5);
        assert_eq!(reel.visible_items(1), vec![4, 5, 6]);
    }

    #[test]
    fn motion_blur_tracks_speed() {
        let config = PhysicsConfig::default();
        let mut reel = quick_reel(&config, 0, 2);
        assert_eq!(reel.motion_blur(), 0.0);
        let dt = 1.0 / 60.0;
        for i in 1..30 {
            reel.advance(i as f32 * dt, dt);
        }
        assert_eq!(reel.motion_blur(), 1.0);
        run_to_stop(&mut reel);
        assert_eq!(reel.motion_blur(), 0.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn position_always_wrapped_and_reel_terminates(
                winner in 0usize..12,
                index in 0usize..5,
                dts in proptest::collection::vec(0.0f32..0.2, 50..400),
            ) {
                let config = PhysicsConfig::default();
                let mut reel = ReelState::new(index, 12, 0, winner, &config, &config.quick);
                let mut elapsed = 0.0f32;
                for dt in dts {
                    elapsed += dt;
                    reel.advance(elapsed, dt);
                    prop_assert!(
                        reel.position() >= 0.0 && reel.position() < config.item_extent,
                        "position {} out of range", reel.position()
                    );
                }
                // Keep ticking at 60 Hz; the reel must stop within its deadline
                for _ in 0..1200 {
                    if reel.is_stopped() {
                        break;
                    }
                    elapsed += 1.0 / 60.0;
                    reel.advance(elapsed, 1.0 / 60.0);
                }
                prop_assert!(reel.is_stopped());
                prop_assert_eq!(reel.position(), 0.0);
                prop_assert_eq!(reel.velocity(), 0.0);
                prop_assert_eq!(reel.visible_item(), winner);
            }

            #[test]
            fn any_item_extent_lands_exactly(
                item_extent in 10.0f32..300.0,
                max_velocity in 200.0f32..5000.0,
                winner in 0usize..30,
            ) {
                let config = PhysicsConfig {
                    item_extent,
                    max_velocity,
                    ..Default::default()
                };
                let mut reel = ReelState::new(0, 30, 0, winner, &config, &config.quick);
                let dt = 1.0 / 60.0;
                let mut elapsed = 0.0;
                for _ in 0..1200 {
                    elapsed += dt;
                    reel.advance(elapsed, dt);
                    if reel.is_stopped() {
                        break;
                    }
                }
                prop_assert!(reel.is_stopped());
                prop_assert_eq!(reel.position(), 0.0);
                prop_assert_eq!(reel.visible_item(), winner);
            }
        }
    }
}
