use serde::{Deserialize, Serialize};

use reelspin_core::clock::sanitize_dt;
use reelspin_core::motion::{exp_decay_step, finite_or, normalize_angle};

use crate::config::WheelConfig;
use crate::pocket::{pocket_center, pocket_index};

/// Lifecycle of a wheel spin. Strictly forward-moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WheelPhase {
    Idle,
    Spinning,
    Falling,
    Settling,
    Complete,
}

/// Pocket the ball is steered into once it has dropped onto the pocket ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettlePlan {
    pub pocket: usize,
    /// Pocket centre in the wheel's frame.
    pub center: f32,
    /// +1 or -1, the direction the ball travels relative to the wheel.
    pub direction: f32,
    /// Exponential catch rate (1/s).
    pub rate: f32,
    /// Angular distance left to the centre, along `direction`.
    pub remaining: f32,
}

/// What a single physics step changed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub entered: Option<WheelPhase>,
    /// Bounce number, when the ball bounced on this step.
    pub bounce: Option<u32>,
}

/// Full physical state of the disc and ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelState {
    pub phase: WheelPhase,
    pub wheel_angle: f32,
    pub wheel_velocity: f32,
    /// Ball angle measured on the disc, in `[0, 2π)`. Pockets are painted on
    /// the disc, so this alone decides the pocket under the ball.
    pub ball_angle: f32,
    /// Ball speed over the ground (rad/s), not relative to the disc.
    pub ball_velocity: f32,
    /// Distance from the centre, between the pocket ring and the outer track.
    pub ball_radius: f32,
    /// Height above the pocket ring while falling.
    pub ball_height: f32,
    pub ball_fall_velocity: f32,
    pub bounce_count: u32,
    pub landed: bool,
    pub locked: bool,
    pub settle: Option<SettlePlan>,
}

impl WheelState {
    /// Wheel at rest with the ball parked on the outer track.
    pub fn at_rest(config: &WheelConfig) -> Self {
        Self {
            phase: WheelPhase::Idle,
            wheel_angle: 0.0,
            wheel_velocity: 0.0,
            ball_angle: 0.0,
            ball_velocity: 0.0,
            ball_radius: config.outer_track_radius,
            ball_height: 0.0,
            ball_fall_velocity: 0.0,
            bounce_count: 0,
            landed: false,
            locked: false,
            settle: None,
        }
    }

    /// Fresh spin from the current angles.
    pub fn launch(&mut self, config: &WheelConfig, wheel_speed: f32, ball_speed: f32) {
        let wheel_angle = self.wheel_angle;
        let ball_angle = self.ball_angle;
        *self = Self {
            phase: WheelPhase::Spinning,
            wheel_angle,
            wheel_velocity: wheel_speed,
            ball_angle,
            ball_velocity: ball_speed,
            ..Self::at_rest(config)
        };
    }

    /// Ball angle as seen by a fixed observer, for drawing.
    pub fn world_ball_angle(&self) -> f32 {
        normalize_angle(self.wheel_angle + self.ball_angle)
    }

    /// Pocket currently under the ball.
    pub fn pocket(&self, pocket_count: usize) -> usize {
        pocket_index(self.ball_angle, pocket_count)
    }

    /// Advance by `dt` seconds. At most one phase transition per call.
    ///
    /// `target` is the pocket to steer into once settling starts; `None`
    /// lets the ball take the nearest pocket ahead of it.
    pub fn step(&mut self, config: &WheelConfig, target: Option<usize>, dt: f32) -> StepReport {
        let dt = sanitize_dt(dt, config.max_dt());
        self.wheel_velocity = finite_or(self.wheel_velocity, 0.0);
        self.ball_velocity = finite_or(self.ball_velocity, 0.0);
        let mut report = StepReport::default();

        match self.phase {
            WheelPhase::Idle | WheelPhase::Complete => {},
            WheelPhase::Spinning => {
                let turned = self.turn_wheel(config, dt);
                self.roll_ball(config, dt, turned);
                if self.ball_velocity.abs() < config.fall_threshold {
                    self.ball_height = config.drop_height;
                    self.ball_fall_velocity = 0.0;
                    report.entered = Some(self.enter(WheelPhase::Falling));
                }
            },
            WheelPhase::Falling => {
                let turned = self.turn_wheel(config, dt);
                self.roll_ball(config, dt, turned);
                self.ball_radius = (self.ball_radius - config.fall_speed * dt).max(config.pocket_radius);
                report.bounce = self.fall_step(config, dt);
                if self.landed && self.ball_radius <= config.pocket_radius {
                    self.begin_settle(config, target);
                    report.entered = Some(self.enter(WheelPhase::Settling));
                }
            },
            WheelPhase::Settling => {
                self.turn_wheel(config, dt);
                self.steer(config, dt);
                if self.locked && self.wheel_velocity.abs() < config.wheel_stop_threshold {
                    self.complete();
                    report.entered = Some(WheelPhase::Complete);
                }
            },
        }
        report
    }

    /// Snap the ball into its pocket and finish. Uses the active settle plan,
    /// or makes one (toward `target` when given) if the ball has not settled.
    pub fn force_complete(&mut self, config: &WheelConfig, target: Option<usize>) {
        if self.phase == WheelPhase::Complete {
            return;
        }
        if self.settle.is_none() {
            self.ball_radius = config.pocket_radius;
            self.ball_height = 0.0;
            self.ball_fall_velocity = 0.0;
            self.landed = true;
            self.begin_settle(config, target);
        }
        if let Some(plan) = self.settle.as_mut() {
            plan.remaining = 0.0;
        }
        self.locked = true;
        self.complete();
    }

    fn enter(&mut self, phase: WheelPhase) -> WheelPhase {
        tracing::debug!(from = ?self.phase, to = ?phase, bounces = self.bounce_count, "Wheel phase change");
        self.phase = phase;
        phase
    }

    /// Returns how far the disc turned.
    fn turn_wheel(&mut self, config: &WheelConfig, dt: f32) -> f32 {
        let (turned, velocity) = exp_decay_step(self.wheel_velocity, config.wheel_friction, dt);
        self.wheel_angle = normalize_angle(self.wheel_angle + turned);
        self.wheel_velocity = velocity;
        turned
    }

    /// The ball rolls over the ground while the disc turns under it.
    fn roll_ball(&mut self, config: &WheelConfig, dt: f32, turned: f32) {
        let (rolled, velocity) = exp_decay_step(self.ball_velocity, config.ball_friction, dt);
        self.ball_angle = normalize_angle(self.ball_angle + rolled - turned);
        self.ball_velocity = velocity;
    }

    /// Vertical gravity/bounce sub-step. Returns the bounce number if the
    /// ball bounced.
    fn fall_step(&mut self, config: &WheelConfig, dt: f32) -> Option<u32> {
        if self.landed {
            self.ball_height = 0.0;
            self.ball_fall_velocity = 0.0;
            return None;
        }
        self.ball_fall_velocity -= config.gravity * dt;
        self.ball_height += self.ball_fall_velocity * dt;
        if self.ball_height > 0.0 || self.ball_fall_velocity >= 0.0 {
            return None;
        }

        self.ball_height = 0.0;
        let impact = -self.ball_fall_velocity;
        if impact > config.bounce_exit_speed && self.bounce_count < config.max_bounces {
            self.bounce_count += 1;
            self.ball_fall_velocity = impact * config.bounce_damping;
            Some(self.bounce_count)
        } else {
            self.ball_fall_velocity = 0.0;
            self.landed = true;
            None
        }
    }

    fn begin_settle(&mut self, config: &WheelConfig, target: Option<usize>) {
        let n = config.pocket_count.max(1);
        let rel = self.ball_angle;
        let rel_velocity = self.ball_velocity - self.wheel_velocity;
        let direction = if rel_velocity < 0.0 { -1.0 } else { 1.0 };

        let pocket = match target {
            Some(p) => p % n,
            None => nearest_pocket_ahead(rel, direction, n),
        };
        let center = pocket_center(pocket, n);
        let remaining = forward_distance(rel, center, direction);
        let speed = rel_velocity.abs().max(config.settle_min_speed);
        let rate = if remaining > 1e-6 {
            (speed / remaining).max(config.settle_min_rate)
        } else {
            config.settle_min_rate
        };

        tracing::debug!(pocket, remaining, rate, "Ball settling toward pocket");
        self.settle = Some(SettlePlan {
            pocket,
            center,
            direction,
            rate,
            remaining,
        });
    }

    /// Exponential catch of the pocket centre, on the disc.
    fn steer(&mut self, config: &WheelConfig, dt: f32) {
        let Some(mut plan) = self.settle else {
            return;
        };
        let mut relative_speed = 0.0;
        if !self.locked {
            let (travelled, speed) = exp_decay_step(plan.rate * plan.remaining, plan.rate, dt);
            plan.remaining = (plan.remaining - travelled).max(0.0);
            if speed < config.settle_epsilon {
                plan.remaining = 0.0;
                self.locked = true;
                tracing::debug!(pocket = plan.pocket, "Ball caught by pocket");
            } else {
                relative_speed = speed;
            }
        }
        self.ball_angle = normalize_angle(plan.center - plan.direction * plan.remaining);
        self.ball_velocity = self.wheel_velocity + plan.direction * relative_speed;
        self.settle = Some(plan);
    }

    fn complete(&mut self) {
        if let Some(plan) = self.settle {
            self.ball_angle = plan.center;
        }
        self.wheel_velocity = 0.0;
        self.ball_velocity = 0.0;
        self.ball_height = 0.0;
        self.ball_fall_velocity = 0.0;
        self.enter(WheelPhase::Complete);
    }
}

/// Angular distance from `from` to `to` travelling in `direction`, in `[0, 2π)`.
fn forward_distance(from: f32, to: f32, direction: f32) -> f32 {
    normalize_angle((to - from) * direction)
}

/// Pocket whose centre the ball reaches first moving in `direction`.
fn nearest_pocket_ahead(rel: f32, direction: f32, pocket_count: usize) -> usize {
    let pocket = pocket_index(rel, pocket_count);
    let center = pocket_center(pocket, pocket_count);
    if (center - rel) * direction >= 0.0 {
        pocket
    } else if direction > 0.0 {
        (pocket + 1) % pocket_count
    } else {
        (pocket + pocket_count - 1) % pocket_count
    }
}
