pub mod config;
pub mod physics;
pub mod pocket;

use serde::{Deserialize, Serialize};

use reelspin_core::clock::FrameTime;
use reelspin_core::error::ConfigError;
use reelspin_core::sim_trait::Simulation;

use config::WheelConfig;
use physics::{WheelPhase, WheelState};
use pocket::PocketTable;

/// Launch parameters for one wheel spin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelLaunch {
    /// Initial disc speed (rad/s).
    pub wheel_speed: f32,
    /// Initial ball speed on the outer track (rad/s). Usually opposite to the wheel.
    pub ball_speed: f32,
    /// Pocket chosen by the outcome resolver. `None` lets the ball settle
    /// wherever physics takes it.
    pub target: Option<usize>,
}

/// Events emitted by the wheel, each exactly once per spin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WheelEvent<O> {
    /// Ball left the outer track.
    BallDropped,
    /// Ball bounced on the pocket ring (1-based).
    BallBounced { bounce: u32 },
    /// Spin finished with the ball resting in `pocket`.
    PocketResolved {
        pocket: usize,
        outcome: O,
        forced: bool,
    },
}

/// Where the ball is, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallPosition {
    /// Angle on the disc. `pocket_index(angle, pocket_count)` is the pocket
    /// under the ball.
    pub angle: f32,
    /// Angle relative to the table, for drawing.
    pub world_angle: f32,
    pub radius: f32,
    pub height: f32,
}

impl BallPosition {
    /// Position in the table plane, with the wheel centre at the origin.
    pub fn cartesian(&self) -> (f32, f32) {
        (
            self.radius * self.world_angle.cos(),
            self.radius * self.world_angle.sin(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelSnapshot {
    pub phase: WheelPhase,
    pub wheel_angle: f32,
    pub wheel_velocity: f32,
    pub ball: BallPosition,
    pub ball_velocity: f32,
    pub bounce_count: u32,
    /// Pocket currently under the ball.
    pub pocket: usize,
    pub resolved: Option<usize>,
}

/// Wheel-and-ball randomizer for categorical picks.
///
/// A rotating disc and a ball that rolls on the outer track, drops and
/// bounces onto the pocket ring, then settles into a pocket. With a target
/// the ball is steered into that pocket during settling; the resolved pocket
/// is always read off the final ball angle, which is measured on the disc.
pub struct WheelSimulator<O> {
    config: WheelConfig,
    table: PocketTable<O>,
    state: WheelState,
    target: Option<usize>,
    origin: Option<f32>,
    elapsed: f32,
    ticks: u64,
    resolved: Option<usize>,
}

impl<O: Clone> WheelSimulator<O> {
    pub fn new(config: WheelConfig, table: PocketTable<O>) -> Result<Self, ConfigError> {
        config.validate()?;
        table.check_pockets(config.pocket_count)?;
        Ok(Self {
            state: WheelState::at_rest(&config),
            config,
            table,
            target: None,
            origin: None,
            elapsed: 0.0,
            ticks: 0,
            resolved: None,
        })
    }

    /// Launch a spin. An unfinished previous spin is force-completed first
    /// and its resolution returned.
    pub fn spin(&mut self, launch: WheelLaunch) -> Result<Vec<WheelEvent<O>>, ConfigError> {
        if !launch.wheel_speed.is_finite() {
            return Err(ConfigError::NonFiniteSpeed {
                field: "wheel_speed",
            });
        }
        if !launch.ball_speed.is_finite() {
            return Err(ConfigError::NonFiniteSpeed { field: "ball_speed" });
        }
        if let Some(pocket) = launch.target
            && pocket >= self.config.pocket_count
        {
            return Err(ConfigError::PocketOutOfRange {
                pocket,
                pockets: self.config.pocket_count,
            });
        }

        let events = self.force_stop();
        self.state.launch(&self.config, launch.wheel_speed, launch.ball_speed);
        self.target = launch.target;
        self.origin = None;
        self.elapsed = 0.0;
        self.ticks = 0;
        self.resolved = None;
        tracing::debug!(
            wheel_speed = launch.wheel_speed,
            ball_speed = launch.ball_speed,
            target = ?launch.target,
            "Wheel spin launched"
        );
        Ok(events)
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn table(&self) -> &PocketTable<O> {
        &self.table
    }

    pub fn state(&self) -> &WheelState {
        &self.state
    }

    pub fn phase(&self) -> WheelPhase {
        self.state.phase
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Seconds since the first tick of the current spin.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn resolved_pocket(&self) -> Option<usize> {
        self.resolved
    }

    pub fn resolved_outcome(&self) -> Option<&O> {
        self.table.outcome(self.resolved?)
    }

    pub fn current_wheel_angle(&self) -> f32 {
        self.state.wheel_angle
    }

    pub fn current_ball_position(&self) -> BallPosition {
        BallPosition {
            angle: self.state.ball_angle,
            world_angle: self.state.world_ball_angle(),
            radius: self.state.ball_radius,
            height: self.state.ball_height,
        }
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        WheelSnapshot {
            phase: self.state.phase,
            wheel_angle: self.state.wheel_angle,
            wheel_velocity: self.state.wheel_velocity,
            ball: self.current_ball_position(),
            ball_velocity: self.state.ball_velocity,
            bounce_count: self.state.bounce_count,
            pocket: self.state.pocket(self.config.pocket_count),
            resolved: self.resolved,
        }
    }

    fn track_elapsed(&mut self, frame: &FrameTime) {
        if !frame.elapsed.is_finite() {
            return;
        }
        let origin = *self.origin.get_or_insert(frame.elapsed);
        self.elapsed = self.elapsed.max(frame.elapsed - origin);
    }

    fn resolve(&mut self, forced: bool) -> Vec<WheelEvent<O>> {
        if self.resolved.is_some() || self.state.phase != WheelPhase::Complete {
            return Vec::new();
        }
        let pocket = self.state.pocket(self.config.pocket_count);
        self.resolved = Some(pocket);
        let Some(outcome) = self.table.outcome(pocket).cloned() else {
            return Vec::new();
        };
        tracing::info!(
            pocket,
            forced,
            bounces = self.state.bounce_count,
            elapsed = self.elapsed,
            "Wheel pocket resolved"
        );
        vec![WheelEvent::PocketResolved {
            pocket,
            outcome,
            forced,
        }]
    }
}

impl<O: Clone> Simulation for WheelSimulator<O> {
    type Event = WheelEvent<O>;

    fn advance(&mut self, frame: &FrameTime) -> Vec<WheelEvent<O>> {
        if self.is_settled() {
            return Vec::new();
        }
        self.track_elapsed(frame);
        self.ticks += 1;

        if self.elapsed > self.config.safety_timeout() {
            tracing::warn!(
                elapsed = self.elapsed,
                timeout = self.config.safety_timeout(),
                phase = ?self.state.phase,
                "Wheel exceeded safety timeout, forcing completion"
            );
            return self.force_stop();
        }
        if !frame.dt.is_finite() {
            tracing::warn!(dt = frame.dt, "Non-finite frame time, skipping integration");
        }

        let dt = frame.clamped_dt(self.config.max_dt());
        let report = self.state.step(&self.config, self.target, dt);
        let mut events = Vec::new();
        if report.entered == Some(WheelPhase::Falling) {
            events.push(WheelEvent::BallDropped);
        }
        if let Some(bounce) = report.bounce {
            events.push(WheelEvent::BallBounced { bounce });
        }
        events.extend(self.resolve(false));
        events
    }

    fn force_stop(&mut self) -> Vec<WheelEvent<O>> {
        if self.is_settled() {
            return Vec::new();
        }
        self.state.force_complete(&self.config, self.target);
        self.resolve(true)
    }

    /// Idle wheels and finished spins are both at rest.
    fn is_settled(&self) -> bool {
        matches!(self.state.phase, WheelPhase::Idle | WheelPhase::Complete)
    }
}
