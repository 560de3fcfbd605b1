//! Headless driver: one fixed-rate physics clock advancing a multi-spin reel
//! session and a wheel spin side by side.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use reelspin_core::clock::PhysicsClock;
use reelspin_core::error::ConfigError;
use reelspin_core::outcome::{OutcomeResolver, SeededResolver};
use reelspin_core::sim_trait::Simulation;
use reelspin_reel::{
    ColumnSpec, PhysicsConfig, ReelEvent, SessionEvent, SpinOrchestrator, SpinSession,
};
use reelspin_wheel::config::WheelConfig;
use reelspin_wheel::pocket::PocketTable;
use reelspin_wheel::{WheelEvent, WheelLaunch, WheelSimulator};

/// Items on every reel.
pub const POOL_SIZE: usize = 24;

const CLASSES: [&str; 6] = ["Scout", "Soldier", "Engineer", "Medic", "Sniper", "Spy"];

/// Hard stop for the frame loop, in simulated seconds.
const MAX_RUN_SECS: u32 = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub seed: u64,
    pub columns: usize,
    pub spins: usize,
    pub fps: u32,
    pub inter_spin_delay_ms: f32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            columns: 5,
            spins: 3,
            fps: 60,
            inter_spin_delay_ms: 400.0,
        }
    }
}

impl RunOptions {
    /// Parse `--seed=N --columns=N --spins=N --fps=N` in any order. Unknown or
    /// malformed arguments are logged and ignored.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        let mut options = Self::default();
        for arg in args {
            let parsed = if let Some(v) = arg.strip_prefix("--seed=") {
                v.parse().map(|n| options.seed = n).is_ok()
            } else if let Some(v) = arg.strip_prefix("--columns=") {
                v.parse().map(|n| options.columns = n).is_ok()
            } else if let Some(v) = arg.strip_prefix("--spins=") {
                v.parse().map(|n| options.spins = n).is_ok()
            } else if let Some(v) = arg.strip_prefix("--fps=") {
                v.parse::<u32>().map(|n| options.fps = n.max(1)).is_ok()
            } else {
                false
            };
            if !parsed {
                tracing::warn!("Ignoring argument {arg}");
            }
        }
        options
    }

    pub fn frame_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WheelSummary {
    pub target: usize,
    pub pocket: Option<usize>,
    pub outcome: Option<String>,
    pub bounces: u32,
    pub forced: bool,
    pub settled_tick: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub fps: u32,
    pub plan: Vec<Vec<usize>>,
    pub results: Vec<Vec<usize>>,
    /// Global tick on which each column stopped, per spin.
    pub stop_ticks: Vec<Vec<u64>>,
    pub forced_columns: usize,
    pub wheel: WheelSummary,
    pub ticks: u64,
}

/// Run one reel session and one wheel spin to completion.
pub fn run(
    options: &RunOptions,
    reel_config: PhysicsConfig,
    wheel_config: WheelConfig,
) -> Result<RunSummary, ConfigError> {
    let mut resolver = SeededResolver::new(options.seed);
    let mut rng = StdRng::seed_from_u64(options.seed ^ 0x5eed);

    let columns = vec![ColumnSpec::new(POOL_SIZE); options.columns];
    let orchestrator = SpinOrchestrator::new(reel_config, columns)?;
    let mut session = SpinSession::resolve(
        orchestrator,
        &mut resolver,
        options.spins,
        options.inter_spin_delay_ms,
    )?;

    let pockets = wheel_config.pocket_count;
    let table = PocketTable::new(
        (0..pockets)
            .map(|i| CLASSES[i % CLASSES.len()].to_string())
            .collect(),
    )?;
    let mut wheel = WheelSimulator::new(wheel_config, table)?;
    let target = resolver.pick(pockets);
    wheel.spin(WheelLaunch {
        wheel_speed: rng.random_range(2.0..4.0),
        ball_speed: -rng.random_range(12.0..20.0),
        target: Some(target),
    })?;

    let mut stop_ticks = vec![vec![0; options.columns]; options.spins];
    let mut forced_columns = 0;
    let mut wheel_summary = WheelSummary {
        target,
        pocket: None,
        outcome: None,
        bounces: 0,
        forced: false,
        settled_tick: None,
    };

    let mut clock = PhysicsClock::new();
    clock.set_running(true);
    session.start();

    let frame_ms = options.frame_ms();
    let max_ticks = u64::from(MAX_RUN_SECS) * u64::from(options.fps.max(1));
    let mut tick = 0u64;
    while clock.is_running() {
        let frame = clock.tick(tick as f64 * frame_ms);
        let mut session_events = session.advance(&frame);
        let mut wheel_events = wheel.advance(&frame);

        if tick >= max_ticks {
            tracing::warn!(tick, "Run exceeded its frame budget, forcing everything to stop");
            session_events.extend(session.force_stop());
            wheel_events.extend(wheel.force_stop());
        }

        for event in &session_events {
            if let SessionEvent::Reel {
                spin,
                event: ReelEvent::ColumnStopped { column, forced, .. },
            } = event
            {
                if let Some(slot) = stop_ticks.get_mut(*spin).and_then(|s| s.get_mut(*column)) {
                    *slot = tick;
                }
                forced_columns += usize::from(*forced);
            }
            tracing::info!(tick, ?event, "Reel event");
        }
        for event in &wheel_events {
            if let WheelEvent::PocketResolved {
                pocket,
                outcome,
                forced,
            } = event
            {
                wheel_summary.pocket = Some(*pocket);
                wheel_summary.outcome = Some(outcome.clone());
                wheel_summary.forced = *forced;
                wheel_summary.settled_tick = Some(tick);
            }
            tracing::info!(tick, ?event, "Wheel event");
        }

        if session.is_settled() && wheel.is_settled() {
            clock.set_running(false);
        }
        tick += 1;
    }
    wheel_summary.bounces = wheel.state().bounce_count;

    Ok(RunSummary {
        seed: options.seed,
        fps: options.fps,
        plan: session.plan().to_vec(),
        results: session.results().to_vec(),
        stop_ticks,
        forced_columns,
        wheel: wheel_summary,
        ticks: tick,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_known_flags_in_any_order() {
        let options = RunOptions::from_args(args(&["--fps=30", "--seed=7", "--columns=3", "--spins=2"]));
        assert_eq!(
            options,
            RunOptions {
                seed: 7,
                columns: 3,
                spins: 2,
                fps: 30,
                ..Default::default()
            }
        );
    }

    #[test]
    fn malformed_flags_keep_defaults() {
        let options = RunOptions::from_args(args(&["--seed=abc", "--fps=0", "--bogus"]));
        assert_eq!(options.seed, RunOptions::default().seed);
        assert_eq!(options.fps, 1);
    }

    #[test]
    fn zero_columns_is_a_config_error() {
        let options = RunOptions {
            columns: 0,
            ..Default::default()
        };
        let result = run(&options, PhysicsConfig::default(), WheelConfig::default());
        assert_eq!(result.err(), Some(ConfigError::NoColumns));
    }
}
