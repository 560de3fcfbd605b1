use serde::{Deserialize, Serialize};

use reelspin_core::clock::FrameTime;
use reelspin_core::error::{ConfigError, require_non_negative};
use reelspin_core::outcome::{OutcomeResolver, resolve_columns};
use reelspin_core::sim_trait::Simulation;

use crate::orchestrator::SpinOrchestrator;
use crate::sequence::{ReelEvent, validate_columns};

/// Where a multi-spin session is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Spinning { spin: usize },
    /// Waiting between spins; the next spin starts once frame time reaches
    /// `resume_at` (seconds, host clock).
    Pending { next_spin: usize, resume_at: f32 },
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Reel { spin: usize, event: ReelEvent },
    SpinFinished { spin: usize, items: Vec<usize> },
    SessionComplete { spins: usize },
}

/// A combo of several spins on the same reels.
///
/// Every spin but the last uses the quick profile; the last uses suspense.
/// Winners for all spins are fixed up front.
pub struct SpinSession {
    orchestrator: SpinOrchestrator,
    plan: Vec<Vec<usize>>,
    inter_spin_delay: f32,
    state: SessionState,
    results: Vec<Vec<usize>>,
    last_elapsed: f32,
}

impl SpinSession {
    pub fn new(
        orchestrator: SpinOrchestrator,
        plan: Vec<Vec<usize>>,
        inter_spin_delay_ms: f32,
    ) -> Result<Self, ConfigError> {
        if plan.is_empty() {
            return Err(ConfigError::NonPositive {
                field: "spin_count",
                value: 0.0,
            });
        }
        require_non_negative("inter_spin_delay_ms", inter_spin_delay_ms)?;
        for winners in &plan {
            validate_columns(orchestrator.columns(), winners)?;
        }
        Ok(Self {
            orchestrator,
            plan,
            inter_spin_delay: inter_spin_delay_ms / 1000.0,
            state: SessionState::Idle,
            results: Vec::new(),
            last_elapsed: 0.0,
        })
    }

    /// Ask `resolver` for every spin's winners before anything animates.
    pub fn resolve(
        orchestrator: SpinOrchestrator,
        resolver: &mut dyn OutcomeResolver,
        spin_count: usize,
        inter_spin_delay_ms: f32,
    ) -> Result<Self, ConfigError> {
        let pool_sizes: Vec<usize> = orchestrator.columns().iter().map(|c| c.pool_size).collect();
        let plan = (0..spin_count)
            .map(|_| resolve_columns(resolver, &pool_sizes))
            .collect();
        Self::new(orchestrator, plan, inter_spin_delay_ms)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn spin_count(&self) -> usize {
        self.plan.len()
    }

    pub fn plan(&self) -> &[Vec<usize>] {
        &self.plan
    }

    /// Centred items of each finished spin, in order.
    pub fn results(&self) -> &[Vec<usize>] {
        &self.results
    }

    pub fn orchestrator(&self) -> &SpinOrchestrator {
        &self.orchestrator
    }

    /// Begin the first spin, discarding any spin or delay still in flight.
    pub fn start(&mut self) -> Vec<SessionEvent> {
        let mut events = self.cancel();
        self.results.clear();
        events.extend(self.launch(0));
        events
    }

    /// Stop the session. A running spin is force-stopped onto its winners;
    /// a pending delay is dropped so the next spin never starts.
    pub fn cancel(&mut self) -> Vec<SessionEvent> {
        match self.state {
            SessionState::Spinning { spin } => {
                let events = self.orchestrator.force_stop();
                self.state = SessionState::Cancelled;
                tracing::info!(spin, "Spin session cancelled mid-spin");
                wrap(spin, events)
            },
            SessionState::Pending { next_spin, .. } => {
                self.state = SessionState::Cancelled;
                tracing::info!(next_spin, "Spin session cancelled during inter-spin delay");
                Vec::new()
            },
            SessionState::Idle | SessionState::Complete | SessionState::Cancelled => Vec::new(),
        }
    }

    fn launch(&mut self, spin: usize) -> Vec<SessionEvent> {
        let Some(winners) = self.plan.get(spin) else {
            self.state = SessionState::Complete;
            return Vec::new();
        };
        let is_final = spin + 1 == self.plan.len();
        match self.orchestrator.start(winners, is_final) {
            Ok(events) => {
                tracing::debug!(spin, is_final, "Spin launched");
                self.state = SessionState::Spinning { spin };
                // Leftovers from a forced restart belong to the previous spin
                wrap(spin.saturating_sub(1), events)
            },
            Err(e) => {
                tracing::warn!(spin, "Could not start spin: {e}");
                self.state = SessionState::Cancelled;
                Vec::new()
            },
        }
    }

    fn finish_spin(&mut self, spin: usize, elapsed: f32) -> Vec<SessionEvent> {
        let items = self
            .orchestrator
            .sequence()
            .map(|s| s.visible_items())
            .unwrap_or_default();
        self.results.push(items.clone());
        let mut events = vec![SessionEvent::SpinFinished { spin, items }];

        let next_spin = spin + 1;
        if next_spin >= self.plan.len() {
            self.state = SessionState::Complete;
            tracing::info!(spins = self.plan.len(), "Spin session complete");
            events.push(SessionEvent::SessionComplete {
                spins: self.plan.len(),
            });
        } else {
            self.state = SessionState::Pending {
                next_spin,
                resume_at: elapsed + self.inter_spin_delay,
            };
        }
        events
    }
}

fn wrap(spin: usize, events: Vec<ReelEvent>) -> Vec<SessionEvent> {
    events
        .into_iter()
        .map(|event| SessionEvent::Reel { spin, event })
        .collect()
}

impl Simulation for SpinSession {
    type Event = SessionEvent;

    fn advance(&mut self, frame: &FrameTime) -> Vec<SessionEvent> {
        if frame.elapsed.is_finite() {
            self.last_elapsed = self.last_elapsed.max(frame.elapsed);
        }
        let elapsed = self.last_elapsed;

        match self.state {
            SessionState::Spinning { spin } => {
                let mut events = wrap(spin, self.orchestrator.advance(frame));
                if self.orchestrator.is_settled() {
                    events.extend(self.finish_spin(spin, elapsed));
                }
                events
            },
            SessionState::Pending {
                next_spin,
                resume_at,
            } if elapsed >= resume_at => self.launch(next_spin),
            _ => Vec::new(),
        }
    }

    fn force_stop(&mut self) -> Vec<SessionEvent> {
        self.cancel()
    }

    fn is_settled(&self) -> bool {
        matches!(
            self.state,
            SessionState::Idle | SessionState::Complete | SessionState::Cancelled
        )
    }
}
