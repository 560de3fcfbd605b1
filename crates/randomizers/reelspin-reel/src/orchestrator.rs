use reelspin_core::clock::FrameTime;
use reelspin_core::error::ConfigError;
use reelspin_core::sim_trait::Simulation;

use crate::config::PhysicsConfig;
use crate::sequence::{ColumnSpec, ReelEvent, SequenceSnapshot, SpinSequence, validate_columns};

/// Owns the reels of one visual slot machine across many spins.
///
/// Only one sequence runs at a time. Starting a new spin while the previous
/// one is still moving force-stops it first, so reel state from an old spin
/// never leaks into a new one.
pub struct SpinOrchestrator {
    config: PhysicsConfig,
    columns: Vec<ColumnSpec>,
    sequence: Option<SpinSequence>,
    spins_started: u64,
}

impl SpinOrchestrator {
    pub fn new(config: PhysicsConfig, columns: Vec<ColumnSpec>) -> Result<Self, ConfigError> {
        config.validate()?;
        // Layout check only; winners come with each spin
        let placeholder: Vec<usize> = columns.iter().map(|c| c.start_item).collect();
        validate_columns(&columns, &placeholder)?;
        Ok(Self {
            config,
            columns,
            sequence: None,
            spins_started: 0,
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn sequence(&self) -> Option<&SpinSequence> {
        self.sequence.as_ref()
    }

    pub fn spins_started(&self) -> u64 {
        self.spins_started
    }

    /// Whether a sequence is currently animating.
    pub fn is_running(&self) -> bool {
        self.sequence.as_ref().is_some_and(|s| !s.is_complete())
    }

    /// Start a fresh spin toward `winners` (one per column).
    ///
    /// Invalid winners are rejected without touching the running sequence.
    /// Otherwise an unfinished sequence is force-stopped and its final events
    /// are returned; each column then starts from the item it shows now.
    pub fn start(&mut self, winners: &[usize], is_final_spin: bool) -> Result<Vec<ReelEvent>, ConfigError> {
        validate_columns(&self.columns, winners)?;

        let mut events = Vec::new();
        if let Some(previous) = self.sequence.as_mut() {
            if !previous.is_complete() {
                tracing::info!(
                    elapsed = previous.elapsed(),
                    "Restarting reels before previous spin finished, forcing stop"
                );
                events = previous.force_stop();
            }
            for (spec, item) in self.columns.iter_mut().zip(previous.visible_items()) {
                spec.start_item = item;
            }
        }

        self.sequence = Some(SpinSequence::new(&self.config, &self.columns, winners, is_final_spin)?);
        self.spins_started += 1;
        Ok(events)
    }

    /// Scroll offset of `column` within its current item.
    pub fn current_position(&self, column: usize) -> Option<f32> {
        self.sequence.as_ref()?.current_position(column)
    }

    /// Item centred in `column`, or its starting item when nothing has spun yet.
    pub fn visible_item(&self, column: usize) -> Option<usize> {
        match &self.sequence {
            Some(seq) => seq.reel(column).map(|r| r.visible_item()),
            None => self.columns.get(column).map(|c| c.start_item),
        }
    }

    pub fn snapshot(&self) -> Option<SequenceSnapshot> {
        self.sequence.as_ref().map(SpinSequence::snapshot)
    }
}

impl Simulation for SpinOrchestrator {
    type Event = ReelEvent;

    fn advance(&mut self, frame: &FrameTime) -> Vec<ReelEvent> {
        match self.sequence.as_mut() {
            Some(seq) => seq.advance(frame),
            None => Vec::new(),
        }
    }

    fn force_stop(&mut self) -> Vec<ReelEvent> {
        match self.sequence.as_mut() {
            Some(seq) => seq.force_stop(),
            None => Vec::new(),
        }
    }

    fn is_settled(&self) -> bool {
        !self.is_running()
    }
}
