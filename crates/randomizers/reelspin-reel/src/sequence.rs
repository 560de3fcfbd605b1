use serde::{Deserialize, Serialize};

use reelspin_core::clock::FrameTime;
use reelspin_core::error::ConfigError;
use reelspin_core::sim_trait::Simulation;

use crate::config::PhysicsConfig;
use crate::reel::{ReelSnapshot, ReelState};

/// Item pool of one column and the item centred before the spin starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub pool_size: usize,
    pub start_item: usize,
}

impl ColumnSpec {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            start_item: 0,
        }
    }
}

/// Events emitted by a spin sequence, each exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReelEvent {
    /// A column came to rest with `item` centred.
    ColumnStopped {
        column: usize,
        item: usize,
        forced: bool,
    },
    /// Every column has stopped. Always the last event of a sequence.
    SequenceComplete { items: Vec<usize> },
}

/// Serializable view of a whole sequence for renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSnapshot {
    pub is_final_spin: bool,
    pub elapsed: f32,
    pub complete: bool,
    pub reels: Vec<ReelSnapshot>,
}

/// Check a column layout and its winners before anything animates.
pub fn validate_columns(columns: &[ColumnSpec], winners: &[usize]) -> Result<(), ConfigError> {
    if columns.is_empty() {
        return Err(ConfigError::NoColumns);
    }
    if columns.len() != winners.len() {
        return Err(ConfigError::ColumnCountMismatch {
            columns: columns.len(),
            winners: winners.len(),
        });
    }
    for (column, (spec, &winner)) in columns.iter().zip(winners).enumerate() {
        if spec.pool_size == 0 {
            return Err(ConfigError::EmptyPool { column });
        }
        for index in [winner, spec.start_item] {
            if index >= spec.pool_size {
                return Err(ConfigError::IndexOutOfPool {
                    column,
                    index,
                    pool_size: spec.pool_size,
                });
            }
        }
    }
    Ok(())
}

/// N reels spun together with a per-column stagger.
///
/// Column `i` runs for `base_duration + i * column_stagger_delay`, so columns
/// stop in index order. Completion is derived: the sequence is complete on
/// the first tick every reel reports stopped.
#[derive(Debug, Clone)]
pub struct SpinSequence {
    reels: Vec<ReelState>,
    is_final_spin: bool,
    origin: Option<f32>,
    elapsed: f32,
    ticks: u64,
    stop_ticks: Vec<Option<u64>>,
    complete: bool,
}

impl SpinSequence {
    pub fn new(
        config: &PhysicsConfig,
        columns: &[ColumnSpec],
        winners: &[usize],
        is_final_spin: bool,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_columns(columns, winners)?;
        let timing = config.timing(is_final_spin);
        let reels = columns
            .iter()
            .zip(winners)
            .enumerate()
            .map(|(i, (spec, &winner))| {
                ReelState::new(i, spec.pool_size, spec.start_item, winner, config, &timing)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            columns = reels.len(),
            is_final_spin,
            ?winners,
            "Spin sequence created"
        );

        Ok(Self {
            stop_ticks: vec![None; reels.len()],
            reels,
            is_final_spin,
            origin: None,
            elapsed: 0.0,
            ticks: 0,
            complete: false,
        })
    }

    pub fn reels(&self) -> &[ReelState] {
        &self.reels
    }

    pub fn reel(&self, column: usize) -> Option<&ReelState> {
        self.reels.get(column)
    }

    pub fn column_count(&self) -> usize {
        self.reels.len()
    }

    pub fn is_final_spin(&self) -> bool {
        self.is_final_spin
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Seconds since the first tick of this sequence.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Ticks processed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tick number on which each column stopped.
    pub fn stop_ticks(&self) -> &[Option<u64>] {
        &self.stop_ticks
    }

    pub fn current_position(&self, column: usize) -> Option<f32> {
        self.reels.get(column).map(ReelState::position)
    }

    pub fn winners(&self) -> Vec<usize> {
        self.reels.iter().map(ReelState::winner).collect()
    }

    /// Item currently centred in each column.
    pub fn visible_items(&self) -> Vec<usize> {
        self.reels.iter().map(ReelState::visible_item).collect()
    }

    pub fn snapshot(&self) -> SequenceSnapshot {
        SequenceSnapshot {
            is_final_spin: self.is_final_spin,
            elapsed: self.elapsed,
            complete: self.complete,
            reels: self.reels.iter().map(ReelState::snapshot).collect(),
        }
    }

    fn track_elapsed(&mut self, frame: &FrameTime) {
        if !frame.elapsed.is_finite() {
            return;
        }
        let origin = *self.origin.get_or_insert(frame.elapsed);
        self.elapsed = self.elapsed.max(frame.elapsed - origin);
    }

    /// Turn newly stopped columns into events, completing the sequence when
    /// the last one lands.
    fn collect(&mut self, stopped: &[usize]) -> Vec<ReelEvent> {
        let mut events = Vec::with_capacity(stopped.len() + 1);
        for &column in stopped {
            let reel = &self.reels[column];
            self.stop_ticks[column] = Some(self.ticks);
            tracing::debug!(
                column,
                item = reel.visible_item(),
                forced = reel.was_forced(),
                elapsed = self.elapsed,
                "Column stopped"
            );
            events.push(ReelEvent::ColumnStopped {
                column,
                item: reel.visible_item(),
                forced: reel.was_forced(),
            });
        }

        if !self.complete && self.reels.iter().all(ReelState::is_stopped) {
            self.complete = true;
            let items = self.visible_items();
            tracing::info!(?items, elapsed = self.elapsed, ticks = self.ticks, "Spin sequence complete");
            events.push(ReelEvent::SequenceComplete { items });
        }
        events
    }
}

impl Simulation for SpinSequence {
    type Event = ReelEvent;

    fn advance(&mut self, frame: &FrameTime) -> Vec<ReelEvent> {
        if self.complete {
            return Vec::new();
        }
        self.track_elapsed(frame);
        self.ticks += 1;

        let elapsed = self.elapsed;
        let stopped: Vec<usize> = self
            .reels
            .iter_mut()
            .filter_map(|reel| reel.advance(elapsed, frame.dt).then_some(reel.index()))
            .collect();
        self.collect(&stopped)
    }

    fn force_stop(&mut self) -> Vec<ReelEvent> {
        if self.complete {
            return Vec::new();
        }
        let stopped: Vec<usize> = self
            .reels
            .iter_mut()
            .filter_map(|reel| reel.force_stop().then_some(reel.index()))
            .collect();
        self.collect(&stopped)
    }

    fn is_settled(&self) -> bool {
        self.complete
    }
}
