use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use reelspin_core::error::ConfigError;
use reelspin_core::motion::normalize_angle;

/// Angular width of one pocket.
pub fn pocket_width(pocket_count: usize) -> f32 {
    TAU / pocket_count.max(1) as f32
}

/// Pocket under `angle`, measured on the disc.
///
/// `floor(normalize(angle) / (2π / pocket_count))`, clamped so rounding at
/// the top of the range never yields `pocket_count`.
pub fn pocket_index(angle: f32, pocket_count: usize) -> usize {
    let pocket_count = pocket_count.max(1);
    let index = (normalize_angle(angle) / pocket_width(pocket_count)).floor() as usize;
    index.min(pocket_count - 1)
}

/// Angle of the middle of `pocket`, in `[0, 2π)`.
pub fn pocket_center(pocket: usize, pocket_count: usize) -> f32 {
    let pocket_count = pocket_count.max(1);
    ((pocket % pocket_count) as f32 + 0.5) * pocket_width(pocket_count)
}

/// Fixed pocket-to-outcome mapping of a wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketTable<O> {
    outcomes: Vec<O>,
}

impl<O> PocketTable<O> {
    pub fn new(outcomes: Vec<O>) -> Result<Self, ConfigError> {
        if outcomes.is_empty() {
            return Err(ConfigError::NoPockets);
        }
        Ok(Self { outcomes })
    }

    /// Check the table covers exactly `pocket_count` pockets.
    pub fn check_pockets(&self, pocket_count: usize) -> Result<(), ConfigError> {
        if self.outcomes.len() != pocket_count {
            return Err(ConfigError::PocketTableMismatch {
                pockets: pocket_count,
                entries: self.outcomes.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcome(&self, pocket: usize) -> Option<&O> {
        self.outcomes.get(pocket)
    }
}
