use serde::{Deserialize, Serialize};

use reelspin_core::error::{
    ConfigError, require_dampening, require_non_negative, require_positive,
};

/// Stagger and duration triple for one animation profile (all milliseconds).
///
/// A profile table in TOML must list all three fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingProfile {
    /// Extra run time added per column index, so columns stop in order.
    pub column_stagger_delay_ms: f32,
    /// Total run time of column 0.
    pub base_duration_ms: f32,
    /// Length of the braking window at the end of each column's run.
    pub deceleration_duration_ms: f32,
}

impl TimingProfile {
    /// Short profile for intermediate spins of a multi-spin combo.
    pub const fn quick() -> Self {
        Self {
            column_stagger_delay_ms: 250.0,
            base_duration_ms: 1200.0,
            deceleration_duration_ms: 600.0,
        }
    }

    /// Long, dramatic profile for the last spin of a sequence.
    pub const fn suspense() -> Self {
        Self {
            column_stagger_delay_ms: 900.0,
            base_duration_ms: 2600.0,
            deceleration_duration_ms: 1600.0,
        }
    }

    /// Total run time of column `index` in seconds:
    /// `base_duration + index * column_stagger_delay`.
    pub fn column_duration(&self, index: usize) -> f32 {
        (self.base_duration_ms + index as f32 * self.column_stagger_delay_ms) / 1000.0
    }

    pub fn deceleration_secs(&self) -> f32 {
        self.deceleration_duration_ms / 1000.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("column_stagger_delay_ms", self.column_stagger_delay_ms)?;
        require_non_negative("base_duration_ms", self.base_duration_ms)?;
        require_non_negative("deceleration_duration_ms", self.deceleration_duration_ms)?;
        Ok(())
    }
}

/// Reel physics constants shared by every column, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Spin-up rate (px/s^2).
    pub acceleration: f32,
    /// Cruise speed (px/s).
    pub max_velocity: f32,
    /// Hardest allowed braking (px/s^2). The braking window is stretched when
    /// stopping within it would need more than this.
    pub deceleration: f32,
    /// Fraction of speed kept when the reel bounces back from an overshoot.
    pub bounce_dampening: f32,
    /// Size of one item along the scroll axis (px).
    pub item_extent: f32,
    /// How far past the target the reel travels before bouncing back, as a
    /// fraction of `item_extent`. 0 disables the bounce.
    pub overshoot_ratio: f32,
    /// Duration of the bounce-back to the target (ms).
    pub bounce_duration_ms: f32,
    /// Ceiling applied to each frame's delta time (ms).
    pub max_frame_dt_ms: f32,
    /// Extra time past a column's scheduled stop before it is force-stopped (ms).
    pub safety_margin_ms: f32,
    /// Distance from target considered "arrived" (px).
    pub position_epsilon: f32,
    /// Speed considered "at rest" (px/s).
    pub velocity_epsilon: f32,
    /// Rows visible above and below the centre slot.
    pub visible_rows: u32,
    /// Profile for intermediate spins.
    pub quick: TimingProfile,
    /// Profile for the final spin.
    pub suspense: TimingProfile,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            acceleration: 6000.0,
            max_velocity: 1500.0,
            deceleration: 6000.0,
            bounce_dampening: 0.35,
            item_extent: 80.0,
            overshoot_ratio: 0.18,
            bounce_duration_ms: 220.0,
            max_frame_dt_ms: 50.0,
            safety_margin_ms: 3000.0,
            position_epsilon: 0.5,
            velocity_epsilon: 5.0,
            visible_rows: 1,
            quick: TimingProfile::quick(),
            suspense: TimingProfile::suspense(),
        }
    }
}

impl PhysicsConfig {
    /// Load config from `REELSPIN_REEL_CONFIG` or `config/reel.toml`, falling
    /// back to defaults if the file is missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("REELSPIN_REEL_CONFIG")
            .unwrap_or_else(|_| "config/reel.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Timing profile for a spin: suspense for the final spin, quick otherwise.
    pub fn timing(&self, is_final_spin: bool) -> TimingProfile {
        if is_final_spin {
            self.suspense
        } else {
            self.quick
        }
    }

    /// Clamp ceiling for delta time, in seconds.
    pub fn max_dt(&self) -> f32 {
        self.max_frame_dt_ms / 1000.0
    }

    /// Distance the reel overshoots its target before bouncing (px).
    pub fn overshoot(&self) -> f32 {
        self.item_extent * self.overshoot_ratio
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.item_extent.is_finite() && self.item_extent > 0.0) {
            return Err(ConfigError::NonPositiveItemExtent(self.item_extent));
        }
        require_positive("acceleration", self.acceleration)?;
        require_positive("max_velocity", self.max_velocity)?;
        require_positive("deceleration", self.deceleration)?;
        require_dampening("bounce_dampening", self.bounce_dampening)?;
        require_non_negative("overshoot_ratio", self.overshoot_ratio)?;
        if self.overshoot_ratio >= 1.0 {
            return Err(ConfigError::DampeningOutOfRange {
                field: "overshoot_ratio",
                value: self.overshoot_ratio,
            });
        }
        require_positive("bounce_duration_ms", self.bounce_duration_ms)?;
        require_positive("max_frame_dt_ms", self.max_frame_dt_ms)?;
        require_non_negative("safety_margin_ms", self.safety_margin_ms)?;
        require_positive("position_epsilon", self.position_epsilon)?;
        require_positive("velocity_epsilon", self.velocity_epsilon)?;
        self.quick.validate()?;
        self.suspense.validate()?;
        Ok(())
    }
}
