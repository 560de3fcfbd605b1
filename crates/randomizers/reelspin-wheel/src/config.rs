use serde::{Deserialize, Serialize};

use reelspin_core::error::{
    ConfigError, require_dampening, require_non_negative, require_positive,
};

/// Wheel and ball physics constants, loadable from TOML.
///
/// Angles are radians, radii and heights are in wheel-radius units, rates
/// are per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub pocket_count: usize,
    /// Radius of the track the ball rides while spinning.
    pub outer_track_radius: f32,
    /// Radius of the pocket ring the ball falls into.
    pub pocket_radius: f32,
    /// Exponential decay rate of the disc's angular velocity.
    pub wheel_friction: f32,
    /// Exponential decay rate of the ball's angular velocity on the track.
    pub ball_friction: f32,
    /// Ball speed (rad/s) below which it leaves the track.
    pub fall_threshold: f32,
    /// Inward radial speed while falling.
    pub fall_speed: f32,
    /// Height above the pocket ring at which the fall starts.
    pub drop_height: f32,
    pub gravity: f32,
    /// Fraction of vertical speed kept on each bounce.
    pub bounce_damping: f32,
    pub max_bounces: u32,
    /// Impact speed below which the ball stops bouncing.
    pub bounce_exit_speed: f32,
    /// Minimum relative speed while the ball hunts its pocket.
    pub settle_min_speed: f32,
    /// Minimum exponential catch rate (1/s) toward the pocket centre.
    pub settle_min_rate: f32,
    /// Relative speed considered "caught" by the pocket.
    pub settle_epsilon: f32,
    /// Disc speed below which a caught ball completes the spin.
    pub wheel_stop_threshold: f32,
    pub max_frame_dt_ms: f32,
    /// Hard cap on a spin's duration before it is force-completed.
    pub safety_timeout_ms: f32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            pocket_count: 12,
            outer_track_radius: 1.0,
            pocket_radius: 0.62,
            wheel_friction: 0.25,
            ball_friction: 0.6,
            fall_threshold: 4.0,
            fall_speed: 1.2,
            drop_height: 0.12,
            gravity: 3.0,
            bounce_damping: 0.45,
            max_bounces: 4,
            bounce_exit_speed: 0.15,
            settle_min_speed: 0.6,
            settle_min_rate: 1.5,
            settle_epsilon: 0.01,
            wheel_stop_threshold: 0.8,
            max_frame_dt_ms: 50.0,
            safety_timeout_ms: 30_000.0,
        }
    }
}

impl WheelConfig {
    /// Load config from `REELSPIN_WHEEL_CONFIG` or `config/wheel.toml`, falling
    /// back to defaults if the file is missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("REELSPIN_WHEEL_CONFIG")
            .unwrap_or_else(|_| "config/wheel.toml".to_string());
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

    pub fn max_dt(&self) -> f32 {
        self.max_frame_dt_ms / 1000.0
    }

    pub fn safety_timeout(&self) -> f32 {
        self.safety_timeout_ms / 1000.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pocket_count == 0 {
            return Err(ConfigError::NoPockets);
        }
        let radii_ok = self.pocket_radius.is_finite()
            && self.outer_track_radius.is_finite()
            && self.pocket_radius > 0.0
            && self.outer_track_radius >= self.pocket_radius;
        if !radii_ok {
            return Err(ConfigError::InvalidRadii {
                outer: self.outer_track_radius,
                pocket: self.pocket_radius,
            });
        }
        require_positive("wheel_friction", self.wheel_friction)?;
        require_positive("ball_friction", self.ball_friction)?;
        if self.wheel_friction >= self.ball_friction {
            return Err(ConfigError::FrictionOrder {
                wheel: self.wheel_friction,
                ball: self.ball_friction,
            });
        }
        require_positive("fall_threshold", self.fall_threshold)?;
        require_positive("fall_speed", self.fall_speed)?;
        require_non_negative("drop_height", self.drop_height)?;
        require_positive("gravity", self.gravity)?;
        require_dampening("bounce_damping", self.bounce_damping)?;
        require_non_negative("bounce_exit_speed", self.bounce_exit_speed)?;
        require_positive("settle_min_speed", self.settle_min_speed)?;
        require_positive("settle_min_rate", self.settle_min_rate)?;
        require_positive("settle_epsilon", self.settle_epsilon)?;
        require_positive("wheel_stop_threshold", self.wheel_stop_threshold)?;
        require_positive("max_frame_dt_ms", self.max_frame_dt_ms)?;
        require_positive("safety_timeout_ms", self.safety_timeout_ms)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(WheelConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_pockets_rejected() {
        let config = WheelConfig {
            pocket_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoPockets));
    }

    #[test]
    fn inverted_radii_rejected() {
        let config = WheelConfig {
            outer_track_radius: 0.5,
            pocket_radius: 0.7,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRadii { .. })));
    }

    #[test]
    fn zero_friction_rejected() {
        let config = WheelConfig {
            wheel_friction: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "wheel_friction", .. })
        ));
    }

    #[test]
    fn wheel_must_decay_slower_than_ball() {
        for wheel_friction in [0.6, 0.9] {
            let config = WheelConfig {
                wheel_friction,
                ball_friction: 0.6,
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::FrictionOrder {
                    wheel: wheel_friction,
                    ball: 0.6
                })
            );
        }
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = WheelConfig::from_toml("pocket_count = 37\nmax_bounces = 2").unwrap();
        assert_eq!(config.pocket_count, 37);
        assert_eq!(config.max_bounces, 2);
        assert_eq!(config.gravity, WheelConfig::default().gravity);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        // No config/wheel.toml relative to the crate directory
        let config = WheelConfig::load();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn shipped_config_file_matches_defaults() {
        let shipped = WheelConfig::from_toml(include_str!("../../../../config/wheel.toml")).unwrap();
        assert_eq!(shipped, WheelConfig::default());
    }
}
