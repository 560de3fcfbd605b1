/// Invalid configuration or launch parameters, rejected before any animation starts.
///
/// Runtime numeric problems and liveness failures are never reported through
/// this type; simulations recover from those internally.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Item extent along the scroll axis must be positive.
    NonPositiveItemExtent(f32),
    /// A named physics constant must be positive and finite.
    NonPositive { field: &'static str, value: f32 },
    /// A dampening ratio must lie strictly inside (0, 1).
    DampeningOutOfRange { field: &'static str, value: f32 },
    /// A spin needs at least one column.
    NoColumns,
    /// A column's item pool is empty.
    EmptyPool { column: usize },
    /// A winning or starting index is outside its column's pool.
    IndexOutOfPool {
        column: usize,
        index: usize,
        pool_size: usize,
    },
    /// Number of winners does not match the number of columns.
    ColumnCountMismatch { columns: usize, winners: usize },
    /// Wheels need at least one pocket.
    NoPockets,
    /// Pocket-to-outcome table size differs from the configured pocket count.
    PocketTableMismatch { pockets: usize, entries: usize },
    /// Radii must satisfy `outer_track_radius >= pocket_radius > 0`.
    InvalidRadii { outer: f32, pocket: f32 },
    /// The disc must lose speed more slowly than the ball rolling on it.
    FrictionOrder { wheel: f32, ball: f32 },
    /// A launch speed was NaN or infinite.
    NonFiniteSpeed { field: &'static str },
    /// Requested target pocket is outside the wheel.
    PocketOutOfRange { pocket: usize, pockets: usize },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveItemExtent(v) => write!(f, "item_extent must be > 0, got {v}"),
            Self::NonPositive { field, value } => write!(f, "{field} must be > 0, got {value}"),
            Self::DampeningOutOfRange { field, value } => {
                write!(f, "{field} must be in (0, 1), got {value}")
            },
            Self::NoColumns => write!(f, "a spin needs at least one column"),
            Self::EmptyPool { column } => write!(f, "column {column} has an empty item pool"),
            Self::IndexOutOfPool {
                column,
                index,
                pool_size,
            } => write!(
                f,
                "index {index} out of range for column {column} (pool size {pool_size})"
            ),
            Self::ColumnCountMismatch { columns, winners } => {
                write!(f, "{winners} winners supplied for {columns} columns")
            },
            Self::NoPockets => write!(f, "pocket_count must be > 0"),
            Self::PocketTableMismatch { pockets, entries } => {
                write!(f, "pocket table has {entries} entries for {pockets} pockets")
            },
            Self::InvalidRadii { outer, pocket } => write!(
                f,
                "radii must satisfy outer >= pocket > 0 (outer {outer}, pocket {pocket})"
            ),
            Self::FrictionOrder { wheel, ball } => write!(
                f,
                "wheel_friction must be below ball_friction (wheel {wheel}, ball {ball})"
            ),
            Self::NonFiniteSpeed { field } => write!(f, "{field} must be finite"),
            Self::PocketOutOfRange { pocket, pockets } => {
                write!(f, "target pocket {pocket} out of range (wheel has {pockets})")
            },
        }
    }
}

impl std::error::Error for ConfigError {}

/// Require a finite, strictly positive value.
pub fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Require a finite, non-negative value.
pub fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Require a ratio strictly inside (0, 1).
pub fn require_dampening(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::DampeningOutOfRange { field, value })
    }
}
