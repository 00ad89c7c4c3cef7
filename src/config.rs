//! Rule constants for one session: grid size, tick cadences, timers and score limits.

use crate::error::ConfigError;

/// Smallest grid the shape table can still fit into (the I shape is four long).
pub const MIN_GRID_SIDE: i32 = 4;

/// Tick-based rules. Every duration is measured in simulation ticks, never wall time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    /// Minimum ticks between two horizontal moves in the same direction.
    pub move_cooldown: u64,
    /// The falling piece drops half a row every this many ticks regardless of input.
    pub auto_drop_every: u64,
    /// Loose settled blocks advance half a row every this many ticks.
    pub resettle_every: u64,
    /// Ticks a matched shape blinks before it is cleared.
    pub blink_ticks: u32,
    pub blink_interval: u32,
    /// Title screen ignores input until the clock reaches this tick.
    pub title_grace: u64,
    /// Flower display angles turn one degree every this many ticks.
    pub flower_spin_every: u64,
    /// Base points per clear before the cascade and wave factors.
    pub clear_points: u64,
    /// Bonus per wave number when a wave is completed.
    pub wave_bonus: u64,
    pub score_ceiling: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            grid_width: 10,
            grid_height: 10,
            move_cooldown: 8,
            auto_drop_every: 30,
            resettle_every: 6,
            blink_ticks: 60,
            blink_interval: 10,
            title_grace: 30,
            flower_spin_every: 10,
            clear_points: 10,
            wave_bonus: 100,
            score_ceiling: 999_999_999,
        }
    }
}

impl RulesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width < MIN_GRID_SIDE || self.grid_height < MIN_GRID_SIDE {
            return Err(ConfigError::GridTooSmall {
                width: self.grid_width,
                height: self.grid_height,
                min: MIN_GRID_SIDE,
            });
        }
        let cadences = [
            ("auto_drop_every", self.auto_drop_every),
            ("resettle_every", self.resettle_every),
            ("flower_spin_every", self.flower_spin_every),
            ("blink_interval", u64::from(self.blink_interval)),
            ("blink_ticks", u64::from(self.blink_ticks)),
        ];
        for (name, value) in cadences {
            if value == 0 {
                return Err(ConfigError::ZeroCadence(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(RulesConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let config = RulesConfig {
            resettle_every: 0,
            ..RulesConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroCadence("resettle_every"))
        );
    }

    #[test]
    fn test_tiny_grid_rejected() {
        let config = RulesConfig {
            grid_width: 3,
            ..RulesConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GridTooSmall { width: 3, .. })
        ));
    }
}
