//! Game parameters: field geometry, difficulty curve, round length, tolerances.

use std::time::Duration;
use thiserror::Error;

/// Every tunable of a session. Geometry is in abstract field units (the
/// terminal front end scales them to columns).
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub field_width: f64,
    pub field_height: f64,
    pub plate_width: f64,
    pub plate_height: f64,
    pub segment_height: f64,
    /// Width of the first falling block.
    pub initial_width: f64,
    pub initial_speed: f64,
    pub speed_step: f64,
    pub max_speed: f64,
    /// Round length in clock ticks (seconds).
    pub round_secs: u32,
    /// Stacked segments (plate excluded) needed to win.
    pub win_threshold: usize,
    /// Margin added on both sides of the falling block: max(min, floor(ratio * base)).
    pub margin_ratio: f64,
    pub margin_min: f64,
    /// A landing is perfect when the new width is within this of the base width.
    pub perfect_tolerance: f64,
    /// Delay between the drop key and resolution (fall animation).
    pub drop_delay: Duration,
    /// Oscillator step interval.
    pub frame_interval: Duration,
    pub clock_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field_width: 400.0,
            field_height: 600.0,
            plate_width: 150.0,
            plate_height: 20.0,
            segment_height: 25.0,
            initial_width: 150.0,
            initial_speed: 2.0,
            speed_step: 0.1,
            max_speed: 5.0,
            round_secs: 30,
            win_threshold: 10,
            margin_ratio: 0.06,
            margin_min: 8.0,
            perfect_tolerance: 2.0,
            drop_delay: Duration::from_millis(300),
            frame_interval: Duration::from_millis(16),
            clock_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive (got {value})")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative (got {value})")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} ({value}) does not fit in the field width ({field_width})")]
    WiderThanField {
        name: &'static str,
        value: f64,
        field_width: f64,
    },
    #[error("max speed {max} is below the initial speed {initial}")]
    SpeedCap { initial: f64, max: f64 },
    #[error("round duration must be at least one second")]
    ZeroDuration,
    #[error("win threshold must be at least one segment")]
    ZeroThreshold,
    #[error("{name} must be a non-zero duration")]
    ZeroInterval { name: &'static str },
}

impl GameConfig {
    /// Config with no fall animation: drops resolve on the next update.
    pub fn without_drop_delay(mut self) -> Self {
        self.drop_delay = Duration::ZERO;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("field width", self.field_width),
            ("field height", self.field_height),
            ("plate width", self.plate_width),
            ("plate height", self.plate_height),
            ("segment height", self.segment_height),
            ("initial width", self.initial_width),
            ("initial speed", self.initial_speed),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        for (name, value) in [
            ("speed step", self.speed_step),
            ("margin ratio", self.margin_ratio),
            ("margin minimum", self.margin_min),
            ("perfect tolerance", self.perfect_tolerance),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        for (name, value) in [
            ("plate width", self.plate_width),
            ("initial width", self.initial_width),
        ] {
            if value > self.field_width {
                return Err(ConfigError::WiderThanField {
                    name,
                    value,
                    field_width: self.field_width,
                });
            }
        }
        if self.max_speed < self.initial_speed {
            return Err(ConfigError::SpeedCap {
                initial: self.initial_speed,
                max: self.max_speed,
            });
        }
        if self.round_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.win_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.frame_interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: "frame interval" });
        }
        if self.clock_interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: "clock interval" });
        }
        Ok(())
    }

    /// Tolerance margin for a given stack-top width.
    pub fn margin_for(&self, base_width: f64) -> f64 {
        (self.margin_ratio * base_width).floor().max(self.margin_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_margin_minimum_and_ratio() {
        let config = GameConfig::default();
        assert_eq!(config.margin_for(150.0), 9.0);
        assert_eq!(config.margin_for(100.0), 8.0);
        assert_eq!(config.margin_for(20.0), 8.0);
        assert_eq!(config.margin_for(400.0), 24.0);
    }

    #[test]
    fn test_rejects_plate_wider_than_field() {
        let config = GameConfig {
            plate_width: 500.0,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WiderThanField { name: "plate width", .. })
        ));
    }

    #[test]
    fn test_rejects_speed_cap_below_initial() {
        let config = GameConfig {
            max_speed: 1.0,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::SpeedCap { .. })));
    }

    #[test]
    fn test_rejects_zero_threshold_and_duration() {
        let config = GameConfig {
            win_threshold: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroThreshold));
        let config = GameConfig {
            round_secs: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration));
    }

    #[test]
    fn test_rejects_nan_width() {
        let config = GameConfig {
            field_width: f64::NAN,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotPositive { .. })));
    }
}
