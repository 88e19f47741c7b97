use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const FORCE_FACTOR_ENV: &str = "BALLERONE_FORCE_FACTOR";
pub const TICK_HZ_ENV: &str = "BALLERONE_TICK_HZ";
pub const SAMPLE_HZ_ENV: &str = "BALLERONE_SAMPLE_HZ";

/// Tuning for the tilt steering loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringConfig {
    /// Impulse magnitude applied on each latch/release edge
    pub force_factor: f64,
    /// How often the controller evaluates the latest sample
    pub tick_interval: Duration,
    /// Requested accelerometer update period
    pub sample_interval: Duration,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            force_factor: 0.2,
            tick_interval: Duration::from_secs_f64(1.0 / 6.0),
            sample_interval: Duration::from_secs_f64(1.0 / 60.0),
        }
    }
}

impl SteeringConfig {
    /// Defaults overridden by `BALLERONE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value lookup. Missing keys keep the current value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, FORCE_FACTOR_ENV)? {
            self.force_factor = v;
        }
        if let Some(hz) = parse_var(&lookup, TICK_HZ_ENV)? {
            self.tick_interval = interval_from_hz(hz, "tick interval")?;
        }
        if let Some(hz) = parse_var(&lookup, SAMPLE_HZ_ENV)? {
            self.sample_interval = interval_from_hz(hz, "sample interval")?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_force_factor(mut self, force_factor: f64) -> Self {
        self.force_factor = force_factor;
        self
    }

    pub fn with_tick_hz(mut self, hz: f64) -> Result<Self, ConfigError> {
        self.tick_interval = interval_from_hz(hz, "tick interval")?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.force_factor.is_finite() && self.force_factor > 0.0) {
            return Err(ConfigError::InvalidForceFactor(self.force_factor));
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::InvalidInterval { name: "tick interval" });
        }
        if self.sample_interval.is_zero() {
            return Err(ConfigError::InvalidInterval { name: "sample interval" });
        }
        Ok(())
    }
}

fn parse_var<F>(lookup: &F, key: &'static str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
    }
}

fn interval_from_hz(hz: f64, name: &'static str) -> Result<Duration, ConfigError> {
    if !(hz.is_finite() && hz > 0.0) {
        return Err(ConfigError::InvalidInterval { name });
    }
    Duration::try_from_secs_f64(1.0 / hz).map_err(|_| ConfigError::InvalidInterval { name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_sensor_and_tick_rates() {
        let config = SteeringConfig::default();
        assert_eq!(config.force_factor, 0.2);
        assert!((config.tick_interval.as_secs_f64() - 1.0 / 6.0).abs() < 1e-9);
        assert!((config.sample_interval.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_apply() {
        let config = SteeringConfig::default()
            .with_overrides(lookup(&[(FORCE_FACTOR_ENV, " 0.5 "), (TICK_HZ_ENV, "10")]))
            .unwrap();
        assert_eq!(config.force_factor, 0.5);
        assert!((config.tick_interval.as_secs_f64() - 0.1).abs() < 1e-9);
        assert_eq!(config.sample_interval, SteeringConfig::default().sample_interval);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let err = SteeringConfig::default()
            .with_overrides(lookup(&[(FORCE_FACTOR_ENV, "strong")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv { key: FORCE_FACTOR_ENV, value: "strong".to_string() }
        );

        let err = SteeringConfig::default()
            .with_overrides(lookup(&[(FORCE_FACTOR_ENV, "-1")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidForceFactor(-1.0));

        let err = SteeringConfig::default()
            .with_overrides(lookup(&[(SAMPLE_HZ_ENV, "0")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidInterval { name: "sample interval" });
    }
}
