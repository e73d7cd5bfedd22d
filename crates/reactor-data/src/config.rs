//! Validation of loaded engine configuration.
//!
//! Serde fills every missing field with its default, so a file can only be
//! wrong by carrying values the engine cannot run with.

use reactor_core::config::LabConfig;

/// A configuration value the engine cannot run with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("min_batch ({min_batch}) exceeds reactor_capacity ({capacity})")]
    BatchExceedsCapacity { min_batch: u32, capacity: u32 },

    #[error("prerequisite_headroom must be a finite factor of at least 1.0, got {0}")]
    Headroom(f64),
}

/// Check a configuration for values that would stall or break the engine.
pub fn validate_config(config: &LabConfig) -> Result<(), ConfigError> {
    let non_zero = [
        ("reactor_capacity", u64::from(config.reactor_capacity)),
        ("interaction_range", u64::from(config.interaction_range)),
        ("min_batch", u64::from(config.min_batch)),
        ("run_interval", config.run_interval),
        ("layout_cache_ttl", config.layout_cache_ttl),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            return Err(ConfigError::Zero { field });
        }
    }
    if config.min_batch > config.reactor_capacity {
        return Err(ConfigError::BatchExceedsCapacity {
            min_batch: config.min_batch,
            capacity: config.reactor_capacity,
        });
    }
    let headroom = config.prerequisite_headroom;
    if !headroom.is_finite() || headroom < 1.0 {
        return Err(ConfigError::Headroom(headroom));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&LabConfig::default()), Ok(()));
    }

    #[test]
    fn zero_range_is_rejected() {
        let config = LabConfig {
            interaction_range: 0,
            ..LabConfig::default()
        };
        assert_eq!(
            validate_config(&config),
            Err(ConfigError::Zero {
                field: "interaction_range"
            })
        );
    }

    #[test]
    fn batch_larger_than_capacity_is_rejected() {
        let config = LabConfig {
            reactor_capacity: 4,
            ..LabConfig::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::BatchExceedsCapacity { min_batch: 5, capacity: 4 })
        ));
    }

    #[test]
    fn headroom_below_one_is_rejected() {
        let config = LabConfig {
            prerequisite_headroom: 0.5,
            ..LabConfig::default()
        };
        assert_eq!(validate_config(&config), Err(ConfigError::Headroom(0.5)));
    }
}
