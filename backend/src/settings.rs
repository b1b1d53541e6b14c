//! Per-part scheduling configuration.

use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::items::Part;
use crate::scheduler::ScheduleError;
use crate::Interval;

/// The interval thresholds separating the ease-factor brackets.
///
/// An item falls into the bracket of the last threshold its current interval exceeds, or the
/// first bracket if it exceeds none.
pub const BRACKETS: [Interval; 4] = [2, 1200, 18000, 691200];

/// Scheduling settings for a part.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SrsConfig {
    /// The base interval after getting a new item right.
    ///
    /// Hard answers get a fifth of it and easy answers four times it.
    pub initial_right_interval: Interval,
    /// The base interval after getting a new item wrong.
    pub initial_wrong_interval: Interval,
    /// The ease factors used for successful reviews, one per bracket.
    pub right_factors: Vec<f64>,
    /// The ease factors used for failed reviews, one per bracket.
    pub wrong_factors: Vec<f64>,
}

impl SrsConfig {
    /// Check that the settings can be used for scheduling.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.initial_right_interval <= 0 || self.initial_wrong_interval <= 0 {
            return Err(ScheduleError::InvalidConfig("initial intervals must be positive".into()));
        }

        for (name, factors) in &[("right", &self.right_factors), ("wrong", &self.wrong_factors)] {
            if factors.len() < BRACKETS.len() {
                return Err(ScheduleError::InvalidConfig(format!(
                    "{} factors has {} entries (expected {})", name, factors.len(), BRACKETS.len()
                )));
            }
            if factors.iter().any(|&x| !x.is_finite() || x <= 0.0) {
                return Err(ScheduleError::InvalidConfig(format!(
                    "{} factors must be finite and positive", name
                )));
            }
        }

        Ok(())
    }
}

impl Default for SrsConfig {
    fn default() -> SrsConfig {
        SrsConfig {
            // A week.
            initial_right_interval: 604800,
            // Ten minutes.
            initial_wrong_interval: 600,
            right_factors: vec![12.0, 3.5, 2.5, 2.2],
            wrong_factors: vec![0.25, 0.25, 0.25, 0.25],
        }
    }
}

/// The settings for every part.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    configs: HashMap<Part, SrsConfig>,
}

impl ConfigStore {
    /// Create a store without any configured parts.
    pub fn empty() -> ConfigStore {
        ConfigStore { configs: HashMap::new() }
    }

    /// Look up the settings of `part`.
    pub fn get(&self, part: Part) -> Result<&SrsConfig, ScheduleError> {
        self.configs
            .get(&part)
            .ok_or_else(|| ScheduleError::InvalidConfig(format!("no settings for part '{}'", part)))
    }

    /// Set the settings of `part`, returning the previous settings.
    ///
    /// The settings are validated first.
    pub fn insert(&mut self, part: Part, config: SrsConfig) -> Result<Option<SrsConfig>, ScheduleError> {
        config.validate()?;
        Ok(self.configs.insert(part, config))
    }

    /// Is `part` configured?
    pub fn contains(&self, part: Part) -> bool {
        self.configs.contains_key(&part)
    }
}

impl Default for ConfigStore {
    fn default() -> ConfigStore {
        let mut configs = HashMap::new();
        for &part in &Part::ALL {
            configs.insert(part, SrsConfig::default());
        }
        // Tones are easier to retain than writing.
        if let Some(tone) = configs.get_mut(&Part::Tone) {
            tone.right_factors = vec![12.0, 4.0, 3.0, 2.5];
        }

        ConfigStore { configs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let store = ConfigStore::default();
        for &part in &Part::ALL {
            store.get(part).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn short_factors() {
        let config = SrsConfig {
            wrong_factors: vec![0.5, 0.5, 0.5],
            ..SrsConfig::default()
        };
        match config.validate() {
            Err(ScheduleError::InvalidConfig(msg)) => assert!(msg.contains("wrong factors")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_part() {
        let mut store = ConfigStore::empty();
        assert!(store.get(Part::Rune).is_err());
        assert!(store.insert(Part::Rune, SrsConfig::default()).unwrap().is_none());
        assert!(store.contains(Part::Rune));
        assert!(store.insert(Part::Defn, SrsConfig { initial_right_interval: 0, ..SrsConfig::default() }).is_err());
        assert!(!store.contains(Part::Defn));
    }

    #[test]
    fn camel_case_fields() {
        let config: SrsConfig = yaml::from_str("
initialRightInterval: 3600
initialWrongInterval: 60
rightFactors: [2, 2, 2, 2]
wrongFactors: [0.5, 0.5, 0.5, 0.5]
").unwrap();
        assert_eq!(config.initial_right_interval, 3600);
        assert_eq!(config.right_factors, vec![2.0; 4]);
    }
}
