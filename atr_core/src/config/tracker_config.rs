use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::atr_exception::{AtrException, ErrCode};

/// Auto ATR configuration.
///
/// `atr_period` feeds the caller's magnitude computation (the core never
/// computes the ATR itself); the remaining fields parameterize the
/// tracker. Defaults: 14-period ATR, 4-bar median, 20% inner range.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerConfig {
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub median_period: usize,
    pub range_percentage: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            atr_multiplier: 1.0,
            median_period: 4,
            range_percentage: 20.0,
        }
    }
}

impl TrackerConfig {
    pub fn new(conf: Option<HashMap<String, serde_json::Value>>) -> Result<Self, AtrException> {
        let mut conf = ConfigWithCheck::new(conf.unwrap_or_default());

        let config = Self {
            atr_period: conf.get("atr_period")?.unwrap_or(14),
            atr_multiplier: conf.get("atr_multiplier")?.unwrap_or(1.0),
            median_period: conf.get("median_period")?.unwrap_or(4),
            range_percentage: conf.get("range_percentage")?.unwrap_or(20.0),
        };

        conf.check()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AtrException> {
        if self.atr_period == 0 {
            return Err(AtrException::new(
                "atr_period must be positive",
                ErrCode::InvalidConfiguration,
            ));
        }
        if self.median_period == 0 {
            return Err(AtrException::new(
                "median_period must be positive",
                ErrCode::InvalidConfiguration,
            ));
        }
        if !(0.0..=100.0).contains(&self.range_percentage) {
            return Err(AtrException::new(
                format!("range_percentage {} not in [0, 100]", self.range_percentage),
                ErrCode::InvalidConfiguration,
            ));
        }
        // negative atr_multiplier is legal; it inverts the bands
        Ok(())
    }
}

/// Key-value config view that tracks consumption and rejects leftovers.
struct ConfigWithCheck {
    conf: HashMap<String, serde_json::Value>,
    consumed: HashSet<String>,
}

impl ConfigWithCheck {
    fn new(conf: HashMap<String, serde_json::Value>) -> Self {
        Self {
            conf,
            consumed: HashSet::new(),
        }
    }

    fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, AtrException> {
        match self.conf.get(key) {
            None => Ok(None),
            Some(value) => {
                self.consumed.insert(key.to_string());
                serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                    AtrException::new(
                        format!("bad value for {}: {}", key, e),
                        ErrCode::InvalidConfiguration,
                    )
                })
            }
        }
    }

    fn check(&self) -> Result<(), AtrException> {
        for key in self.conf.keys() {
            if !self.consumed.contains(key) {
                return Err(AtrException::new(
                    format!("unknown config key: {}", key),
                    ErrCode::InvalidConfiguration,
                ));
            }
        }
        Ok(())
    }
}
