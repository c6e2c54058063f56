//! Typed strategy parameters.
//!
//! Persisted strategies carry a free-form parameter map. Each rule parses it
//! into an explicit struct: recognised keys only, documented defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StrategyError;

/// Free-form parameter map as stored with a strategy definition.
pub type ParameterMap = BTreeMap<String, Value>;

/// Parameters for the momentum (price vs. trailing SMA) rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumParams {
    /// Number of trailing closes in the moving average. Positive; default 20.
    pub lookback: usize,
}

impl MomentumParams {
    pub const DEFAULT_LOOKBACK: usize = 20;
    pub const KEYS: &'static [&'static str] = &["lookback"];

    /// Parse from a parameter map, rejecting unknown keys.
    pub fn from_map(params: &ParameterMap) -> Result<Self, StrategyError> {
        reject_unknown(params, Self::KEYS)?;
        let lookback = match params.get("lookback") {
            None => Self::DEFAULT_LOOKBACK,
            Some(v) => positive_integer("lookback", v)?,
        };
        Ok(Self { lookback })
    }

    pub fn to_map(&self) -> ParameterMap {
        let mut map = ParameterMap::new();
        map.insert("lookback".into(), Value::from(self.lookback as u64));
        map
    }
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            lookback: Self::DEFAULT_LOOKBACK,
        }
    }
}

fn reject_unknown(params: &ParameterMap, known: &[&str]) -> Result<(), StrategyError> {
    match params.keys().find(|k| !known.contains(&k.as_str())) {
        Some(key) => Err(StrategyError::UnknownParameter(key.clone())),
        None => Ok(()),
    }
}

fn positive_integer(key: &str, value: &Value) -> Result<usize, StrategyError> {
    let invalid = |reason: &str| StrategyError::InvalidParameter {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    // Accept 20 and 20.0, reject 20.5, strings, and negatives.
    let n = match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                if f.fract() != 0.0 || f < 0.0 || !f.is_finite() {
                    return Err(invalid("must be a positive integer"));
                }
                f as u64
            } else {
                return Err(invalid("must be a positive integer"));
            }
        }
        _ => return Err(invalid("must be a number")),
    };
    if n == 0 {
        return Err(invalid("must be greater than zero"));
    }
    usize::try_from(n).map_err(|_| invalid("out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> ParameterMap {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn lookback_defaults_to_twenty() {
        let p = MomentumParams::from_map(&ParameterMap::new()).unwrap();
        assert_eq!(p.lookback, 20);
        assert_eq!(p, MomentumParams::default());
    }

    #[test]
    fn accepts_integral_float() {
        let p = MomentumParams::from_map(&map(json!({"lookback": 5.0}))).unwrap();
        assert_eq!(p.lookback, 5);
    }

    #[test]
    fn rejects_unknown_key() {
        let err = MomentumParams::from_map(&map(json!({"lookback": 5, "threshold": 0.1})))
            .unwrap_err();
        assert!(matches!(err, StrategyError::UnknownParameter(k) if k == "threshold"));
    }

    #[test]
    fn rejects_zero_negative_fractional_and_text() {
        for bad in [json!(0), json!(-3), json!(2.5), json!("20"), json!(null)] {
            let err = MomentumParams::from_map(&map(json!({ "lookback": bad }))).unwrap_err();
            assert!(
                matches!(err, StrategyError::InvalidParameter { ref key, .. } if key == "lookback"),
                "unexpected error {err:?}"
            );
        }
    }

    #[test]
    fn to_map_round_trips() {
        let p = MomentumParams { lookback: 7 };
        assert_eq!(MomentumParams::from_map(&p.to_map()).unwrap(), p);
    }
}
