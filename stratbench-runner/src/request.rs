//! Inbound backtest request and its validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data_source::is_valid_symbol;
use crate::error::BacktestError;

/// Capital used when a request does not specify one.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request as received from the outer boundary: every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBacktestRequest {
    #[serde(default)]
    pub strategy_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub initial_capital: Option<f64>,
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub strategy_id: String,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
}

impl RawBacktestRequest {
    pub fn validate(self) -> Result<BacktestRequest, BacktestError> {
        let strategy_id = required("strategy_id", self.strategy_id)?;
        let symbol = required("symbol", self.symbol)?;
        let start_date = parse_date("start_date", required("start_date", self.start_date)?)?;
        let end_date = parse_date("end_date", required("end_date", self.end_date)?)?;
        BacktestRequest::new(
            strategy_id,
            symbol,
            start_date,
            end_date,
            self.initial_capital.unwrap_or(DEFAULT_INITIAL_CAPITAL),
        )
    }
}

impl BacktestRequest {
    pub fn new(
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_capital: f64,
    ) -> Result<Self, BacktestError> {
        let strategy_id = strategy_id.into().trim().to_string();
        let symbol = symbol.into().trim().to_string();
        if strategy_id.is_empty() {
            return Err(BacktestError::InputValidation("strategy_id is required".into()));
        }
        if symbol.is_empty() {
            return Err(BacktestError::InputValidation("symbol is required".into()));
        }
        if !is_valid_symbol(&symbol) {
            return Err(BacktestError::InputValidation(format!(
                "symbol '{symbol}' may only contain letters, digits, '.', '_' and '-'"
            )));
        }
        if start_date > end_date {
            return Err(BacktestError::InputValidation(format!(
                "start_date {start_date} is after end_date {end_date}"
            )));
        }
        if !(initial_capital.is_finite() && initial_capital > 0.0) {
            return Err(BacktestError::InputValidation(format!(
                "initial_capital must be positive, got {initial_capital}"
            )));
        }
        Ok(Self {
            strategy_id,
            symbol,
            start_date,
            end_date,
            initial_capital,
        })
    }
}

/// A file of requests for a batch run (`[[request]]` tables).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFile {
    #[serde(default)]
    pub request: Vec<RawBacktestRequest>,
}

impl BatchFile {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, BacktestError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BacktestError::InputValidation(format!("{field} is required"))),
    }
}

fn parse_date(field: &str, value: String) -> Result<NaiveDate, BacktestError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        BacktestError::InputValidation(format!("{field} '{value}' is not YYYY-MM-DD: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawBacktestRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn capital_defaults_to_ten_thousand() {
        let req = raw(json!({
            "strategy_id": "s1",
            "symbol": "SPY",
            "start_date": "2024-01-01",
            "end_date": "2024-06-30"
        }))
        .validate()
        .unwrap();
        assert_eq!(req.initial_capital, 10_000.0);
        assert_eq!(req.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn missing_fields_are_input_errors() {
        for missing in ["strategy_id", "symbol", "start_date", "end_date"] {
            let mut v = json!({
                "strategy_id": "s1",
                "symbol": "SPY",
                "start_date": "2024-01-01",
                "end_date": "2024-06-30"
            });
            v.as_object_mut().unwrap().remove(missing);
            let err = raw(v).validate().unwrap_err();
            assert!(
                matches!(&err, BacktestError::InputValidation(m) if m.contains(missing)),
                "{missing}: {err}"
            );
        }
    }

    #[test]
    fn blank_symbol_is_missing() {
        let err = raw(json!({
            "strategy_id": "s1",
            "symbol": "  ",
            "start_date": "2024-01-01",
            "end_date": "2024-06-30"
        }))
        .validate()
        .unwrap_err();
        assert!(matches!(err, BacktestError::InputValidation(_)));
    }

    #[test]
    fn path_like_symbols_rejected() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for symbol in ["../secret", "data/SPY", "..", ".env"] {
            let err = BacktestRequest::new("s1", symbol, d, d, 100.0).unwrap_err();
            assert!(matches!(err, BacktestError::InputValidation(_)), "{symbol}");
        }
        assert_eq!(BacktestRequest::new("s1", " BRK.B ", d, d, 100.0).unwrap().symbol, "BRK.B");
    }

    #[test]
    fn bad_date_and_reversed_range_rejected() {
        let bad = raw(json!({
            "strategy_id": "s1", "symbol": "SPY",
            "start_date": "01/02/2024", "end_date": "2024-06-30"
        }));
        assert!(bad.validate().is_err());

        let reversed = raw(json!({
            "strategy_id": "s1", "symbol": "SPY",
            "start_date": "2024-07-01", "end_date": "2024-06-30"
        }));
        assert!(reversed.validate().is_err());
    }

    #[test]
    fn non_positive_capital_rejected() {
        for capital in [0.0, -100.0] {
            let r = raw(json!({
                "strategy_id": "s1", "symbol": "SPY",
                "start_date": "2024-01-01", "end_date": "2024-06-30",
                "initial_capital": capital
            }));
            assert!(matches!(r.validate(), Err(BacktestError::InputValidation(_))));
        }
    }

    #[test]
    fn batch_file_parses_requests() {
        let batch = BatchFile::from_toml_str(
            r#"
            [[request]]
            strategy_id = "a"
            symbol = "SPY"
            start_date = "2024-01-01"
            end_date = "2024-12-31"

            [[request]]
            strategy_id = "b"
            symbol = "QQQ"
            start_date = "2024-01-01"
            end_date = "2024-12-31"
            initial_capital = 5000.0
            "#,
        )
        .unwrap();
        assert_eq!(batch.request.len(), 2);
        assert_eq!(batch.request[1].initial_capital, Some(5000.0));
    }
}
