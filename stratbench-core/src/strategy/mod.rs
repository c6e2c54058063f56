//! Strategy definitions and the rule trait that turns bar history into signals.
//!
//! A `StrategyDefinition` is owned by the persistence layer; the simulation
//! only reads it. `build_rule` maps its kind to a concrete `StrategyRule`, and
//! kinds without an implementation fail here instead of running a no-op
//! simulation.

pub mod momentum;
pub mod params;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{Bar, PositionState};

pub use momentum::MomentumRule;
pub use params::{MomentumParams, ParameterMap};

/// Errors from building a rule out of a definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("unsupported strategy kind: {0}")]
    UnsupportedKind(StrategyKind),
    #[error("unknown strategy parameter: {0}")]
    UnknownParameter(String),
    #[error("invalid strategy parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },
}

/// Closed set of strategy kinds a definition may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Momentum,
    MeanReversion,
    Breakout,
    Custom,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "momentum",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::Breakout => "breakout",
            StrategyKind::Custom => "custom",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted lifecycle status of a strategy.
///
/// `Backtesting` marks a run in progress; a run may only start from `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyStatus {
    Active,
    #[default]
    Inactive,
    Backtesting,
}

impl fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyStatus::Active => "active",
            StrategyStatus::Inactive => "inactive",
            StrategyStatus::Backtesting => "backtesting",
        };
        f.write_str(s)
    }
}

/// A user-defined strategy as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: StrategyKind,
    #[serde(default)]
    pub parameters: ParameterMap,
    #[serde(default)]
    pub status: StrategyStatus,
}

/// Per-bar decision of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Enter,
    Exit,
    Hold,
}

/// Trading rule: bar history plus current position state in, signal out.
///
/// Implementations must be pure and may only read `bars[..=index]`.
pub trait StrategyRule: Send + Sync {
    /// Kind this rule implements.
    fn kind(&self) -> StrategyKind;

    /// Bars needed before the rule can emit anything but `Hold`.
    fn warmup_bars(&self) -> usize;

    fn decide(&self, bars: &[Bar], index: usize, position: PositionState) -> Signal;
}

/// Build the rule for a definition, validating its parameters.
pub fn build_rule(definition: &StrategyDefinition) -> Result<Box<dyn StrategyRule>, StrategyError> {
    match definition.kind {
        StrategyKind::Momentum => {
            let params = MomentumParams::from_map(&definition.parameters)?;
            Ok(Box::new(MomentumRule::new(params)))
        }
        kind @ (StrategyKind::MeanReversion | StrategyKind::Breakout | StrategyKind::Custom) => {
            Err(StrategyError::UnsupportedKind(kind))
        }
    }
}
