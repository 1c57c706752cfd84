//! Signal fusion
//!
//! One engine, one weighting table. The two historical strategies are
//! presets of `ScoreWeights`, not parallel code paths: the classifier
//! preset leans on the model probability with a trend-confirmation
//! gate, the multi-factor preset blends the analyzers with a whale
//! veto. Every factor lives in [0, 1] with 0.5 neutral; a missing
//! factor contributes its weight at neutral.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Trading decision for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// Immutable fusion output, one per cycle
#[derive(Debug, Clone, Serialize)]
pub struct CombinedSignal {
    pub action: Action,
    pub confidence: f64,
    pub price: f64,
    pub components: Value,
}

impl CombinedSignal {
    pub fn hold(price: f64) -> Self {
        Self {
            action: Action::Hold,
            confidence: 0.5,
            price,
            components: Value::Null,
        }
    }
}

/// Hard gate applied after thresholding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    None,
    /// BUY only in a confirmed uptrend, SELL only outside one
    TrendConfirmation,
    /// Veto BUY on bearish whales, SELL on bullish whales
    WhaleVeto,
}

/// Factor weighting table; zero weight drops a factor entirely
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub technical: f64,
    pub sentiment: f64,
    pub trend: f64,
    pub macro_economic: f64,
    pub onchain: f64,
    pub adx: f64,
    pub news: f64,
    pub gate: Gate,
}

impl ScoreWeights {
    /// Model-probability preset with trend confirmation
    pub fn classifier() -> Self {
        Self {
            technical: 0.6,
            sentiment: 0.2,
            trend: 0.2,
            macro_economic: 0.0,
            onchain: 0.0,
            adx: 0.0,
            news: 0.0,
            gate: Gate::TrendConfirmation,
        }
    }

    /// Analyzer-blend preset with whale veto. Weights sum to 0.85;
    /// the shortfall acts as a damper that pulls scores toward HOLD.
    pub fn multi_factor() -> Self {
        Self {
            technical: 0.0,
            sentiment: 0.2,
            trend: 0.0,
            macro_economic: 0.2,
            onchain: 0.2,
            adx: 0.1,
            news: 0.15,
            gate: Gate::WhaleVeto,
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::multi_factor()
    }
}

/// Per-cycle factor values, each in [0, 1]. `None` means the factor
/// was unavailable this cycle and is treated as neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorInputs {
    pub technical: Option<f64>,
    pub sentiment: Option<f64>,
    pub trend: Option<f64>,
    pub macro_economic: Option<f64>,
    pub onchain: Option<f64>,
    pub adx: Option<f64>,
    pub news: Option<f64>,
    pub whale: Option<f64>,
}

pub struct ScoringEngine {
    weights: ScoreWeights,
    buy_threshold: f64,
    sell_threshold: f64,
}

const NEUTRAL: f64 = 0.5;
const WHALE_BUY_FLOOR: f64 = 0.4;
const WHALE_SELL_CEILING: f64 = 0.6;

impl ScoringEngine {
    pub fn new(weights: ScoreWeights, buy_threshold: f64, sell_threshold: f64) -> Self {
        Self {
            weights,
            buy_threshold,
            sell_threshold,
        }
    }

    /// Fuse the cycle's factors into a signal. Never fails: anything
    /// non-finite resolves to HOLD at neutral confidence.
    pub fn fuse(&self, inputs: &FactorInputs, price: f64) -> CombinedSignal {
        let w = &self.weights;
        let factor = |v: Option<f64>| v.filter(|x| x.is_finite()).unwrap_or(NEUTRAL);

        let score = factor(inputs.technical) * w.technical
            + factor(inputs.sentiment) * w.sentiment
            + factor(inputs.trend) * w.trend
            + factor(inputs.macro_economic) * w.macro_economic
            + factor(inputs.onchain) * w.onchain
            + factor(inputs.adx) * w.adx
            + factor(inputs.news) * w.news;

        if !score.is_finite() || !price.is_finite() {
            return CombinedSignal::hold(price);
        }

        let mut action = if score > self.buy_threshold {
            Action::Buy
        } else if score < self.sell_threshold {
            Action::Sell
        } else {
            Action::Hold
        };

        let mut vetoed = false;
        match w.gate {
            Gate::None => {}
            Gate::TrendConfirmation => {
                let uptrend = factor(inputs.trend) >= NEUTRAL;
                if (action == Action::Buy && !uptrend) || (action == Action::Sell && uptrend) {
                    action = Action::Hold;
                    vetoed = true;
                }
            }
            Gate::WhaleVeto => {
                let whale = factor(inputs.whale);
                if (action == Action::Buy && whale <= WHALE_BUY_FLOOR)
                    || (action == Action::Sell && whale >= WHALE_SELL_CEILING)
                {
                    action = Action::Hold;
                    vetoed = true;
                }
            }
        }

        let confidence = match action {
            Action::Buy => score,
            Action::Sell => 1.0 - score,
            Action::Hold => 0.5,
        };

        CombinedSignal {
            action,
            confidence,
            price,
            components: json!({
                "score": score,
                "technical": inputs.technical,
                "sentiment": inputs.sentiment,
                "trend": inputs.trend,
                "macro": inputs.macro_economic,
                "onchain": inputs.onchain,
                "adx": inputs.adx,
                "news": inputs.news,
                "whale": inputs.whale,
                "gate_vetoed": vetoed,
            }),
        }
    }
}
