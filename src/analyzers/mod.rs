//! Factor analyzers
//!
//! Each analyzer condenses one class of upstream data into a
//! `FactorScore` in [0, 1], where 0.5 is neutral. Adjustments are
//! additive and individually clamped; any upstream failure degrades
//! that analyzer to neutral instead of failing the cycle. Fetches are
//! memoized through `TtlCache` so a 60-second polling loop does not
//! hammer slow-moving sources.

pub mod macro_economic;
pub mod onchain;
pub mod sentiment;
pub mod whale;

pub use macro_economic::MacroAnalyzer;
pub use onchain::OnChainAnalyzer;
pub use sentiment::SentimentAnalyzer;
pub use whale::WhaleAnalyzer;

use serde::Serialize;
use serde_json::Value;

pub const NEUTRAL_SCORE: f64 = 0.5;

/// One analyzer's output for a cycle
#[derive(Debug, Clone, Serialize)]
pub struct FactorScore {
    /// Score in [0, 1]; 0.5 is neutral
    pub value: f64,
    /// Raw inputs behind the score, for the signal log
    pub components: Value,
}

impl FactorScore {
    pub fn neutral() -> Self {
        Self {
            value: NEUTRAL_SCORE,
            components: Value::Null,
        }
    }
}

pub(crate) fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Lock helper for the per-analyzer caches; the guards are never held
/// across an await
pub(crate) fn lock<T: Clone>(
    mutex: &std::sync::Mutex<crate::cache::TtlCache<T>>,
) -> std::sync::MutexGuard<'_, crate::cache::TtlCache<T>> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keyword-lexicon polarity in [-1, 1]. Zero when no sentiment-bearing
/// word appears.
pub fn lexicon_polarity(text: &str) -> f64 {
    const BULLISH: &[&str] = &[
        "bullish", "moon", "pump", "rally", "surge", "breakout", "buy", "bought", "accumulate",
        "adoption", "upgrade", "growth", "gain", "gains", "profit", "soar", "record", "high",
        "strong", "positive", "optimistic", "institutional",
    ];
    const BEARISH: &[&str] = &[
        "bearish", "dump", "crash", "plunge", "collapse", "sell", "sold", "selloff", "fear",
        "panic", "ban", "hack", "scam", "fraud", "loss", "losses", "drop", "weak", "negative",
        "liquidation", "bankruptcy", "lawsuit",
    ];

    let mut positives = 0usize;
    let mut negatives = 0usize;
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let lower = word.to_lowercase();
        if BULLISH.contains(&lower.as_str()) {
            positives += 1;
        } else if BEARISH.contains(&lower.as_str()) {
            negatives += 1;
        }
    }

    let total = positives + negatives;
    if total == 0 {
        0.0
    } else {
        (positives as f64 - negatives as f64) / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_signs_match_wording() {
        assert!(lexicon_polarity("massive rally, institutional adoption surge") > 0.0);
        assert!(lexicon_polarity("exchange hack triggers panic selloff") < 0.0);
        assert_eq!(lexicon_polarity("the weather is mild today"), 0.0);
    }

    #[test]
    fn polarity_is_bounded() {
        let p = lexicon_polarity("pump pump pump dump");
        assert!((-1.0..=1.0).contains(&p));
    }
}
