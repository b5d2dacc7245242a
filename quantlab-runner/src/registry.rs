//! Strategy registry — maps manifest keys to strategy constructors.
//!
//! This is the host-side stand-in for a dynamic plugin loader: the manifest
//! names an implementation, the registry builds a fresh instance per
//! backtest so concurrent runs share nothing.

use quantlab_core::strategy::{BuyAndHold, MaCrossover, Strategy};

/// Default windows for the crossover strategy when the manifest does not
/// parameterize it.
const DEFAULT_FAST_WINDOW: usize = 10;
const DEFAULT_SLOW_WINDOW: usize = 30;

/// Build a strategy instance for a registry key. `None` for unknown keys.
pub fn build_strategy(key: &str) -> Option<Box<dyn Strategy>> {
    match key {
        "buy_and_hold" => Some(Box::new(BuyAndHold::new())),
        "ma_crossover" => Some(Box::new(MaCrossover::new(
            DEFAULT_FAST_WINDOW,
            DEFAULT_SLOW_WINDOW,
        ))),
        _ => None,
    }
}

/// Keys accepted by `build_strategy`, for error messages.
pub fn known_strategies() -> &'static [&'static str] {
    &["buy_and_hold", "ma_crossover"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_known_strategies() {
        for key in known_strategies() {
            let strategy = build_strategy(key).unwrap();
            assert_eq!(&strategy.name(), key);
        }
    }

    #[test]
    fn unknown_key_is_none() {
        assert!(build_strategy("does_not_exist").is_none());
    }
}
