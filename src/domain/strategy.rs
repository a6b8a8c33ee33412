//! Strategy parameters for the ranker and the simulation engine.

use chrono::Weekday;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Trading rows in the momentum window (returns are taken over
    /// `lookback_momentum + 1` prices).
    pub lookback_momentum: usize,
    pub lookback_volatility: usize,
    pub top_n: usize,
    /// Largest share of the `top_n` slots a single category may take.
    pub max_sector_weight: f64,
    /// Negative fraction; a position at or below this return is sold.
    pub stop_loss_pct: f64,
    pub rebalance_weekday: Weekday,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            lookback_momentum: 90,
            lookback_volatility: 30,
            top_n: 25,
            max_sector_weight: 0.35,
            stop_loss_pct: -0.07,
            rebalance_weekday: Weekday::Fri,
        }
    }
}

impl StrategyConfig {
    /// Slots a single category may fill before the sector cap rejects it.
    pub fn max_slots_per_category(&self) -> usize {
        (0..=self.top_n)
            .take_while(|&n| n as f64 / self.top_n as f64 <= self.max_sector_weight)
            .last()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = StrategyConfig::default();
        assert_eq!(s.lookback_momentum, 90);
        assert_eq!(s.lookback_volatility, 30);
        assert_eq!(s.top_n, 25);
        assert_eq!(s.max_sector_weight, 0.35);
        assert_eq!(s.stop_loss_pct, -0.07);
        assert_eq!(s.rebalance_weekday, Weekday::Fri);
    }

    #[test]
    fn max_slots_default_is_eight() {
        // 8 / 25 = 0.32 fits, 9 / 25 = 0.36 does not
        assert_eq!(StrategyConfig::default().max_slots_per_category(), 8);
    }

    #[test]
    fn max_slots_exact_boundary() {
        let s = StrategyConfig {
            top_n: 4,
            max_sector_weight: 0.5,
            ..StrategyConfig::default()
        };
        assert_eq!(s.max_slots_per_category(), 2);
    }

    #[test]
    fn max_slots_uncapped() {
        let s = StrategyConfig {
            top_n: 5,
            max_sector_weight: 1.0,
            ..StrategyConfig::default()
        };
        assert_eq!(s.max_slots_per_category(), 5);
    }
}
