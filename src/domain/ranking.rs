//! Momentum/volatility ranking and target allocation.
//!
//! Score = mean daily return over the momentum window divided by the sample
//! standard deviation of daily returns over the volatility window. Positive
//! scores are taken greedily in descending order until `top_n` tickers are
//! held, subject to the per-category slot cap. Weights are proportional to
//! score.
//!
//! The sector cap counts slots (each selected ticker takes `1 / top_n`), not
//! final capital weights, so a category's capital share can exceed
//! `max_sector_weight` after score weighting.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::price_table::PriceTable;
use super::stats::{mean, pct_returns, sample_stddev};
use super::strategy::StrategyConfig;
use super::universe::{Universe, UNKNOWN_CATEGORY};

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub ticker: String,
    pub momentum: f64,
    pub volatility: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationEntry {
    pub ticker: String,
    pub category: String,
    pub score: f64,
    pub weight: f64,
}

/// Target weights for one rebalance, in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    entries: Vec<AllocationEntry>,
}

impl Allocation {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    pub fn weight(&self, ticker: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.ticker == ticker)
            .map(|e| e.weight)
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Selected tickers per category.
    pub fn category_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.category.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

pub struct Ranker<'a> {
    config: &'a StrategyConfig,
    universe: &'a Universe,
}

impl<'a> Ranker<'a> {
    pub fn new(config: &'a StrategyConfig, universe: &'a Universe) -> Self {
        Ranker { config, universe }
    }

    /// Target allocation for `date`. Empty when the date is not in the table,
    /// history is too short, or nothing qualifies.
    pub fn rank(&self, date: NaiveDate, table: &PriceTable) -> Allocation {
        match table.row_index(date) {
            Some(row) => self.rank_row(row, table),
            None => Allocation::default(),
        }
    }

    pub fn rank_row(&self, row: usize, table: &PriceTable) -> Allocation {
        self.select(&self.scores(row, table))
    }

    /// Eligible tickers with their scores, best first. Equal scores keep
    /// table column order.
    pub fn scores(&self, row: usize, table: &PriceTable) -> Vec<Score> {
        let lookback_mom = self.config.lookback_momentum;
        let lookback_vol = self.config.lookback_volatility;
        if row >= table.len() || row < lookback_mom || row < lookback_vol {
            return Vec::new();
        }

        let mut scores: Vec<Score> = table
            .tickers()
            .iter()
            .enumerate()
            .filter_map(|(col, ticker)| {
                let mom_returns = pct_returns(&table.column_window(col, row - lookback_mom, row))?;
                let vol_returns = pct_returns(&table.column_window(col, row - lookback_vol, row))?;
                let momentum = mean(&mom_returns)?;
                let volatility = sample_stddev(&vol_returns)?;
                if volatility <= 0.0 {
                    return None;
                }
                let score = momentum / volatility;
                score.is_finite().then(|| Score {
                    ticker: ticker.clone(),
                    momentum,
                    volatility,
                    score,
                })
            })
            .collect();

        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }

    fn select(&self, scores: &[Score]) -> Allocation {
        let max_slots = self.config.max_slots_per_category();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut picked: Vec<(&Score, &str)> = Vec::new();

        for candidate in scores.iter().filter(|s| s.score > 0.0) {
            if picked.len() >= self.config.top_n {
                break;
            }
            let category = self.universe.category_of(&candidate.ticker);
            if category == UNKNOWN_CATEGORY {
                continue;
            }
            let used = slots.entry(category).or_insert(0);
            if *used >= max_slots {
                continue;
            }
            *used += 1;
            picked.push((candidate, category));
        }

        let total: f64 = picked.iter().map(|(s, _)| s.score).sum();
        if picked.is_empty() || total <= 0.0 {
            return Allocation::default();
        }

        Allocation {
            entries: picked
                .into_iter()
                .map(|(s, category)| AllocationEntry {
                    ticker: s.ticker.clone(),
                    category: category.to_string(),
                    score: s.score,
                    weight: s.score / total,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::universe::Category;
    use chrono::Duration;

    const ROWS: usize = 12;

    fn config() -> StrategyConfig {
        StrategyConfig {
            lookback_momentum: 6,
            lookback_volatility: 4,
            top_n: 4,
            max_sector_weight: 0.5,
            ..StrategyConfig::default()
        }
    }

    /// Prices moving by alternating returns `a`, `b`, `a`, ...
    fn alternating(a: f64, b: f64) -> Vec<Option<f64>> {
        let mut price = 100.0;
        (0..ROWS)
            .map(|i| {
                if i > 0 {
                    price *= 1.0 + if i % 2 == 1 { a } else { b };
                }
                Some(price)
            })
            .collect()
    }

    fn table(columns: Vec<(&str, Vec<Option<f64>>)>) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..ROWS).map(|i| start + Duration::days(i as i64)).collect();
        let tickers = columns.iter().map(|(t, _)| t.to_string()).collect();
        let rows = (0..ROWS)
            .map(|r| columns.iter().map(|(_, c)| c[r]).collect())
            .collect();
        PriceTable::new(dates, tickers, rows).unwrap()
    }

    fn universe(entries: &[(&str, &[&str])]) -> Universe {
        Universe::new(
            entries
                .iter()
                .map(|(name, tickers)| Category {
                    name: name.to_string(),
                    tickers: tickers.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        )
    }

    fn tickers(allocation: &Allocation) -> Vec<&str> {
        allocation
            .entries()
            .iter()
            .map(|e| e.ticker.as_str())
            .collect()
    }

    #[test]
    fn insufficient_history_is_empty() {
        let cfg = config();
        let uni = universe(&[("Growth", &["UP"])]);
        let t = table(vec![("UP", alternating(0.03, 0.01))]);
        let ranker = Ranker::new(&cfg, &uni);

        assert!(ranker.rank_row(5, &t).is_empty());
        assert_eq!(ranker.rank_row(6, &t).len(), 1);
    }

    #[test]
    fn unknown_date_is_empty() {
        let cfg = config();
        let uni = universe(&[("Growth", &["UP"])]);
        let t = table(vec![("UP", alternating(0.03, 0.01))]);
        let ranker = Ranker::new(&cfg, &uni);

        let missing = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(ranker.rank(missing, &t).is_empty());
    }

    #[test]
    fn negative_momentum_never_selected() {
        let cfg = config();
        let uni = universe(&[("Growth", &["UP"]), ("Defense", &["DOWN"])]);
        let t = table(vec![
            ("UP", alternating(0.03, 0.01)),
            ("DOWN", alternating(-0.03, -0.01)),
        ]);
        let ranker = Ranker::new(&cfg, &uni);

        let allocation = ranker.rank_row(ROWS - 1, &t);
        assert_eq!(tickers(&allocation), vec!["UP"]);
        assert!((allocation.weight("UP").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_negative_is_empty() {
        let cfg = config();
        let uni = universe(&[("Defense", &["DOWN"])]);
        let t = table(vec![("DOWN", alternating(-0.03, -0.01))]);
        let ranker = Ranker::new(&cfg, &uni);

        assert!(ranker.rank_row(ROWS - 1, &t).is_empty());
    }

    #[test]
    fn zero_volatility_excluded() {
        let cfg = config();
        let uni = universe(&[("Growth", &["FLAT", "UP"])]);
        // one rise at the start of the momentum window, flat through the
        // whole volatility window
        let mut flat: Vec<Option<f64>> = vec![Some(120.0); ROWS];
        flat[ROWS - 7] = Some(110.0);
        let t = table(vec![("FLAT", flat), ("UP", alternating(0.03, 0.01))]);
        let ranker = Ranker::new(&cfg, &uni);

        let scores = ranker.scores(ROWS - 1, &t);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].ticker, "UP");
        assert_eq!(tickers(&ranker.rank_row(ROWS - 1, &t)), vec!["UP"]);
    }

    #[test]
    fn gap_inside_window_excluded() {
        let cfg = config();
        let uni = universe(&[("Growth", &["GAP", "OLDGAP"])]);
        let mut gap = alternating(0.03, 0.01);
        gap[ROWS - 3] = None;
        let mut old_gap = alternating(0.03, 0.01);
        old_gap[1] = None;
        let t = table(vec![("GAP", gap), ("OLDGAP", old_gap)]);
        let ranker = Ranker::new(&cfg, &uni);

        // window for the last row starts at ROWS - 7, so row 1 is outside it
        let allocation = ranker.rank_row(ROWS - 1, &t);
        assert_eq!(tickers(&allocation), vec!["OLDGAP"]);
    }

    #[test]
    fn unknown_category_skipped_and_not_counted() {
        let cfg = StrategyConfig {
            top_n: 2,
            max_sector_weight: 1.0,
            ..config()
        };
        let uni = universe(&[("Growth", &["A", "B"])]);
        let t = table(vec![
            ("STRAY", alternating(0.02, 0.018)),
            ("A", alternating(0.03, 0.01)),
            ("B", alternating(0.05, 0.01)),
        ]);
        let ranker = Ranker::new(&cfg, &uni);

        let scores = ranker.scores(ROWS - 1, &t);
        assert_eq!(scores[0].ticker, "STRAY");

        let allocation = ranker.rank_row(ROWS - 1, &t);
        assert_eq!(tickers(&allocation), vec!["A", "B"]);
    }

    #[test]
    fn sector_cap_limits_slots() {
        let cfg = config();
        let uni = universe(&[("Growth", &["G1", "G2", "G3", "G4"]), ("Bonds", &["B1"])]);
        let t = table(vec![
            ("G1", alternating(0.02, 0.01)),
            ("G2", alternating(0.03, 0.01)),
            ("G3", alternating(0.04, 0.01)),
            ("G4", alternating(0.05, 0.01)),
            ("B1", alternating(0.08, 0.01)),
        ]);
        let ranker = Ranker::new(&cfg, &uni);

        let allocation = ranker.rank_row(ROWS - 1, &t);
        // top_n 4 at 0.5 leaves two Growth slots
        assert_eq!(tickers(&allocation), vec!["G1", "G2", "B1"]);
        assert_eq!(allocation.category_counts().get("Growth"), Some(&2));
    }

    #[test]
    fn top_n_limits_selection() {
        let cfg = StrategyConfig {
            top_n: 2,
            max_sector_weight: 1.0,
            ..config()
        };
        let uni = universe(&[("Growth", &["A", "B", "C"])]);
        let t = table(vec![
            ("A", alternating(0.05, 0.01)),
            ("B", alternating(0.02, 0.01)),
            ("C", alternating(0.03, 0.01)),
        ]);
        let ranker = Ranker::new(&cfg, &uni);

        let allocation = ranker.rank_row(ROWS - 1, &t);
        assert_eq!(tickers(&allocation), vec!["B", "C"]);
    }

    #[test]
    fn weights_proportional_to_score() {
        let cfg = config();
        let uni = universe(&[("Growth", &["A"]), ("Bonds", &["B"])]);
        let t = table(vec![
            ("A", alternating(0.03, 0.01)),
            ("B", alternating(0.02, 0.01)),
        ]);
        let ranker = Ranker::new(&cfg, &uni);

        let allocation = ranker.rank_row(ROWS - 1, &t);
        let entries = allocation.entries();
        assert_eq!(entries.len(), 2);
        assert!((allocation.total_weight() - 1.0).abs() < 1e-12);
        let ratio = entries[0].weight / entries[1].weight;
        assert!((ratio - entries[0].score / entries[1].score).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_column_order() {
        let cfg = StrategyConfig {
            top_n: 1,
            max_sector_weight: 1.0,
            ..config()
        };
        let uni = universe(&[("Growth", &["A", "B"])]);
        let ranker = Ranker::new(&cfg, &uni);

        let ab = table(vec![
            ("A", alternating(0.03, 0.01)),
            ("B", alternating(0.03, 0.01)),
        ]);
        assert_eq!(tickers(&ranker.rank_row(ROWS - 1, &ab)), vec!["A"]);

        let ba = table(vec![
            ("B", alternating(0.03, 0.01)),
            ("A", alternating(0.03, 0.01)),
        ]);
        assert_eq!(tickers(&ranker.rank_row(ROWS - 1, &ba)), vec!["B"]);
    }
}
