use bitvec::slice::BitSlice;

/// Weight and log-weight tables used to score cell uncertainty.
#[derive(Debug, Clone)]
pub struct EntropyModel {
    weights: Vec<f64>,
    log_prob: Vec<f64>,
    log_total: f64,
}

/// Enabled-action count and weight sum of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStats {
    pub amount: usize,
    pub sum: f64,
}

impl EntropyModel {
    /// Precomputes `ln(weight)` per action and `ln(action count)`.
    pub fn new(weights: Vec<f64>) -> Self {
        let log_prob = weights.iter().map(|w| w.ln()).collect();
        let log_total = (weights.len() as f64).ln();
        Self {
            weights,
            log_prob,
            log_total,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn num_actions(&self) -> usize {
        self.weights.len()
    }

    pub fn log_total(&self) -> f64 {
        self.log_total
    }

    pub fn stats(&self, domain: &BitSlice) -> CellStats {
        domain.iter_ones().fold(
            CellStats {
                amount: 0,
                sum: 0.0,
            },
            |acc, action| CellStats {
                amount: acc.amount + 1,
                sum: acc.sum + self.weights[action],
            },
        )
    }

    /// Weighted entropy of a non-empty domain.
    ///
    /// A single enabled action scores 0 and a full domain scores
    /// `ln(action count)`. Otherwise the score is
    /// `ln(sum) - Σ w·ln(w) / sum` over enabled actions, where zero-weight
    /// actions contribute nothing.
    pub fn entropy(&self, domain: &BitSlice, stats: CellStats) -> f64 {
        if stats.amount == 1 {
            return 0.0;
        }
        if stats.amount == self.num_actions() {
            return self.log_total;
        }
        let main_sum: f64 = domain
            .iter_ones()
            .filter(|&action| self.weights[action] > 0.0)
            .map(|action| self.weights[action] * self.log_prob[action])
            .sum();
        stats.sum.ln() - main_sum / stats.sum
    }
}
