//! Performance statistics over a simulated trade list.

use super::simulator::{BacktestResult, Outcome};

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub open: usize,
    /// Percent of closed trades that won.
    pub win_rate_pct: f64,
    pub growth_pct: f64,
    /// Largest peak-to-trough fall of the capital curve, as a fraction.
    pub max_drawdown: f64,
    pub avg_bars_held: f64,
    pub max_consecutive_losses: usize,
    pub profit_factor: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut open = 0usize;
        let mut gross_win = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut bars_held = 0usize;
        let mut streak = 0usize;
        let mut max_consecutive_losses = 0usize;

        let mut capital = result.initial_capital;
        let mut curve = Vec::with_capacity(result.trades.len() + 1);
        curve.push(capital);

        for trade in &result.trades {
            let pnl = trade.capital_after - capital;
            capital = trade.capital_after;

            match trade.outcome {
                Outcome::Win => {
                    wins += 1;
                    gross_win += pnl;
                    streak = 0;
                }
                Outcome::Loss => {
                    losses += 1;
                    gross_loss += pnl.abs();
                    streak += 1;
                    max_consecutive_losses = max_consecutive_losses.max(streak);
                }
                Outcome::Open => {
                    open += 1;
                    continue;
                }
            }
            bars_held += trade.bars_held().unwrap_or(0);
            curve.push(capital);
        }

        let closed = wins + losses;
        let profit_factor = if gross_loss > 0.0 {
            gross_win / gross_loss
        } else if gross_win > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let avg_bars_held = if closed > 0 {
            bars_held as f64 / closed as f64
        } else {
            0.0
        };

        Metrics {
            total_trades: closed,
            wins,
            losses,
            open,
            win_rate_pct: result.win_rate_pct,
            growth_pct: result.growth_pct,
            max_drawdown: compute_drawdown(&curve),
            avg_bars_held,
            max_consecutive_losses,
            profit_factor,
        }
    }
}

fn compute_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in curve {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}
