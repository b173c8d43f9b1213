//! Heikin-Ashi smoothing.

use super::candle::Candle;

/// Transform raw candles into Heikin-Ashi candles.
///
/// The first open seeds from the raw candle's own open/close midpoint, and so
/// does any open following a non-finite candle, which keeps a single bad row
/// from poisoning the rest of the series. Timestamps and volume carry over
/// unchanged.
pub fn transform(candles: &[Candle]) -> Vec<Candle> {
    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());

    for candle in candles {
        let close = (candle.open + candle.high + candle.low + candle.close) / 4.0;
        let open = match out.last() {
            Some(prev) if prev.is_finite() => (prev.open + prev.close) / 2.0,
            _ => (candle.open + candle.close) / 2.0,
        };
        out.push(Candle {
            timestamp: candle.timestamp,
            open,
            high: candle.high.max(open).max(close),
            low: candle.low.min(open).min(close),
            close,
            volume: candle.volume,
        });
    }

    out
}
