//! Technical indicators over daily closes.

use ta::indicators::{Maximum, Minimum, RelativeStrengthIndex};
use ta::Next;

/// RSI reported when there is not enough history to compute one.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Offset from the close used when support/resistance cannot be computed.
pub const FALLBACK_BAND: f64 = 10.0;

/// Indicator values for the latest close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: f64,
    pub support: f64,
    pub resistance: f64,
}

/// RSI of the final close, or `None` if fewer than `period + 1` closes exist.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    rsi_series(closes, period).last().copied().flatten()
}

/// RSI for every close; the first `period` entries are warm-up and `None`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let Ok(mut indicator) = RelativeStrengthIndex::new(period) else {
        return vec![None; closes.len()];
    };

    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let value = indicator.next(*close);
            (i >= period).then_some(value)
        })
        .collect()
}

/// Rolling minimum and maximum of the last `window` closes.
///
/// `None` if fewer than `window` closes exist.
pub fn support_resistance(closes: &[f64], window: usize) -> Option<(f64, f64)> {
    if window == 0 || closes.len() < window {
        return None;
    }

    let mut min = Minimum::new(window).ok()?;
    let mut max = Maximum::new(window).ok()?;
    let mut last = None;
    for close in closes {
        last = Some((min.next(*close), max.next(*close)));
    }
    last
}

/// Snapshot for the latest close, with neutral fallbacks for short history.
///
/// Returns `None` only when there are no closes at all.
pub fn snapshot(closes: &[f64], rsi_period: usize, sr_window: usize) -> Option<IndicatorSnapshot> {
    let close = *closes.last()?;
    let rsi = rsi(closes, rsi_period).unwrap_or(NEUTRAL_RSI);
    let (support, resistance) = support_resistance(closes, sr_window)
        .unwrap_or((close - FALLBACK_BAND, close + FALLBACK_BAND));

    Some(IndicatorSnapshot {
        close,
        rsi,
        support,
        resistance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RISING: [f64; 15] = [
        100.0, 102.0, 101.0, 105.0, 107.0, 106.0, 108.0, 110.0, 109.0, 111.0, 113.0, 112.0, 114.0,
        115.0, 117.0,
    ];

    #[test]
    fn test_rsi_on_uptrend_is_bullish() {
        let value = rsi(&RISING, 14).unwrap();
        assert!(value > 50.0 && value < 100.0, "rsi was {value}");
    }

    #[test]
    fn test_rsi_needs_warm_up() {
        assert!(rsi(&RISING[..14], 14).is_none());
        let series = rsi_series(&RISING, 14);
        assert_eq!(series.iter().filter(|v| v.is_some()).count(), 1);
    }

    #[test]
    fn test_support_resistance_window() {
        let (support, resistance) = support_resistance(&RISING, 5).unwrap();
        // last five closes: 113, 112, 114, 115, 117
        assert_eq!(support, 112.0);
        assert_eq!(resistance, 117.0);
    }

    #[test]
    fn test_snapshot_falls_back_on_short_history() {
        let snap = snapshot(&RISING, 14, 20).unwrap();
        assert_eq!(snap.close, 117.0);
        assert_eq!(snap.support, 107.0);
        assert_eq!(snap.resistance, 127.0);

        let short = snapshot(&[250.0, 251.0], 14, 20).unwrap();
        assert_eq!(short.rsi, NEUTRAL_RSI);
    }

    #[test]
    fn test_snapshot_empty() {
        assert!(snapshot(&[], 14, 20).is_none());
    }
}
