/// Wilder average true range over OHLC bars.
///
/// The core tracker deliberately accepts a pre-computed magnitude, so
/// the ATR lives here on the caller side. Returns `None` until a full
/// `period` of true ranges has been seen.
#[derive(Debug)]
pub struct AtrModel {
    period: usize,
    prev_close: Option<f64>,
    tr_sum: f64,
    tr_count: usize,
    atr: f64,
}

impl AtrModel {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            tr_sum: 0.0,
            tr_count: 0,
            atr: 0.0,
        }
    }

    pub fn add(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let tr = match self.prev_close {
            None => high - low,
            Some(pc) => (high - low).max((high - pc).abs()).max((low - pc).abs()),
        };
        self.prev_close = Some(close);

        if self.tr_count < self.period {
            // seed with a simple average of the first `period` true ranges
            self.tr_sum += tr;
            self.tr_count += 1;
            if self.tr_count < self.period {
                return None;
            }
            self.atr = self.tr_sum / self.period as f64;
        } else {
            self.atr = (self.atr * (self.period as f64 - 1.0) + tr) / self.period as f64;
        }

        Some(self.atr)
    }
}
