//! History ring buffer with adaptive decimation so that the stored span of
//! simulated time stays near a target while bounding memory use.

use std::collections::VecDeque;

pub const MAX_HISTORY: usize = 10_000;
pub const HISTORY_TARGET_S: f64 = 10.0;

/// One recorded sample: simulated time plus the probed channel values.
#[derive(Debug, Clone)]
pub struct HistorySample {
    pub t: f64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<HistorySample>,
    capacity: usize,
    decimation: usize,
    since_last: usize,
}

impl History {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_HISTORY),
            capacity: MAX_HISTORY,
            decimation: 1,
            since_last: 0,
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.decimation = 1;
        self.since_last = 0;
    }

    /// Recompute the decimation factor so the buffer spans roughly
    /// `HISTORY_TARGET_S` seconds at the given step size.
    pub fn update_decimation(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let raw = (HISTORY_TARGET_S / (self.capacity as f64 * dt)).ceil();
        self.decimation = (raw as usize).clamp(1, 10_000);
    }

    /// Append a sample if due per the current decimation factor.
    pub fn record(&mut self, t: f64, values: Vec<f64>) {
        self.since_last += 1;
        if self.since_last < self.decimation {
            return;
        }
        self.since_last = 0;
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(HistorySample { t, values });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Return up to `max_points` most recent `(time, value)` pairs for the
    /// given channel index.
    pub fn get_channel(&self, channel: usize, max_points: usize) -> (Vec<f64>, Vec<f64>) {
        let start = self.samples.len().saturating_sub(max_points);
        let mut times = Vec::new();
        let mut values = Vec::new();
        for sample in self.samples.iter().skip(start) {
            times.push(sample.t);
            values.push(sample.values.get(channel).copied().unwrap_or(0.0));
        }
        (times, values)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimation_keeps_buffer_within_capacity() {
        let mut h = History::new();
        h.update_decimation(1e-7);
        for i in 0..50_000 {
            h.record(i as f64 * 1e-7, vec![i as f64]);
        }
        assert!(h.len() <= MAX_HISTORY);
    }

    #[test]
    fn times_are_monotone_increasing() {
        let mut h = History::new();
        h.update_decimation(1e-3);
        for i in 0..20 {
            h.record(i as f64 * 1e-3, vec![0.0]);
        }
        let (times, _) = h.get_channel(0, 100);
        for w in times.windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
