//! Energy integration from sampled power.
//!
//! Totals accumulate in watt-seconds internally and are exposed as
//! whole watt-hours, so sub-hour residue carries across readouts
//! instead of being truncated away each cycle.

use std::time::Instant;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// One monotonically growing energy total driven by power samples.
#[derive(Debug, Default)]
pub struct EnergyAccumulator {
    total_watt_seconds: f64,
    last_update: Option<Instant>,
}

impl EnergyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one power sample taken at `now`.
    ///
    /// An absent sample is ignored outright: the total and the
    /// integration clock both stay where they are, and the next present
    /// sample integrates its own magnitude from the last armed instant.
    /// The first present sample ever only arms the clock.
    pub fn update(&mut self, magnitude_watts: Option<i64>, now: Instant) {
        let Some(power) = magnitude_watts else {
            return;
        };
        if let Some(last) = self.last_update {
            let elapsed = now.saturating_duration_since(last).as_secs_f64();
            self.total_watt_seconds += power as f64 * elapsed;
        }
        self.last_update = Some(now);
    }

    pub fn watt_seconds(&self) -> f64 {
        self.total_watt_seconds
    }

    /// Total as whole watt-hours, rounding down.
    pub fn watt_hours(&self) -> u64 {
        (self.total_watt_seconds / SECONDS_PER_HOUR) as u64
    }
}

/// A charge/discharge accumulator pair fed by one signed power reading.
///
/// Positive power counts toward discharge, negative toward charge; the
/// inactive side of the pair integrates zero for the interval so both
/// clocks advance together.
#[derive(Debug, Default)]
pub struct EnergyPair {
    pub charge: EnergyAccumulator,
    pub discharge: EnergyAccumulator,
}

impl EnergyPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits one signed power sample across the pair. An absent sample
    /// leaves both sides untouched.
    pub fn update(&mut self, power_watts: Option<i64>, now: Instant) {
        match power_watts {
            None => {
                self.charge.update(None, now);
                self.discharge.update(None, now);
            }
            Some(p) if p > 0 => {
                self.charge.update(Some(0), now);
                self.discharge.update(Some(p), now);
            }
            Some(p) => {
                self.charge.update(Some(-p), now);
                self.discharge.update(Some(0), now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_sample_only_arms_the_clock() {
        let t0 = Instant::now();
        let mut acc = EnergyAccumulator::new();
        acc.update(Some(1000), t0);
        assert_eq!(acc.watt_seconds(), 0.0);
    }

    #[test]
    fn integrates_power_over_elapsed_time() {
        let t0 = Instant::now();
        let mut acc = EnergyAccumulator::new();
        acc.update(Some(500), t0);
        acc.update(Some(500), t0 + Duration::from_secs(10));
        assert_eq!(acc.watt_seconds(), 5000.0);

        // 3600 more seconds at 500 W pushes it past one watt-hour.
        acc.update(Some(500), t0 + Duration::from_secs(3610));
        assert_eq!(acc.watt_hours(), 501);
    }

    #[test]
    fn absent_sample_leaves_total_and_clock_alone() {
        let t1 = Instant::now();
        let mut acc = EnergyAccumulator::new();
        acc.update(Some(0), t1);
        // The absent sample neither adds energy nor moves the clock off
        // t1; the next present sample integrates from t1.
        acc.update(None, t1 + Duration::from_secs(4));
        assert_eq!(acc.watt_seconds(), 0.0);
        acc.update(Some(500), t1 + Duration::from_secs(10));
        assert_eq!(acc.watt_seconds(), 5000.0);
    }

    #[test]
    fn zero_elapsed_update_is_idempotent() {
        let t0 = Instant::now();
        let mut acc = EnergyAccumulator::new();
        acc.update(Some(500), t0);
        let t1 = t0 + Duration::from_secs(10);
        acc.update(Some(500), t1);
        acc.update(Some(800), t1);
        assert_eq!(acc.watt_seconds(), 5000.0);
    }

    #[test]
    fn pair_splits_by_sign_and_keeps_both_armed() {
        let t0 = Instant::now();
        let mut pair = EnergyPair::new();
        pair.update(Some(-1000), t0);
        pair.update(Some(-1000), t0 + Duration::from_secs(10));
        assert_eq!(pair.charge.watt_seconds(), 10_000.0);
        assert_eq!(pair.discharge.watt_seconds(), 0.0);

        // Sign flip: the discharge side was armed the whole time, so it
        // integrates immediately.
        pair.update(Some(2000), t0 + Duration::from_secs(20));
        assert_eq!(pair.discharge.watt_seconds(), 20_000.0);
        assert_eq!(pair.charge.watt_seconds(), 10_000.0);
    }

    #[test]
    fn pair_ignores_absent_sample() {
        let t1 = Instant::now();
        let mut pair = EnergyPair::new();
        pair.update(Some(0), t1);
        pair.update(None, t1 + Duration::from_secs(4));
        pair.update(Some(500), t1 + Duration::from_secs(10));
        assert_eq!(pair.discharge.watt_seconds(), 5000.0);
        assert_eq!(pair.charge.watt_seconds(), 0.0);
    }
}
