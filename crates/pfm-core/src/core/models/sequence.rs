use thiserror::Error;
use tracing::debug;

/// Tolerance for deciding that an accumulated fraction has completed a full sample period.
const PERIOD_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum SequenceError {
    #[error("Stimulus sequence contains no samples")]
    Empty,
    #[error("Invalid stimulus sample period: {0}. Period must be positive and finite")]
    InvalidPeriod(f64),
}

/// One of the two drive states of a binary stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StimulusLevel {
    High,
    Low,
}

impl StimulusLevel {
    /// Maps the canonical `+1`/`-1` encoding; every other value is rejected.
    pub fn from_sample(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::High),
            -1 => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_sample(self) -> i8 {
        match self {
            Self::High => 1,
            Self::Low => -1,
        }
    }
}

/// A binary (maximum-length) stimulus sequence sampled every `period` seconds.
///
/// The sequence is advanced by elapsed time: the fractional position inside the current
/// sample interval accumulates `dt / period`, and each full period crossed moves to the
/// next sample, wrapping to the start at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusSequence {
    levels: Vec<StimulusLevel>,
    period: f64,
    index: usize,
    fraction: f64,
}

impl StimulusSequence {
    pub fn new(levels: Vec<StimulusLevel>, period: f64) -> Result<Self, SequenceError> {
        if levels.is_empty() {
            return Err(SequenceError::Empty);
        }
        if !(period.is_finite() && period > 0.0) {
            return Err(SequenceError::InvalidPeriod(period));
        }
        Ok(Self {
            levels,
            period,
            index: 0,
            fraction: 0.0,
        })
    }

    #[inline]
    pub fn value(&self) -> StimulusLevel {
        self.levels[self.index]
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    #[inline]
    pub fn period(&self) -> f64 {
        self.period
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[StimulusLevel] {
        &self.levels
    }

    /// Advances by `dt` seconds and returns how many samples were crossed.
    pub fn advance_by(&mut self, dt: f64) -> usize {
        self.fraction += dt / self.period;
        let mut crossed = 0;
        while self.fraction >= 1.0 - PERIOD_EPSILON {
            self.fraction = (self.fraction - 1.0).max(0.0);
            self.index += 1;
            crossed += 1;
            if self.index == self.levels.len() {
                self.index = 0;
                debug!(length = self.levels.len(), "Stimulus sequence wrapped to start.");
            }
        }
        crossed
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.fraction = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StimulusLevel::{High, Low};

    fn sequence() -> StimulusSequence {
        StimulusSequence::new(vec![High, Low, Low, High], 1e-3).unwrap()
    }

    #[test]
    fn stimulus_level_maps_only_plus_and_minus_one() {
        assert_eq!(StimulusLevel::from_sample(1), Some(High));
        assert_eq!(StimulusLevel::from_sample(-1), Some(Low));
        assert_eq!(StimulusLevel::from_sample(0), None);
        assert_eq!(StimulusLevel::from_sample(2), None);
        assert_eq!(High.as_sample(), 1);
        assert_eq!(Low.as_sample(), -1);
    }

    #[test]
    fn new_rejects_empty_sequence_and_bad_period() {
        assert_eq!(StimulusSequence::new(vec![], 1e-3), Err(SequenceError::Empty));
        assert_eq!(
            StimulusSequence::new(vec![High], 0.0),
            Err(SequenceError::InvalidPeriod(0.0))
        );
        assert!(StimulusSequence::new(vec![High], f64::NAN).is_err());
    }

    #[test]
    fn advancing_one_full_period_moves_to_next_sample_and_resets_fraction() {
        let mut seq = sequence();
        for expected in 1..4 {
            assert_eq!(seq.advance_by(1e-3), 1);
            assert_eq!(seq.index(), expected);
            assert_eq!(seq.fraction(), 0.0);
        }
    }

    #[test]
    fn partial_advances_accumulate_into_fraction() {
        let mut seq = sequence();
        assert_eq!(seq.advance_by(0.25e-3), 0);
        assert_eq!(seq.index(), 0);
        assert!((seq.fraction() - 0.25).abs() < 1e-12);
        for _ in 0..3 {
            seq.advance_by(0.25e-3);
        }
        assert_eq!(seq.index(), 1);
        assert!(seq.fraction() < 1e-9);
        assert_eq!(seq.value(), Low);
    }

    #[test]
    fn many_small_steps_cross_exactly_one_sample_per_period() {
        let mut seq = sequence();
        for _ in 0..100 {
            seq.advance_by(1e-5);
        }
        assert_eq!(seq.index(), 1);
    }

    #[test]
    fn sequence_wraps_to_start_after_last_sample() {
        let mut seq = sequence();
        assert_eq!(seq.advance_by(4e-3), 4);
        assert_eq!(seq.index(), 0);
        assert_eq!(seq.value(), High);
    }

    #[test]
    fn reset_returns_to_first_sample() {
        let mut seq = sequence();
        seq.advance_by(2.5e-3);
        seq.reset();
        assert_eq!(seq.index(), 0);
        assert_eq!(seq.fraction(), 0.0);
    }
}
