use crate::core::history::WeightHistoryQuery;
use crate::core::weight_change::{compute_interval_change, IntervalChange, WeightChangeError};
use crate::models::{WeightCheck, WeightRecord};
use chrono::{DateTime, Utc};

/// Clinically standard look-back intervals, in months
pub const STANDARD_INTERVALS: [u32; 4] = [1, 3, 6, 12];

/// Result of one interval within a weight check
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalOutcome {
    pub interval_months: u32,
    pub result: Result<IntervalChange, WeightChangeError>,
}

impl IntervalOutcome {
    pub fn percent_change(&self) -> Option<f64> {
        self.result.as_ref().ok().map(|c| c.percent_change)
    }
}

/// Result of checking a patient's weight across all configured intervals
#[derive(Debug, Clone, PartialEq)]
pub struct WeightCheckResult {
    pub patient_id: i64,
    pub current: WeightRecord,
    pub outcomes: Vec<IntervalOutcome>,
}

impl WeightCheckResult {
    /// Percent change for an interval, if it was computed and succeeded
    pub fn percent_for(&self, interval_months: u32) -> Option<f64> {
        self.outcomes
            .iter()
            .find(|o| o.interval_months == interval_months)
            .and_then(IntervalOutcome::percent_change)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// Summary row for persistence
    pub fn to_summary(&self, checked_at: DateTime<Utc>) -> WeightCheck {
        WeightCheck {
            patient_id: self.patient_id,
            current_weight_lb: self.current.weight_lb,
            one_month: self.percent_for(1),
            three_month: self.percent_for(3),
            six_month: self.percent_for(6),
            twelve_month: self.percent_for(12),
            checked_at,
        }
    }
}

/// Runs the interval weight change calculation for each configured interval
///
/// Intervals are computed independently: an error in one never affects the
/// others.
#[derive(Debug, Clone)]
pub struct WeightChecker {
    intervals: Vec<u32>,
}

impl WeightChecker {
    pub fn new(intervals: Vec<u32>) -> Self {
        Self { intervals }
    }

    pub fn with_standard_intervals() -> Self {
        Self::new(STANDARD_INTERVALS.to_vec())
    }

    pub fn intervals(&self) -> &[u32] {
        &self.intervals
    }

    /// Check a patient's weight against their history
    ///
    /// # Arguments
    /// * `current` - The weight to compare; its date is the reference date
    /// * `history` - The patient's recorded weights
    pub fn check<Q>(&self, current: &WeightRecord, history: &Q) -> WeightCheckResult
    where
        Q: WeightHistoryQuery + ?Sized,
    {
        let outcomes = self
            .intervals
            .iter()
            .map(|&interval_months| IntervalOutcome {
                interval_months,
                result: compute_interval_change(
                    current.patient_id,
                    interval_months,
                    current.weight_lb,
                    current.date,
                    history,
                ),
            })
            .collect();

        WeightCheckResult {
            patient_id: current.patient_id,
            current: *current,
            outcomes,
        }
    }
}

impl Default for WeightChecker {
    fn default() -> Self {
        Self::with_standard_intervals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::WeightHistory;
    use crate::core::weight_change::IntervalNote;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_checks_every_standard_interval() {
        let history = WeightHistory::new(vec![
            WeightRecord::new(1, 1, date(2022, 7, 15), 160.0),
            WeightRecord::new(2, 1, date(2023, 1, 15), 150.0),
            WeightRecord::new(3, 1, date(2023, 6, 15), 142.0),
            WeightRecord::new(4, 1, date(2023, 7, 15), 140.0),
        ]);
        let current = history.current(1).unwrap();

        let result = WeightChecker::default().check(&current, &history);

        assert_eq!(result.outcomes.len(), 4);
        assert_eq!(result.failures(), 0);
        assert!((result.percent_for(1).unwrap() - (140.0 - 142.0) / 142.0 * 100.0).abs() < 1e-9);
        // 3 months back (2023-04-15) falls to the January record
        assert!((result.percent_for(3).unwrap() - (-6.666_666_666_666_667)).abs() < 1e-9);
        assert!((result.percent_for(6).unwrap() - (-6.666_666_666_666_667)).abs() < 1e-9);
        assert!((result.percent_for(12).unwrap() - (-12.5)).abs() < 1e-9);
    }

    #[test]
    fn test_failed_interval_does_not_block_others() {
        let history = WeightHistory::new(vec![
            WeightRecord::new(1, 1, date(2023, 1, 15), 0.0),
            WeightRecord::new(2, 1, date(2023, 6, 15), 142.0),
            WeightRecord::new(3, 1, date(2023, 7, 15), 140.0),
        ]);
        let current = history.current(1).unwrap();

        let result = WeightChecker::default().check(&current, &history);

        assert!(result.percent_for(1).is_some());
        assert!(matches!(
            result.outcomes[2].result,
            Err(WeightChangeError::InvalidHistoricalWeight { .. })
        ));
        let twelve = result.outcomes[3].result.as_ref().unwrap();
        assert_eq!(twelve.percent_change, 0.0);
        assert!(matches!(twelve.note, Some(IntervalNote::NoData { .. })));
        assert_eq!(result.failures(), 2);
    }

    #[test]
    fn test_summary_maps_intervals_to_columns() {
        let history = WeightHistory::new(vec![
            WeightRecord::new(1, 9, date(2023, 1, 15), 150.0),
            WeightRecord::new(2, 9, date(2023, 7, 15), 140.0),
        ]);
        let current = history.current(9).unwrap();
        let checked_at = Utc::now();

        let summary = WeightChecker::default().check(&current, &history).to_summary(checked_at);

        assert_eq!(summary.patient_id, 9);
        assert_eq!(summary.current_weight_lb, 140.0);
        assert!((summary.one_month.unwrap() - (-6.666_666_666_666_667)).abs() < 1e-9);
        assert_eq!(summary.twelve_month, Some(0.0));
        assert_eq!(summary.checked_at, checked_at);
    }

    #[test]
    fn test_custom_intervals() {
        let checker = WeightChecker::new(vec![2]);
        let history = WeightHistory::new(vec![WeightRecord::new(1, 1, date(2023, 7, 15), 140.0)]);
        let current = history.current(1).unwrap();

        let result = checker.check(&current, &history);

        assert_eq!(checker.intervals(), &[2]);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.to_summary(Utc::now()).one_month, None);
    }
}
