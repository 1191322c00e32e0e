use crate::core::calendar::{months_after, months_before};
use crate::core::history::WeightHistoryQuery;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when computing a weight change
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightChangeError {
    #[error("Interval must be a positive number of months, got {0}")]
    InvalidInterval(u32),

    #[error("Current weight must be a positive number of pounds, got {0}")]
    InvalidCurrentWeight(f64),

    #[error("Historical weight of {weight_lb} lb on {date} cannot be used as a baseline")]
    InvalidHistoricalWeight { date: NaiveDate, weight_lb: f64 },

    #[error("{months} months from {date} is outside the supported date range")]
    DateOutOfRange { date: NaiveDate, months: u32 },
}

/// Explains a result that did not come from a single recorded baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntervalNote {
    /// Baseline estimated as the mean of the records one month either side
    Interpolated {
        before: NaiveDate,
        after: NaiveDate,
        estimate_lb: f64,
    },
    /// Nothing to compare against; the change is reported as 0.0
    NoData {
        interval_months: u32,
        reference_date: NaiveDate,
    },
}

impl fmt::Display for IntervalNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalNote::Interpolated { estimate_lb, .. } => write!(
                f,
                "No weight found for given interval. Average of weights from surrounding months: {:.2}",
                estimate_lb
            ),
            IntervalNote::NoData {
                interval_months,
                reference_date,
            } => write!(
                f,
                "No weight found for given interval {} month{} and no surrounding weights available to calculate average at {}.",
                interval_months,
                if *interval_months > 1 { "s" } else { "" },
                reference_date
            ),
        }
    }
}

/// Percentage weight change over one interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalChange {
    #[serde(rename = "intervalMonths")]
    pub interval_months: u32,
    #[serde(rename = "targetDate")]
    pub target_date: NaiveDate,
    #[serde(rename = "percentChange")]
    pub percent_change: f64,
    /// Weight the change was measured against, absent when no data was found
    #[serde(rename = "baselineLb")]
    pub baseline_lb: Option<f64>,
    pub note: Option<IntervalNote>,
}

/// Compute the percentage weight change over `interval_months`
///
/// The baseline is, in order of preference:
/// 1. the latest record dated on or before `reference_date - interval_months`;
/// 2. the mean of the records dated exactly one month before and one month
///    after that target date, when both exist;
/// 3. nothing, in which case the change is `0.0` with a [`IntervalNote::NoData`] note.
///
/// Month arithmetic clamps to the last day of short months. A baseline that
/// is zero, negative or not finite is reported as
/// [`WeightChangeError::InvalidHistoricalWeight`].
pub fn compute_interval_change<Q>(
    patient_id: i64,
    interval_months: u32,
    current_weight_lb: f64,
    reference_date: NaiveDate,
    history: &Q,
) -> Result<IntervalChange, WeightChangeError>
where
    Q: WeightHistoryQuery + ?Sized,
{
    if interval_months == 0 {
        return Err(WeightChangeError::InvalidInterval(interval_months));
    }
    if !current_weight_lb.is_finite() || current_weight_lb <= 0.0 {
        return Err(WeightChangeError::InvalidCurrentWeight(current_weight_lb));
    }

    let target_date = months_before(reference_date, interval_months).ok_or(
        WeightChangeError::DateOutOfRange {
            date: reference_date,
            months: interval_months,
        },
    )?;

    if let Some(matched) = history.latest_at_or_before(patient_id, target_date) {
        let baseline = valid_baseline(matched.date, matched.weight_lb)?;
        return Ok(IntervalChange {
            interval_months,
            target_date,
            percent_change: percent_change(current_weight_lb, baseline, matched.date)?,
            baseline_lb: Some(baseline),
            note: None,
        });
    }

    let before = months_before(target_date, 1);
    let after = months_after(target_date, 1);

    let anchors = match (before, after) {
        (Some(before), Some(after)) => history
            .exactly_at(patient_id, before)
            .zip(history.exactly_at(patient_id, after)),
        _ => None,
    };

    match anchors {
        Some((before, after)) => {
            valid_baseline(before.date, before.weight_lb)?;
            valid_baseline(after.date, after.weight_lb)?;
            let estimate = valid_baseline(target_date, (before.weight_lb + after.weight_lb) / 2.0)?;

            tracing::debug!(
                "Interpolated {}-month baseline for patient {}: {:.2} lb ({} / {})",
                interval_months,
                patient_id,
                estimate,
                before.date,
                after.date
            );

            Ok(IntervalChange {
                interval_months,
                target_date,
                percent_change: percent_change(current_weight_lb, estimate, target_date)?,
                baseline_lb: Some(estimate),
                note: Some(IntervalNote::Interpolated {
                    before: before.date,
                    after: after.date,
                    estimate_lb: estimate,
                }),
            })
        }
        None => Ok(IntervalChange {
            interval_months,
            target_date,
            percent_change: 0.0,
            baseline_lb: None,
            note: Some(IntervalNote::NoData {
                interval_months,
                reference_date,
            }),
        }),
    }
}

/// A baseline small enough to overflow the ratio is rejected like a zero one
#[inline]
fn percent_change(current: f64, baseline: f64, date: NaiveDate) -> Result<f64, WeightChangeError> {
    let percent = (current - baseline) / baseline * 100.0;
    if percent.is_finite() {
        Ok(percent)
    } else {
        Err(WeightChangeError::InvalidHistoricalWeight {
            date,
            weight_lb: baseline,
        })
    }
}

#[inline]
fn valid_baseline(date: NaiveDate, weight_lb: f64) -> Result<f64, WeightChangeError> {
    if weight_lb.is_finite() && weight_lb > 0.0 {
        Ok(weight_lb)
    } else {
        Err(WeightChangeError::InvalidHistoricalWeight { date, weight_lb })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::WeightHistory;
    use crate::models::WeightRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(records: &[(i32, u32, u32, f64)]) -> WeightHistory {
        WeightHistory::new(
            records
                .iter()
                .enumerate()
                .map(|(i, &(y, m, d, w))| WeightRecord::new(i as i64 + 1, 1, date(y, m, d), w)),
        )
    }

    #[test]
    fn test_exact_match_six_months() {
        let h = history(&[(2023, 1, 15, 150.0), (2023, 7, 15, 140.0)]);

        let change = compute_interval_change(1, 6, 140.0, date(2023, 7, 15), &h).unwrap();

        assert_eq!(change.target_date, date(2023, 1, 15));
        assert_eq!(change.baseline_lb, Some(150.0));
        assert!(change.note.is_none());
        assert!((change.percent_change - (-6.666_666_666_666_667)).abs() < 1e-9);
    }

    #[test]
    fn test_earlier_record_used_when_target_missing() {
        let h = history(&[(2022, 12, 1, 160.0), (2023, 7, 15, 152.0)]);

        let change = compute_interval_change(1, 6, 152.0, date(2023, 7, 15), &h).unwrap();

        assert_eq!(change.baseline_lb, Some(160.0));
        assert!((change.percent_change - (-5.0)).abs() < 1e-9);
    }

    /// Query whose at-or-before lookup never matches, leaving only the anchors
    struct AnchorsOnly(WeightHistory);

    impl WeightHistoryQuery for AnchorsOnly {
        fn latest_at_or_before(&self, _patient_id: i64, _date: NaiveDate) -> Option<WeightRecord> {
            None
        }

        fn exactly_at(&self, patient_id: i64, date: NaiveDate) -> Option<WeightRecord> {
            self.0.exactly_at(patient_id, date)
        }
    }

    #[test]
    fn test_interpolates_from_surrounding_months() {
        // Reference 2023-07-10, 3 months -> target 2023-04-10
        let h = AnchorsOnly(history(&[(2023, 3, 10, 100.0), (2023, 5, 10, 120.0)]));

        let change = compute_interval_change(1, 3, 121.0, date(2023, 7, 10), &h).unwrap();

        assert_eq!(change.target_date, date(2023, 4, 10));
        assert_eq!(change.baseline_lb, Some(110.0));
        assert!((change.percent_change - 10.0).abs() < 1e-9);
        assert_eq!(
            change.note,
            Some(IntervalNote::Interpolated {
                before: date(2023, 3, 10),
                after: date(2023, 5, 10),
                estimate_lb: 110.0,
            })
        );
    }

    #[test]
    fn test_single_anchor_is_not_enough() {
        let h = AnchorsOnly(history(&[(2023, 5, 10, 120.0)]));

        let change = compute_interval_change(1, 3, 121.0, date(2023, 7, 10), &h).unwrap();

        assert_eq!(change.percent_change, 0.0);
        assert!(matches!(change.note, Some(IntervalNote::NoData { .. })));
    }

    #[test]
    fn test_zero_estimate_is_reported() {
        let h = AnchorsOnly(history(&[(2023, 3, 10, 0.0), (2023, 5, 10, 0.0)]));

        let err = compute_interval_change(1, 3, 121.0, date(2023, 7, 10), &h).unwrap_err();

        assert!(matches!(err, WeightChangeError::InvalidHistoricalWeight { .. }));
    }

    #[test]
    fn test_no_data_returns_zero_with_note() {
        let h = history(&[(2023, 7, 15, 140.0)]);

        let change = compute_interval_change(1, 12, 140.0, date(2023, 7, 15), &h).unwrap();

        assert_eq!(change.percent_change, 0.0);
        assert_eq!(change.baseline_lb, None);
        assert_eq!(
            change.note,
            Some(IntervalNote::NoData {
                interval_months: 12,
                reference_date: date(2023, 7, 15),
            })
        );
    }

    #[test]
    fn test_zero_baseline_is_reported() {
        let h = history(&[(2023, 1, 15, 0.0), (2023, 7, 15, 140.0)]);

        let err = compute_interval_change(1, 6, 140.0, date(2023, 7, 15), &h).unwrap_err();

        assert_eq!(
            err,
            WeightChangeError::InvalidHistoricalWeight {
                date: date(2023, 1, 15),
                weight_lb: 0.0,
            }
        );
    }

    #[test]
    fn test_overflowing_baseline_is_reported() {
        let h = history(&[(2023, 1, 15, 1e-300), (2023, 7, 15, 140.0)]);

        let err = compute_interval_change(1, 6, 1e10, date(2023, 7, 15), &h).unwrap_err();

        assert_eq!(
            err,
            WeightChangeError::InvalidHistoricalWeight {
                date: date(2023, 1, 15),
                weight_lb: 1e-300,
            }
        );

        let anchors = AnchorsOnly(history(&[(2023, 5, 15, 1e-300), (2023, 7, 15, 1e-300)]));
        let result = compute_interval_change(1, 1, 1e10, date(2023, 7, 15), &anchors);

        assert!(
            matches!(result, Err(WeightChangeError::InvalidHistoricalWeight { date: d, .. }) if d == date(2023, 6, 15)),
            "Expected the interpolated baseline to be rejected, got {:?}",
            result
        );
    }

    #[test]
    fn test_rejects_zero_interval_and_bad_current_weight() {
        let h = WeightHistory::default();

        assert_eq!(
            compute_interval_change(1, 0, 140.0, date(2023, 7, 15), &h).unwrap_err(),
            WeightChangeError::InvalidInterval(0)
        );
        assert!(matches!(
            compute_interval_change(1, 1, 0.0, date(2023, 7, 15), &h),
            Err(WeightChangeError::InvalidCurrentWeight(_))
        ));
        assert!(matches!(
            compute_interval_change(1, 1, f64::NAN, date(2023, 7, 15), &h),
            Err(WeightChangeError::InvalidCurrentWeight(_))
        ));
    }

    #[test]
    fn test_note_messages() {
        let interpolated = IntervalNote::Interpolated {
            before: date(2023, 3, 10),
            after: date(2023, 5, 10),
            estimate_lb: 110.0,
        };
        assert!(interpolated.to_string().ends_with("110.00"));

        let one = IntervalNote::NoData {
            interval_months: 1,
            reference_date: date(2023, 7, 15),
        };
        assert!(one.to_string().contains("interval 1 month and"));

        let twelve = IntervalNote::NoData {
            interval_months: 12,
            reference_date: date(2023, 7, 15),
        };
        assert!(twelve.to_string().contains("interval 12 months and"));
        assert!(twelve.to_string().contains("2023-07-15"));
    }
}
