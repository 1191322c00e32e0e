use crate::models::WeightRecord;
use chrono::NaiveDate;

/// Read access to a patient's recorded weights
///
/// When several records share a date, implementations return the one
/// inserted last (highest record id).
pub trait WeightHistoryQuery {
    /// Most recent record dated on or before `date`
    fn latest_at_or_before(&self, patient_id: i64, date: NaiveDate) -> Option<WeightRecord>;

    /// Record dated exactly `date`
    fn exactly_at(&self, patient_id: i64, date: NaiveDate) -> Option<WeightRecord>;
}

/// In-memory weight history, kept sorted by `(date, id)` ascending
#[derive(Debug, Clone, Default)]
pub struct WeightHistory {
    records: Vec<WeightRecord>,
}

impl WeightHistory {
    pub fn new(records: impl IntoIterator<Item = WeightRecord>) -> Self {
        let mut records: Vec<WeightRecord> = records.into_iter().collect();
        records.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Latest record for a patient, by date then insertion order
    pub fn current(&self, patient_id: i64) -> Option<WeightRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.patient_id == patient_id)
            .copied()
    }

    /// Records for a patient, newest first
    pub fn descending(&self, patient_id: i64) -> Vec<WeightRecord> {
        self.records
            .iter()
            .rev()
            .filter(|r| r.patient_id == patient_id)
            .copied()
            .collect()
    }
}

impl WeightHistoryQuery for WeightHistory {
    fn latest_at_or_before(&self, patient_id: i64, date: NaiveDate) -> Option<WeightRecord> {
        // Records are sorted, so everything up to the partition point is <= date
        let end = self.records.partition_point(|r| r.date <= date);
        self.records[..end]
            .iter()
            .rev()
            .find(|r| r.patient_id == patient_id)
            .copied()
    }

    fn exactly_at(&self, patient_id: i64, date: NaiveDate) -> Option<WeightRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.patient_id == patient_id && r.date == date)
            .copied()
    }
}

impl<T: WeightHistoryQuery + ?Sized> WeightHistoryQuery for &T {
    fn latest_at_or_before(&self, patient_id: i64, date: NaiveDate) -> Option<WeightRecord> {
        (**self).latest_at_or_before(patient_id, date)
    }

    fn exactly_at(&self, patient_id: i64, date: NaiveDate) -> Option<WeightRecord> {
        (**self).exactly_at(patient_id, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_history() -> WeightHistory {
        WeightHistory::new(vec![
            WeightRecord::new(3, 1, date(2023, 3, 1), 148.0),
            WeightRecord::new(1, 1, date(2023, 1, 1), 150.0),
            WeightRecord::new(2, 2, date(2023, 2, 1), 200.0),
            WeightRecord::new(4, 1, date(2023, 5, 1), 145.0),
        ])
    }

    #[test]
    fn test_latest_at_or_before_picks_closest_earlier() {
        let history = sample_history();

        let found = history.latest_at_or_before(1, date(2023, 4, 15)).unwrap();
        assert_eq!(found.id, 3);

        let exact = history.latest_at_or_before(1, date(2023, 3, 1)).unwrap();
        assert_eq!(exact.id, 3);
    }

    #[test]
    fn test_latest_at_or_before_ignores_other_patients() {
        let history = sample_history();

        let found = history.latest_at_or_before(1, date(2023, 2, 15)).unwrap();
        assert_eq!(found.id, 1);
        assert!(history.latest_at_or_before(2, date(2023, 1, 31)).is_none());
    }

    #[test]
    fn test_exactly_at() {
        let history = sample_history();

        assert_eq!(history.exactly_at(1, date(2023, 5, 1)).unwrap().weight_lb, 145.0);
        assert!(history.exactly_at(1, date(2023, 5, 2)).is_none());
        assert!(history.exactly_at(2, date(2023, 5, 1)).is_none());
    }

    #[test]
    fn test_duplicate_dates_latest_inserted_wins() {
        let history = WeightHistory::new(vec![
            WeightRecord::new(7, 1, date(2023, 1, 1), 151.0),
            WeightRecord::new(5, 1, date(2023, 1, 1), 150.0),
        ]);

        assert_eq!(history.exactly_at(1, date(2023, 1, 1)).unwrap().id, 7);
        assert_eq!(history.latest_at_or_before(1, date(2023, 6, 1)).unwrap().id, 7);
        assert_eq!(history.current(1).unwrap().id, 7);
    }

    #[test]
    fn test_current_and_descending() {
        let history = sample_history();

        assert_eq!(history.current(1).unwrap().id, 4);
        let ids: Vec<i64> = history.descending(1).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 3, 1]);
        assert!(history.current(99).is_none());
    }
}
