//! Rental-window date arithmetic. All booking dates are calendar dates in
//! the city's service area; cutoffs are measured against midnight UTC of the
//! relevant date.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Number of billable days for a rental window. Delivery and return on the
/// same day still bills one day.
pub fn rental_days(delivery_date: NaiveDate, return_date: NaiveDate) -> i64 {
    (return_date - delivery_date).num_days().max(1)
}

/// Whole days from `now` until midnight UTC of `date`. Negative when the
/// date is already past.
pub fn days_until(now: DateTime<Utc>, date: NaiveDate) -> i64 {
    (midnight_utc(date) - now).num_days()
}

/// Whole hours from `now` until midnight UTC of `date`.
pub fn hours_until(now: DateTime<Utc>, date: NaiveDate) -> i64 {
    (midnight_utc(date) - now).num_hours()
}

/// Midnight UTC at the start of `date`.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Inclusive range overlap: two windows conflict when each starts no later
/// than the other ends. Touching endpoints count as overlap because a unit
/// returned on a given day cannot ship out again the same day.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn same_day_rental_bills_one_day() {
        assert_eq!(rental_days(d("2025-06-01"), d("2025-06-01")), 1);
        assert_eq!(rental_days(d("2025-06-01"), d("2025-06-02")), 1);
        assert_eq!(rental_days(d("2025-06-01"), d("2025-06-08")), 7);
    }

    #[test]
    fn days_until_counts_whole_days_to_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(days_until(now, d("2025-06-02")), 0); // 12 hours out
        assert_eq!(days_until(now, d("2025-06-03")), 1);
        assert_eq!(days_until(now, d("2025-08-01")), 60);
        assert_eq!(days_until(now, d("2025-05-31")), -1);
    }

    #[test]
    fn hours_until_is_exact_at_boundaries() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(hours_until(now, d("2025-06-03")), 48);
        let later = Utc.with_ymd_and_hms(2025, 6, 1, 0, 1, 0).unwrap();
        assert_eq!(hours_until(later, d("2025-06-03")), 47);
    }

    #[test]
    fn touching_windows_overlap() {
        // back-to-back: return day equals next delivery day
        assert!(ranges_overlap(
            d("2025-06-01"),
            d("2025-06-05"),
            d("2025-06-05"),
            d("2025-06-10")
        ));
        assert!(ranges_overlap(
            d("2025-06-03"),
            d("2025-06-04"),
            d("2025-06-01"),
            d("2025-06-10")
        ));
        assert!(!ranges_overlap(
            d("2025-06-01"),
            d("2025-06-04"),
            d("2025-06-05"),
            d("2025-06-10")
        ));
    }
}
