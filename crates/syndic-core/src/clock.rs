//! Injectable time source.
//!
//! Every "now"-dependent decision (eligibility, week bucket, freshness year,
//! ledger dates) reads the clock through this trait so tests can pin it.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC on the given date.
    pub fn on(date: NaiveDate) -> Self {
        FixedClock(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Whole 7-day periods elapsed since 1970-01-01.
pub fn week_number(date: NaiveDate) -> i64 {
    let days = (date - NaiveDate::default()).num_days();
    days.div_euclid(7)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn epoch_is_week_zero() {
        assert_eq!(week_number(d(1970, 1, 1)), 0);
        assert_eq!(week_number(d(1970, 1, 7)), 0);
        assert_eq!(week_number(d(1970, 1, 8)), 1);
    }

    #[test]
    fn consecutive_weeks_differ_by_one() {
        let a = week_number(d(2026, 3, 5));
        let b = week_number(d(2026, 3, 12));
        assert_eq!(b - a, 1);
    }

    #[test]
    fn fixed_clock_reports_its_date() {
        let clock = FixedClock::on(d(2026, 10, 18));
        assert_eq!(clock.today(), d(2026, 10, 18));
        assert_eq!(clock.current_year(), 2026);
    }
}
