//! Component A: time arithmetic.
//!
//! Pure, stateless decomposition of a shift span into the canonical
//! `{gross, lunch, normal, ot, paid}` hour buckets. No state, no I/O.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-shift hour breakdown, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourBreakdown {
    pub gross: f64,
    pub lunch: f64,
    pub normal: f64,
    pub ot: f64,
    pub paid: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Gross hours between two datetimes. `end` must already be rolled to the
/// next day for overnight shifts (the slot builder's job, not this one's).
pub fn span_hours(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let minutes = (end - start).num_minutes();
    round2(minutes as f64 / 60.0)
}

/// Exactly one unpaid meal break per shift, regardless of length, once gross
/// exceeds 6 hours.
pub fn lunch_hours(gross: f64) -> f64 {
    if gross > 6.0 {
        1.0
    } else {
        0.0
    }
}

pub fn split_normal_ot(gross: f64) -> (f64, f64) {
    let lunch = lunch_hours(gross);
    let normal = (gross.min(9.0) - lunch).max(0.0);
    let ot = (gross - 9.0).max(0.0);
    (round2(normal), round2(ot))
}

/// Complete breakdown of shift hours. The primary entry point for any shift
/// hour calculation; everything else (weekly caps, OT aggregates) sums these.
pub fn split_shift_hours(start: NaiveDateTime, end: NaiveDateTime) -> HourBreakdown {
    let gross = span_hours(start, end);
    let lunch = lunch_hours(gross);
    let (normal, ot) = split_normal_ot(gross);
    HourBreakdown {
        gross,
        lunch,
        normal,
        ot,
        paid: gross,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn baseline_nine_to_six() {
        let hrs = split_shift_hours(dt(2025, 12, 1, 9, 0), dt(2025, 12, 1, 18, 0));
        assert_eq!(hrs.gross, 9.0);
        assert_eq!(hrs.lunch, 1.0);
        assert_eq!(hrs.normal, 8.0);
        assert_eq!(hrs.ot, 0.0);
        assert_eq!(hrs.paid, 9.0);
    }

    #[test]
    fn six_hours_exactly_no_lunch() {
        let hrs = split_shift_hours(dt(2025, 12, 1, 9, 0), dt(2025, 12, 1, 15, 0));
        assert_eq!(hrs.gross, 6.0);
        assert_eq!(hrs.lunch, 0.0);
        assert_eq!(hrs.normal, 6.0);
    }

    #[test]
    fn six_hours_one_minute_has_lunch() {
        let hrs = split_shift_hours(dt(2025, 12, 1, 9, 0), dt(2025, 12, 1, 15, 1));
        assert_eq!(hrs.lunch, 1.0);
    }

    #[test]
    fn overnight_shift_19_to_07() {
        let hrs = split_shift_hours(dt(2025, 12, 1, 19, 0), dt(2025, 12, 2, 7, 0));
        assert_eq!(hrs.gross, 12.0);
        assert_eq!(hrs.lunch, 1.0);
        assert_eq!(hrs.normal, 8.0);
        assert_eq!(hrs.ot, 3.0);
    }

    #[test]
    fn eleven_hour_day() {
        let hrs = split_shift_hours(dt(2025, 12, 1, 9, 0), dt(2025, 12, 1, 20, 0));
        assert_eq!(hrs.normal, 8.0);
        assert_eq!(hrs.ot, 2.0);
    }

    #[test]
    fn short_shift_no_lunch_no_ot() {
        let hrs = split_shift_hours(dt(2025, 12, 1, 10, 0), dt(2025, 12, 1, 14, 0));
        assert_eq!(hrs.gross, 4.0);
        assert_eq!(hrs.lunch, 0.0);
        assert_eq!(hrs.normal, 4.0);
        assert_eq!(hrs.ot, 0.0);
    }
}
