//! GNSS time helpers: RTCM messages only carry truncated time
//! (time of week, time of day, truncated week counters), which we resolve
//! against a reference [Epoch] and normalize to GPST.
use hifitime::{Duration, Epoch, TimeScale};

use crate::constants::Constants;

/// Builds a GPST [Epoch] from week counter and seconds in week.
/// Seconds may overflow the week in either direction.
pub(crate) fn gpst(week: u32, tow: f64) -> Epoch {
    let mut week = week as i64;
    let mut tow = tow;
    while tow < 0.0 {
        tow += Constants::WEEK_SECONDS;
        week -= 1;
    }
    while tow >= Constants::WEEK_SECONDS {
        tow -= Constants::WEEK_SECONDS;
        week += 1;
    }
    let nanos = (tow * 1.0E9).round() as u64;
    Epoch::from_time_of_week(week.max(0) as u32, nanos, TimeScale::GPST)
}

/// Returns GPS week counter and seconds in week
pub(crate) fn gpst_week_tow(t: Epoch) -> (u32, f64) {
    let (week, nanos) = t.to_time_scale(TimeScale::GPST).to_time_of_week();
    (week, nanos as f64 / 1.0E9)
}

/// Builds a GPST [Epoch] from BDT week and seconds in week
pub(crate) fn bdt(week: u32, tow: f64) -> Epoch {
    gpst(
        week + Constants::BDT_WEEK_OFFSET,
        tow + Constants::BDT_GPST_OFFSET,
    )
}

/// Returns BDT week counter and seconds in week
pub(crate) fn bdt_week_tow(t: Epoch) -> (u32, f64) {
    let t = t - Duration::from_seconds(Constants::BDT_GPST_OFFSET);
    let (week, tow) = gpst_week_tow(t);
    (week.saturating_sub(Constants::BDT_WEEK_OFFSET), tow)
}

/// Builds a GPST [Epoch] from GST week and seconds in week
pub(crate) fn gst(week: u32, tow: f64) -> Epoch {
    gpst(week + Constants::GST_WEEK_OFFSET, tow)
}

/// Returns GST week counter and seconds in week
pub(crate) fn gst_week_tow(t: Epoch) -> (u32, f64) {
    let (week, tow) = gpst_week_tow(t);
    (week.saturating_sub(Constants::GST_WEEK_OFFSET), tow)
}

/// Resolves a truncated week counter (`bits` wide) against the reference week.
pub(crate) fn adjust_week(week: u32, bits: u32, reference_week: u32) -> u32 {
    let rollover = 1_i64 << bits;
    let (week, reference) = (week as i64, reference_week as i64);
    let n = (reference - week + rollover / 2).div_euclid(rollover);
    (week + n * rollover).max(0) as u32
}

/// Resolves the GPS week of a time of week, picking the week
/// that brings the epoch closest to the reference.
pub(crate) fn adjust_tow(reference: Epoch, tow: f64) -> Epoch {
    let (week, tow_ref) = gpst_week_tow(reference);
    let half_week = Constants::WEEK_SECONDS / 2.0;
    let tow = if tow < tow_ref - half_week {
        tow + Constants::WEEK_SECONDS
    } else if tow > tow_ref + half_week {
        tow - Constants::WEEK_SECONDS
    } else {
        tow
    };
    gpst(week, tow)
}

/// Resolves the day of a GLONASS time of day (UTC+3h),
/// picking the day that brings the epoch closest to the reference.
pub(crate) fn adjust_glonass_tod(reference: Epoch, tod: f64) -> Epoch {
    let (midnight, tod_ref) = glonass_day(reference);
    let half_day = Constants::DAY_SECONDS / 2.0;
    let tod = if tod < tod_ref - half_day {
        tod + Constants::DAY_SECONDS
    } else if tod > tod_ref + half_day {
        tod - Constants::DAY_SECONDS
    } else {
        tod
    };
    let utc = midnight + Duration::from_seconds(tod - Constants::GLONASS_UTC_OFFSET);
    utc.to_time_scale(TimeScale::GPST)
}

/// GLONASS time of day (UTC+3h) of this [Epoch]
pub(crate) fn glonass_tod(t: Epoch) -> f64 {
    glonass_day(t).1
}

/// GLONASS day of week (0: Sunday)
pub(crate) fn glonass_dow(t: Epoch) -> u32 {
    let moscow = t.to_time_scale(TimeScale::UTC)
        + Duration::from_seconds(Constants::GLONASS_UTC_OFFSET);
    // MJD 0 was a Wednesday
    let mjd = moscow.to_mjd_utc_days().floor() as i64;
    (mjd + 3).rem_euclid(7) as u32
}

/// Returns (UTC midnight of the GLONASS day, GLONASS time of day)
fn glonass_day(t: Epoch) -> (Epoch, f64) {
    let moscow = t.to_time_scale(TimeScale::UTC)
        + Duration::from_seconds(Constants::GLONASS_UTC_OFFSET);
    let (y, m, d, _, _, _, _) = moscow.to_gregorian_utc();
    let midnight = Epoch::from_gregorian_utc_at_midnight(y, m, d);
    (midnight, (moscow - midnight).to_seconds())
}

/// Seconds elapsed from `t0` to `t1`
pub(crate) fn seconds_between(t1: Epoch, t0: Epoch) -> f64 {
    (t1 - t0).to_seconds()
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn week_tow() {
        let t = gpst(2300, 345600.5);
        assert_eq!(gpst_week_tow(t), (2300, 345600.5));
        // overflowing seconds
        assert_eq!(gpst_week_tow(gpst(2300, -1.0)), (2299, 604799.0));
        assert_eq!(gpst_week_tow(gpst(2300, 604800.0)), (2301, 0.0));
    }

    #[test]
    fn other_timescales() {
        let t = gpst(2300, 100000.0);
        let (week, tow) = bdt_week_tow(t);
        assert_eq!((week, tow), (944, 99986.0));
        assert_eq!(bdt(week, tow), t);

        let (week, tow) = gst_week_tow(t);
        assert_eq!((week, tow), (1276, 100000.0));
        assert_eq!(gst(week, tow), t);
    }

    #[test]
    fn truncated_weeks() {
        for (week, bits, reference, expected) in [
            (252, 10, 2300, 2300),
            (251, 10, 2300, 2299),
            (0, 10, 2047, 2048),
            (1023, 10, 2048, 2047),
            (944, 13, 944, 944),
        ] {
            assert_eq!(adjust_week(week, bits, reference), expected);
        }
    }

    #[test]
    fn tow_ambiguity() {
        let reference = gpst(2300, 604790.0);
        // next week
        assert_eq!(gpst_week_tow(adjust_tow(reference, 10.0)), (2301, 10.0));
        let reference = gpst(2300, 10.0);
        // previous week
        assert_eq!(gpst_week_tow(adjust_tow(reference, 604790.0)), (2299, 604790.0));
        assert_eq!(gpst_week_tow(adjust_tow(reference, 20.0)), (2300, 20.0));
    }

    #[test]
    fn glonass_time_of_day() {
        let reference = gpst(2300, 100000.0);
        let tod = glonass_tod(reference);
        let t = adjust_glonass_tod(reference, tod);
        assert!(seconds_between(t, reference).abs() < 1.0E-6);

        let t = adjust_glonass_tod(reference, tod + 30.0);
        assert!((seconds_between(t, reference) - 30.0).abs() < 1.0E-6);

        // crossing midnight
        let t = adjust_glonass_tod(reference, (tod + 43000.0) % 86400.0);
        assert!((seconds_between(t, reference) - 43000.0).abs() < 1.0E-6);
    }

    #[test]
    fn glonass_day_of_week() {
        // 2024-01-07 is a Sunday
        let t = Epoch::from_gregorian_utc(2024, 1, 7, 12, 0, 0, 0);
        assert_eq!(glonass_dow(t), 0);
        // saturday 22:00 UTC is sunday in Moscow
        let t = Epoch::from_gregorian_utc(2024, 1, 6, 22, 0, 0, 0);
        assert_eq!(glonass_dow(t), 0);
        let t = Epoch::from_gregorian_utc(2024, 1, 6, 20, 0, 0, 0);
        assert_eq!(glonass_dow(t), 6);
    }
}
