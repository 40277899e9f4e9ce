//! Calendar arithmetic shared by both signal families (§4.7): weekday and
//! days-per-month computation, DST transition handling, and the
//! second/minute advance cascade. DCF77 and MSF each layer their own bit
//! map and tick classifier on top of this.

use crate::bcd::{bcd_to_int, int_to_bcd, BcdDigit, UNDEFINED};
use crate::time_data::TimeData;

/// Days in `month` of `year` (two-digit, 2000 + year). February uses the
/// simple `year % 4 == 0` rule, valid through 2399. An undefined year or
/// month bubbles through as 0 (§4.7).
pub fn days_per_month(year: BcdDigit, month: BcdDigit) -> u8 {
    if !year.is_defined() || !month.is_defined() {
        return 0;
    }
    match bcd_to_int(month) {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if bcd_to_int(year) % 4 == 0 {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Gaussian (Zeller-congruence) weekday for a two-digit year (2000..2099),
/// returning Sunday = 0 .. Saturday = 6, or `None` for an invalid date.
fn gaussian_weekday(year: u8, month: u8, day: u8) -> Option<u8> {
    if !(1..=12).contains(&month) || day == 0 || day > 31 {
        return None;
    }
    let (m, y) = if month < 3 {
        (month as i32 + 12, year as i32 - 1)
    } else {
        (month as i32, year as i32)
    };
    const CENTURY: i32 = 20; // 2000s, fixed: valid range is 2001-2099.
    let k = y.rem_euclid(100);
    let q = day as i32;
    let h = (q + (13 * (m + 1)) / 5 + k + k / 4 + CENTURY / 4 + 5 * CENTURY).rem_euclid(7);
    Some(((h + 6) % 7) as u8)
}

/// Weekday in the broadcast convention used by `time_data` (Mon=1..Sun=7),
/// or `0xFF` for an invalid date (§8 property 3).
pub fn weekday(year: BcdDigit, month: BcdDigit, day: BcdDigit) -> BcdDigit {
    if !year.is_defined() || !month.is_defined() || !day.is_defined() {
        return UNDEFINED;
    }
    match gaussian_weekday(bcd_to_int(year), bcd_to_int(month), bcd_to_int(day)) {
        Some(0) => int_to_bcd(7),
        Some(w) => int_to_bcd(w),
        None => UNDEFINED,
    }
}

/// The day-of-month of the last Sunday in `month` (March or October) of
/// `year`, the EU/UK DST transition date.
fn last_sunday(year: u8, month: u8) -> u8 {
    for day in (25..=31).rev() {
        if gaussian_weekday(year, month, day) == Some(0) {
            return day;
        }
    }
    25
}

/// Derive `uses_summertime` from the date, leaving it untouched during the
/// bistable hour-2 ambiguity window on the transition date itself (§4.7).
pub fn autoset_timezone(time: &mut TimeData) {
    if !time.is_fully_defined() {
        return;
    }
    let year = bcd_to_int(time.year);
    let day = bcd_to_int(time.day);
    let hour = bcd_to_int(time.hour);
    match bcd_to_int(time.month) {
        4..=9 => time.uses_summertime = true,
        11 | 12 | 1 | 2 => time.uses_summertime = false,
        3 => {
            let last = last_sunday(year, 3);
            if day < last {
                time.uses_summertime = false;
            } else if day > last {
                time.uses_summertime = true;
            } else if hour < 2 {
                time.uses_summertime = false;
            } else if hour >= 3 {
                time.uses_summertime = true;
            }
        }
        10 => {
            let last = last_sunday(year, 10);
            if day < last {
                time.uses_summertime = true;
            } else if day > last {
                time.uses_summertime = false;
            } else if hour < 2 {
                time.uses_summertime = true;
            } else if hour >= 3 {
                time.uses_summertime = false;
            }
        }
        _ => {}
    }
}

/// `true` during the hour broadcast convention reserves for announcing an
/// imminent DST transition: hour 1 ahead of the March forward jump, hour 2
/// ahead of the October backward jump (§4.7).
pub fn autoset_timezone_change_scheduled(time: &TimeData) -> bool {
    if !time.is_fully_defined() {
        return false;
    }
    let year = bcd_to_int(time.year);
    let day = bcd_to_int(time.day);
    let hour = bcd_to_int(time.hour);
    match bcd_to_int(time.month) {
        3 => day == last_sunday(year, 3) && hour == 1,
        10 => day == last_sunday(year, 10) && hour == 2,
        _ => false,
    }
}

/// Structural guard on a (possibly externally signalled) leap-second
/// announcement: only month-end transitions of January, April, July and
/// October, at 23:59, may carry one (§4.7, §7).
pub fn verify_leap_second_scheduled(time: &TimeData, assume: bool) -> bool {
    if !assume || !time.is_fully_defined() {
        return false;
    }
    let month = bcd_to_int(time.month);
    let valid_month = matches!(month, 1 | 4 | 7 | 10);
    valid_month
        && bcd_to_int(time.day) == days_per_month(time.year, time.month)
        && bcd_to_int(time.hour) == 23
        && bcd_to_int(time.minute) == 59
}

pub(crate) fn autoset_control_bits(time: &mut TimeData) {
    autoset_timezone(time);
    time.timezone_change_scheduled = autoset_timezone_change_scheduled(time);
    time.leap_second_scheduled = verify_leap_second_scheduled(time, time.leap_second_scheduled);
}

fn advance_year(time: &mut TimeData) {
    let year = bcd_to_int(time.year);
    time.year = int_to_bcd(if year >= 99 { 0 } else { year + 1 });
}

fn advance_month(time: &mut TimeData) {
    let month = bcd_to_int(time.month);
    if month >= 12 {
        time.month = int_to_bcd(1);
        advance_year(time);
    } else {
        time.month = int_to_bcd(month + 1);
    }
}

fn advance_day(time: &mut TimeData) {
    let day = bcd_to_int(time.day);
    let days_in_month = days_per_month(time.year, time.month);
    if day >= days_in_month {
        time.day = int_to_bcd(1);
        advance_month(time);
    } else {
        time.day = int_to_bcd(day + 1);
    }
}

/// Advance the hour, handling the two DST jumps (§4.7, §8 properties 5/6):
/// 01:59 wintertime -> 03:00 summertime (forward), 02:59 summertime ->
/// 02:00 wintertime (backward, hour 2 repeats).
fn advance_hour(time: &mut TimeData) {
    let hour = bcd_to_int(time.hour);
    if time.timezone_change_scheduled && !time.uses_summertime && hour == 1 {
        time.hour = int_to_bcd(3);
        time.uses_summertime = true;
        time.timezone_change_scheduled = false;
        return;
    }
    if time.timezone_change_scheduled && time.uses_summertime && hour == 2 {
        time.hour = int_to_bcd(2);
        time.uses_summertime = false;
        time.timezone_change_scheduled = false;
        return;
    }
    if hour >= 23 {
        time.hour = int_to_bcd(0);
        advance_day(time);
    } else {
        time.hour = int_to_bcd(hour + 1);
    }
}

pub(crate) fn advance_minute(time: &mut TimeData) {
    let minute = bcd_to_int(time.minute);
    if minute >= 59 {
        time.minute = int_to_bcd(0);
        advance_hour(time);
    } else {
        time.minute = int_to_bcd(minute + 1);
    }
    time.weekday = weekday(time.year, time.month, time.day);
}

/// Advance `time` by exactly one second, honoring leap seconds (second 60
/// inserted when `leap_second_scheduled`) and calling out to the minute,
/// hour, day, month and year cascades on rollover (§4.7, §8 property 4/7).
pub fn advance_second(time: &mut TimeData) {
    let second = bcd_to_int(time.second);
    let new_second = match second {
        59 if time.leap_second_scheduled => 60,
        59 => {
            advance_minute(time);
            0
        }
        60 => {
            time.leap_second_scheduled = false;
            advance_minute(time);
            0
        }
        _ => second + 1,
    };
    time.second = int_to_bcd(new_second);
    if new_second == 15 {
        autoset_control_bits(time);
    }
}
