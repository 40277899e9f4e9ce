//! The decoded (or synthesized) calendar instant (§3 "Data Model").

use crate::bcd::{BcdDigit, UNDEFINED};

/// A full calendar instant, every field a packed [`BcdDigit`] so an
/// undefined field bubbles through arithmetic cleanly instead of needing
/// a separate `Option` per field (§3, §4.7).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimeData {
    pub second: BcdDigit,
    pub minute: BcdDigit,
    pub hour: BcdDigit,
    pub day: BcdDigit,
    pub month: BcdDigit,
    pub year: BcdDigit,
    pub weekday: BcdDigit,
    pub uses_summertime: bool,
    pub timezone_change_scheduled: bool,
    pub leap_second_scheduled: bool,
    pub abnormal_transmitter_operation: bool,
}

impl Default for TimeData {
    fn default() -> Self {
        TimeData {
            second: UNDEFINED,
            minute: UNDEFINED,
            hour: UNDEFINED,
            day: UNDEFINED,
            month: UNDEFINED,
            year: UNDEFINED,
            weekday: UNDEFINED,
            uses_summertime: false,
            timezone_change_scheduled: false,
            leap_second_scheduled: false,
            abnormal_transmitter_operation: false,
        }
    }
}

impl TimeData {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` only if every calendar field is defined (§4.7): a minute
    /// with even one undefined field cannot be trusted as a whole.
    pub fn is_fully_defined(&self) -> bool {
        self.second.is_defined()
            && self.minute.is_defined()
            && self.hour.is_defined()
            && self.day.is_defined()
            && self.month.is_defined()
            && self.year.is_defined()
            && self.weekday.is_defined()
    }
}
