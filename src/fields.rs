//! Calendar field decoders (§4.5): one [`HammingVoter`] per field, each
//! parameterized with the bin count, significant-bit width, parity flag
//! and starting offset the original core used for that field's template
//! instantiation.
//!
//! | field    | bins | sig bits | parity | starts at |
//! |----------|------|----------|--------|-----------|
//! | minute   | 60   | 8        | yes    | 0         |
//! | hour     | 24   | 7        | yes    | 0         |
//! | day      | 31   | 6        | no     | 1         |
//! | weekday  | 7    | 3        | no     | 1         |
//! | month    | 12   | 5        | no     | 1         |
//! | year     | 10   | 4        | no     | 0         |
//! | decade   | 10   | 4        | no     | 0         |

use crate::bcd::BcdDigit;
use crate::bins::HammingVoter;

pub type MinuteVoter = HammingVoter<60, 8, true, false>;
pub type HourVoter = HammingVoter<24, 7, true, false>;
pub type DayVoter = HammingVoter<31, 6, false, true>;
pub type WeekdayVoter = HammingVoter<7, 3, false, true>;
pub type MonthVoter = HammingVoter<12, 5, false, true>;
pub type YearVoter = HammingVoter<10, 4, false, false>;
pub type DecadeVoter = HammingVoter<10, 4, false, false>;

/// One naive-bitstream observation of every calendar field, handed to
/// [`FieldDecoders::accumulate`] once per decoded minute.
#[derive(Clone, Copy, Default)]
pub struct FieldObservation {
    pub minute: BcdDigit,
    pub hour: BcdDigit,
    pub day: BcdDigit,
    pub weekday: BcdDigit,
    pub month: BcdDigit,
    pub year: BcdDigit,
    pub decade: BcdDigit,
}

/// The full bank of calendar-field voters, advanced together once per
/// minute at the sync mark (§4.5).
#[derive(Default)]
pub struct FieldDecoders {
    pub minute: MinuteVoter,
    pub hour: HourVoter,
    pub day: DayVoter,
    pub weekday: WeekdayVoter,
    pub month: MonthVoter,
    pub year: YearVoter,
    pub decade: DecadeVoter,
}

impl FieldDecoders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one minute's worth of naive field values into every voter, then
    /// resolve and rotate each one. Exactly one call per decoded minute.
    pub fn accumulate(&mut self, observation: FieldObservation) {
        self.minute.hamming_binning(observation.minute);
        self.hour.hamming_binning(observation.hour);
        self.day.hamming_binning(observation.day);
        self.weekday.hamming_binning(observation.weekday);
        self.month.hamming_binning(observation.month);
        self.year.hamming_binning(observation.year);
        self.decade.hamming_binning(observation.decade);

        self.minute.compute_max_index();
        self.hour.compute_max_index();
        self.day.compute_max_index();
        self.weekday.compute_max_index();
        self.month.compute_max_index();
        self.year.compute_max_index();
        self.decade.compute_max_index();

        self.minute.advance_tick();
        self.hour.advance_tick();
        self.day.advance_tick();
        self.weekday.advance_tick();
        self.month.advance_tick();
        self.year.advance_tick();
        self.decade.advance_tick();
    }

    /// Catch every voter's rotation cursor up to `missed` elapsed minutes
    /// without contributing new votes, e.g. after a gap in reception where
    /// the minute was never decoded (§4.5 rollover cascade).
    pub fn roll_over(&mut self, missed: u32) {
        self.minute.roll_over(missed);
        self.hour.roll_over(missed);
        self.day.roll_over(missed);
        self.weekday.roll_over(missed);
        self.month.roll_over(missed);
        self.year.roll_over(missed);
        self.decade.roll_over(missed);
    }

    pub fn reset(&mut self) {
        self.minute.reset();
        self.hour.reset();
        self.day.reset();
        self.weekday.reset();
        self.month.reset();
        self.year.reset();
        self.decade.reset();
    }

    /// Overall quality: the weakest of the seven individual voters, since
    /// a single badly-decoded field makes the whole minute unreliable
    /// (§4.5).
    pub fn quality_factor(&self) -> u8 {
        [
            self.minute.quality_factor(),
            self.hour.quality_factor(),
            self.day.quality_factor(),
            self.weekday.quality_factor(),
            self.month.quality_factor(),
            self.year.quality_factor(),
            self.decade.quality_factor(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcd::int_to_bcd;

    fn sample() -> FieldObservation {
        FieldObservation {
            minute: int_to_bcd(37),
            hour: int_to_bcd(14),
            day: int_to_bcd(23),
            weekday: int_to_bcd(4),
            month: int_to_bcd(6),
            year: int_to_bcd(6),
            decade: int_to_bcd(2),
        }
    }

    #[test]
    fn converges_on_repeated_observation() {
        let mut decoders = FieldDecoders::new();
        let observed = sample();
        for _ in 0..10 {
            decoders.accumulate(observed);
        }
        assert_eq!(decoders.minute.get_time_value(), observed.minute);
        assert_eq!(decoders.hour.get_time_value(), observed.hour);
        assert_eq!(decoders.day.get_time_value(), observed.day);
        assert_eq!(decoders.weekday.get_time_value(), observed.weekday);
        assert_eq!(decoders.month.get_time_value(), observed.month);
        assert_eq!(decoders.year.get_time_value(), observed.year);
        assert_eq!(decoders.decade.get_time_value(), observed.decade);
    }

    #[test]
    fn roll_over_advances_cursor_without_voting() {
        let mut decoders = FieldDecoders::new();
        decoders.roll_over(5);
        // No votes cast: every field stays undefined.
        assert!(!decoders.minute.get_time_value().is_defined());
    }
}
