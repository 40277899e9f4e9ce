//! DCF77-specific bit map and encoder (§6 "DCF77 signal bit map", §4.7).
//! Calendar arithmetic is shared with MSF via [`crate::protocol`]; only
//! the per-second signal layout is specific to this module.

use crate::bcd::BcdDigit;
use crate::bitstream::BitStream;
use crate::time_data::TimeData;
use crate::tick::Dcf77Tick;

fn bit_tick(value: bool) -> Dcf77Tick {
    if value {
        Dcf77Tick::Long
    } else {
        Dcf77Tick::Short
    }
}

/// `index`-th LSB-first bit of `value`'s packed BCD representation, given
/// the field's ones-digit bit width (`ones_bits`). Undefined fields
/// encode as all-zero.
fn bcd_field_bit(value: BcdDigit, ones_bits: u8, index: u8) -> bool {
    if !value.is_defined() {
        return false;
    }
    if index < ones_bits {
        (value.lo() >> index) & 1 != 0
    } else {
        (value.hi() >> (index - ones_bits)) & 1 != 0
    }
}

/// Even parity over the `len` signal bits starting at second `start`.
fn field_parity(time: &TimeData, start: u8, len: u8) -> bool {
    let mut parity = false;
    for second in start..start + len {
        if let Some(bit) = get_current_signal(time, second).bit() {
            parity ^= bit;
        }
    }
    parity
}

/// The expected tick at second `second` of the minute described by
/// `time` (§6, §8 property 1). The inverse of the decoding pipeline: used
/// by the convolutional predictor and by the round-trip test suite.
pub fn get_current_signal(time: &TimeData, second: u8) -> Dcf77Tick {
    match second {
        0..=14 => Dcf77Tick::Short,
        15 => bit_tick(time.abnormal_transmitter_operation),
        16 => bit_tick(time.timezone_change_scheduled),
        17 => bit_tick(time.uses_summertime),
        18 => bit_tick(!time.uses_summertime),
        19 => bit_tick(time.leap_second_scheduled),
        20 => Dcf77Tick::Long,
        21..=27 => bit_tick(bcd_field_bit(time.minute, 4, second - 21)),
        28 => bit_tick(field_parity(time, 21, 7)),
        29..=34 => bit_tick(bcd_field_bit(time.hour, 4, second - 29)),
        35 => bit_tick(field_parity(time, 29, 6)),
        36..=41 => bit_tick(bcd_field_bit(time.day, 4, second - 36)),
        42..=44 => bit_tick(bcd_field_bit(time.weekday, 3, second - 42)),
        45..=49 => bit_tick(bcd_field_bit(time.month, 4, second - 45)),
        50..=57 => bit_tick(bcd_field_bit(time.year, 4, second - 50)),
        58 => bit_tick(field_parity(time, 36, 22)),
        59 => {
            if time.leap_second_scheduled {
                Dcf77Tick::Short
            } else {
                Dcf77Tick::Sync
            }
        }
        60 => Dcf77Tick::Sync,
        _ => Dcf77Tick::Undefined,
    }
}

/// The bit stream the convolutional predictor scores incoming seconds
/// against: bits 16-58 of next minute's expected signal (§3 "Serialized
/// clock stream").
pub fn get_serialized_clock_stream(time: &TimeData) -> BitStream {
    let mut stream = BitStream::new();
    for second in 16..=58u8 {
        if let Some(bit) = get_current_signal(time, second).bit() {
            stream.set_bit(second, bit);
        }
    }
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcd::int_to_bcd;
    use crate::time_data::TimeData;

    fn sample_time() -> TimeData {
        TimeData {
            second: int_to_bcd(0),
            minute: int_to_bcd(37),
            hour: int_to_bcd(14),
            day: int_to_bcd(23),
            month: int_to_bcd(6),
            year: int_to_bcd(26),
            weekday: int_to_bcd(2),
            uses_summertime: true,
            timezone_change_scheduled: false,
            leap_second_scheduled: false,
            abnormal_transmitter_operation: false,
        }
    }

    #[test]
    fn bit_zero_is_always_short() {
        let t = sample_time();
        assert_eq!(get_current_signal(&t, 0), Dcf77Tick::Short);
    }

    #[test]
    fn bit_twenty_is_always_long() {
        let t = sample_time();
        assert_eq!(get_current_signal(&t, 20), Dcf77Tick::Long);
    }

    #[test]
    fn second_fifty_nine_is_sync_without_leap_second() {
        let t = sample_time();
        assert_eq!(get_current_signal(&t, 59), Dcf77Tick::Sync);
    }

    #[test]
    fn leap_second_pushes_sync_to_bit_sixty() {
        let mut t = sample_time();
        t.leap_second_scheduled = true;
        assert_eq!(get_current_signal(&t, 59), Dcf77Tick::Short);
        assert_eq!(get_current_signal(&t, 60), Dcf77Tick::Sync);
    }

    #[test]
    fn summertime_bit_and_complement_disagree() {
        let t = sample_time();
        assert_eq!(get_current_signal(&t, 17), Dcf77Tick::Long);
        assert_eq!(get_current_signal(&t, 18), Dcf77Tick::Short);
    }

    #[test]
    fn minute_field_round_trips_through_naive_bitstream() {
        let t = sample_time();
        let stream = get_serialized_clock_stream(&t);
        let decoded = crate::bitstream::extract_bcd(&stream, 21, 4, 3);
        assert_eq!(decoded, t.minute);
    }
}
