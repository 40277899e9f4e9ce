//! MSF-specific bit map and encoder (§6 "MSF signal bit map", §4.7).
//! Calendar arithmetic is shared with DCF77 via [`crate::protocol`]; only
//! the per-second signal layout (two channels, A and B) is specific here.

use crate::bcd::BcdDigit;
use crate::bitstream::BitStream;
use crate::tick::MsfTick;
use crate::time_data::TimeData;

/// Fixed A-channel tail, seconds 52-59: `01111110`.
const TAIL: [bool; 8] = [false, true, true, true, true, true, true, false];

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

fn bit_a(time: &TimeData, second: u8) -> bool {
    match second {
        1..=16 => false, // DUT1 bits, out of scope.
        17..=24 => bcd_field_bit(time.year, 4, second - 17),
        25..=29 => bcd_field_bit(time.month, 4, second - 25),
        30..=35 => bcd_field_bit(time.day, 4, second - 30),
        36..=38 => bcd_field_bit(time.weekday, 3, second - 36),
        39..=44 => bcd_field_bit(time.hour, 4, second - 39),
        45..=51 => bcd_field_bit(time.minute, 4, second - 45),
        52..=59 => TAIL[(second - 52) as usize],
        _ => false,
    }
}

/// Negative even parity: `true` (bit set) iff the popcount across the
/// given `(start, len)` ranges of the A channel is even (§6).
fn range_popcount_even(time: &TimeData, ranges: &[(u8, u8)]) -> bool {
    let mut ones = 0u32;
    for &(start, len) in ranges {
        for second in start..start + len {
            if bit_a(time, second) {
                ones += 1;
            }
        }
    }
    ones % 2 == 0
}

fn bit_b(time: &TimeData, second: u8) -> bool {
    match second {
        1..=52 => false,
        53 => time.timezone_change_scheduled,
        54 => range_popcount_even(time, &[(17, 8)]),
        55 => range_popcount_even(time, &[(25, 5), (30, 6)]),
        56 => range_popcount_even(time, &[(36, 3)]),
        57 => range_popcount_even(time, &[(39, 6), (45, 7)]),
        58 => time.uses_summertime,
        _ => false,
    }
}

fn symbol(a: bool, b: bool) -> MsfTick {
    match (a, b) {
        (false, false) => MsfTick::A0B0,
        (false, true) => MsfTick::A0B1,
        (true, false) => MsfTick::A1B0,
        (true, true) => MsfTick::A1B1,
    }
}

/// The expected tick at second `second` of the minute described by
/// `time` (§6, §8 property 2).
pub fn get_current_signal(time: &TimeData, second: u8) -> MsfTick {
    if second == 0 {
        return MsfTick::MinMarker;
    }
    if second > 59 {
        return MsfTick::Undefined;
    }
    symbol(bit_a(time, second), bit_b(time, second))
}

/// The two serialized channels (A, B) the convolutional predictor scores
/// incoming seconds against (§3 "Serialized clock stream").
pub struct MsfSerializedStream {
    pub a: BitStream,
    pub b: BitStream,
}

pub fn get_serialized_clock_stream(time: &TimeData) -> MsfSerializedStream {
    let mut a = BitStream::new();
    let mut b = BitStream::new();
    for second in 1..=59u8 {
        a.set_bit(second, bit_a(time, second));
        b.set_bit(second, bit_b(time, second));
    }
    MsfSerializedStream { a, b }
}
