//! Generic saturating bin arrays used for majority voting (§3 "Hamming
//! bins", §4.1). `Bins<N>` is the bare circular accumulator shared by the
//! second-index decoder (raw additive scoring) and by [`HammingVoter`]
//! (candidate-rotation scoring); both are specializations of the same
//! "vote into N saturating counters, then read off the argmax and runner
//! up" idea described in spec.md §4.1.

use crate::arithmetic::{bit_count, bounded_add, bounded_sub, parity};
use crate::bcd::{int_to_bcd, BcdDigit, UNDEFINED};

/// A circular array of `N` saturating `u8` counters plus the bookkeeping
/// needed to read off the best and second-best bin after voting.
#[derive(Clone, Copy)]
pub struct Bins<const N: usize> {
    data: [u8; N],
    tick: u8,
    max: u8,
    noise_max: u8,
    max_index: u8,
}

impl<const N: usize> Default for Bins<N> {
    fn default() -> Self {
        Bins {
            data: [0; N],
            tick: 0,
            max: 0,
            noise_max: 0,
            max_index: 0xff,
        }
    }
}

impl<const N: usize> Bins<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> u8 {
        self.tick
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn noise_max(&self) -> u8 {
        self.noise_max
    }

    pub fn max_index(&self) -> u8 {
        self.max_index
    }

    pub fn data(&self) -> &[u8; N] {
        &self.data
    }

    /// Rotate the cursor modulo `N`. Exactly one call per second.
    pub fn advance_tick(&mut self) {
        self.tick = if (self.tick as usize) < N - 1 { self.tick + 1 } else { 0 };
    }

    /// Add `amount` into bin `index`, applying the global noise-floor
    /// decrement first if `max` is already too close to saturation to
    /// absorb it (§3 "Bin saturation is prevented by a global noise-floor
    /// decrement").
    pub fn add(&mut self, index: usize, amount: u8) {
        if self.max > 255 - amount {
            for bin in self.data.iter_mut() {
                bounded_sub(bin, amount);
            }
            self.max -= amount;
            bounded_sub(&mut self.noise_max, amount);
        }
        bounded_add(&mut self.data[index], amount);
    }

    /// Linear scan for the largest bin (`max`/`max_index`) and the
    /// largest of the rest (`noise_max`). Ties favor the last occurrence,
    /// since `>=` keeps overwriting `max`/`max_index` as the scan
    /// continues past an equal value.
    pub fn compute_max_index(&mut self) {
        self.noise_max = 0;
        self.max = 0;
        self.max_index = 0xff;
        for (index, &value) in self.data.iter().enumerate() {
            if value >= self.max {
                self.noise_max = self.max;
                self.max = value;
                self.max_index = index as u8;
            } else if value > self.noise_max {
                self.noise_max = value;
            }
        }
    }

    /// `(max - noise_max) / log2(max + 3)`, approximated via the same
    /// range lookup as the original (no floating point, no `libm`).
    pub fn quality_factor(&self) -> u8 {
        quality_factor_from(self.max, self.noise_max)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Shared quality-factor approximation used by every bin family (phase,
/// second-index, and Hamming voters alike): `delta / log2(max + 3)`,
/// saturating at 255, computed without floating point via the same
/// piecewise lookup the original core uses.
pub fn quality_factor_from(max: u8, noise_max: u8) -> u8 {
    if max <= noise_max {
        return 0;
    }
    let delta = (max - noise_max) as u16;

    if max >= 32 - 3 {
        let mut m = max as u16;
        let mut log2 = 0u8;
        while m > 0 {
            m >>= 1;
            log2 += 1;
        }
        log2 -= 1;
        let multiplier: u16 = if log2 > 12 {
            if log2 > 13 {
                if log2 > 14 {
                    256 / 15
                } else {
                    256 / 14
                }
            } else {
                256 / 13
            }
        } else if log2 > 8 {
            if log2 > 10 {
                if log2 > 11 {
                    256 / 12
                } else {
                    256 / 11
                }
            } else if log2 > 9 {
                256 / 10
            } else {
                256 / 9
            }
        } else if log2 > 6 {
            if log2 > 7 {
                256 / 8
            } else {
                256 / 7
            }
        } else if log2 > 5 {
            256 / 6
        } else {
            256 / 5
        };
        ((delta * multiplier) >> 8) as u8
    } else if max >= 16 - 3 {
        (delta >> 2) as u8
    } else if max >= 12 - 3 {
        if delta >= 11 {
            3
        } else if delta >= 7 {
            2
        } else if delta >= 4 {
            1
        } else {
            0
        }
    } else if max >= 8 - 3 {
        if delta >= 6 {
            2
        } else if delta >= 3 {
            1
        } else {
            0
        }
    } else if max >= 6 - 3 {
        if delta >= 3 {
            1
        } else {
            0
        }
    } else {
        (delta >> 1) as u8
    }
}

/// A [`Bins`] specialized for Hamming candidate-rotation voting (§4.1): on
/// each `hamming_binning` call, every one of the `N` possible rotations of
/// the field is scored against the observed bits, and the rotation with
/// the best Hamming score accumulates the most credit over time.
///
/// - `SIG_BITS`: number of meaningful bits scored per observation (the
///   field width, including a parity bit if `PARITY` is set).
/// - `PARITY`: whether bit 7 of each candidate should be set to even
///   parity of the rest before scoring (minute, hour).
/// - `START_AT_ONE`: whether candidate values start counting at 1 rather
///   than 0 (day, weekday, month — calendar fields with no "zeroth"
///   value).
#[derive(Clone, Copy)]
pub struct HammingVoter<const N: usize, const SIG_BITS: u8, const PARITY: bool, const START_AT_ONE: bool> {
    bins: Bins<N>,
}

impl<const N: usize, const SIG_BITS: u8, const PARITY: bool, const START_AT_ONE: bool> Default
    for HammingVoter<N, SIG_BITS, PARITY, START_AT_ONE>
{
    fn default() -> Self {
        HammingVoter { bins: Bins::default() }
    }
}

impl<const N: usize, const SIG_BITS: u8, const PARITY: bool, const START_AT_ONE: bool>
    HammingVoter<N, SIG_BITS, PARITY, START_AT_ONE>
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_tick(&mut self) {
        self.bins.advance_tick();
    }

    /// Advance the rotation cursor `missed` times without voting, used to
    /// catch a voter back up to real elapsed time after a gap where no
    /// observation was available (§4.5 rollover).
    pub fn roll_over(&mut self, missed: u32) {
        let steps = missed % N as u32;
        for _ in 0..steps {
            self.advance_tick();
        }
    }

    pub fn reset(&mut self) {
        self.bins.reset();
    }

    pub fn quality_factor(&self) -> u8 {
        self.bins.quality_factor()
    }

    pub fn quality(&self) -> (u8, u8) {
        (self.bins.max(), self.bins.noise_max())
    }

    /// Score `input` against every one of the `N` candidate rotations and
    /// accumulate the Hamming score (§4.1 `hamming_binning`).
    pub fn hamming_binning(&mut self, input: BcdDigit) {
        let offset = N - 1 - self.bins.tick as usize;
        let mut bin_index = offset;
        let start: u8 = if PARITY || N == 10 { 0x00 } else { 0x01 };
        let mut candidate = BcdDigit::from_raw(start);

        for _ in 0..N {
            let scored = if PARITY {
                candidate.with_bit(7, parity(candidate.0) != 0)
            } else {
                candidate
            };
            let score = SIG_BITS.saturating_sub(bit_count(input.0 ^ scored.0));
            self.bins.add(bin_index, score);

            bin_index = if bin_index < N - 1 { bin_index + 1 } else { 0 };
            candidate.increment();
        }
    }

    /// Score `input` against an externally supplied expected value per
    /// candidate second rather than the auto-incrementing BCD candidate
    /// [`Self::hamming_binning`] assumes: post-lock convolution binning
    /// scores incoming symbols against the minute's actual expected
    /// content, not a rotating guess (§4.4).
    pub fn hamming_binning_against(&mut self, input: u8, expected: &[u8; N]) {
        let offset = N - 1 - self.bins.tick as usize;
        let mut bin_index = offset;
        for candidate_index in 0..N {
            let score = SIG_BITS.saturating_sub(bit_count(input ^ expected[candidate_index]));
            self.bins.add(bin_index, score);
            bin_index = if bin_index < N - 1 { bin_index + 1 } else { 0 };
        }
    }

    pub fn compute_max_index(&mut self) {
        self.bins.compute_max_index();
    }

    /// Best candidate value, or `UNDEFINED` if the margin over the runner
    /// up is below the detection threshold (§4.1 `get_time_value`).
    pub fn get_time_value(&self) -> BcdDigit {
        const THRESHOLD: u8 = 2;
        let offset: u8 = if START_AT_ONE { 1 } else { 0 };
        if self.bins.max() - self.bins.noise_max() >= THRESHOLD && self.bins.max_index() != 0xff {
            let raw = (self.bins.max_index() as u16 + self.bins.tick() as u16 + 1) % N as u16;
            int_to_bcd(raw as u8 + offset)
        } else {
            UNDEFINED
        }
    }
}
