//! Second-index decoder (§4.4): locates the running second (0..59) within
//! the minute, so the field voters below know which bin each second's bit
//! belongs to.
//!
//! Both binning strategies described in §4.4 are specializations of the
//! same rotation-voting trick [`crate::bins::HammingVoter`] already uses
//! for calendar fields, just scored against a 1- or 3-bit observation
//! instead of a full BCD digit:
//!
//! - **Sync-mark binning** (pre-lock): each second contributes one bit —
//!   "was this the sync mark?" — scored against all 60 rotations of an
//!   alternating candidate. Slow to converge, needs no prior knowledge of
//!   the minute's content.
//! - **Convolution binning** (post-lock): each second instead contributes
//!   its classified tick symbol, scored against all 60 rotations of what
//!   the decoder expects this minute to look like. Converges fast because
//!   it scores the whole tick, not just the sync bit, but it needs the
//!   prior lock to know what to expect.

use crate::bcd::{bcd_to_int, BcdDigit};
use crate::bins::HammingVoter;

pub const SECONDS_PER_MINUTE: u8 = 60;
/// Quality-factor threshold above which the decoder trusts its lock
/// enough to switch from sync-mark to convolution binning (§4.4).
pub const LOCK_THRESHOLD: u8 = 12;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    SyncMark,
    Convolution,
}

pub struct SecondDecoder {
    sync: HammingVoter<60, 1, false, false>,
    conv: HammingVoter<60, 3, false, false>,
    expected: [u8; 60],
    mode: Mode,
}

impl Default for SecondDecoder {
    fn default() -> Self {
        SecondDecoder {
            sync: HammingVoter::new(),
            conv: HammingVoter::new(),
            expected: [0; 60],
            mode: Mode::SyncMark,
        }
    }
}

impl SecondDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Feed one second's sync-mark observation. Always safe to call; only
    /// moves the needle while in [`Mode::SyncMark`].
    pub fn observe_sync_mark(&mut self, is_sync: bool) {
        self.sync.hamming_binning(BcdDigit::from_raw(is_sync as u8));
        self.sync.compute_max_index();
        self.sync.advance_tick();
        if self.sync.quality_factor() >= LOCK_THRESHOLD {
            self.mode = Mode::Convolution;
        }
    }

    /// Install the current minute's expected tick-code sequence — the
    /// convolution kernel (§3 "Serialized clock stream") — scored against
    /// incoming symbols by [`Self::observe_symbol`] while in
    /// [`Mode::Convolution`]. Called once per decoded minute.
    pub fn set_expected_minute(&mut self, expected: [u8; 60]) {
        self.expected = expected;
    }

    /// Feed one second's classified tick symbol, packed into the low 3
    /// bits (the DCF77 classifier needs 2, MSF's A/B pair needs 2; both
    /// fit comfortably). Only moves the needle while in
    /// [`Mode::Convolution`]; drops back to sync-mark binning if the
    /// convolution lock quality falls below threshold (phase or content
    /// drift, §4.4 "a lost convolution lock must not silently persist").
    pub fn observe_symbol(&mut self, symbol: u8) {
        self.conv.hamming_binning_against(symbol & 0x07, &self.expected);
        self.conv.compute_max_index();
        self.conv.advance_tick();
        if self.conv.quality_factor() < LOCK_THRESHOLD {
            self.mode = Mode::SyncMark;
        }
    }

    /// The decoded second-within-minute, shifted by the protocol-specific
    /// offset (DCF77: 2, MSF: 1, §4.4), or `None` if the active voter's
    /// margin is below its detection threshold.
    pub fn current_second(&self, offset: u8) -> Option<u8> {
        let value = match self.mode {
            Mode::SyncMark => self.sync.get_time_value(),
            Mode::Convolution => self.conv.get_time_value(),
        };
        if value.is_defined() {
            Some((bcd_to_int(value) + offset) % SECONDS_PER_MINUTE)
        } else {
            None
        }
    }

    pub fn quality_factor(&self) -> u8 {
        match self.mode {
            Mode::SyncMark => self.sync.quality_factor(),
            Mode::Convolution => self.conv.quality_factor(),
        }
    }

    /// Drop both voters and return to sync-mark mode (phase-lost event,
    /// §4.8).
    pub fn reset(&mut self) {
        self.sync.reset();
        self.conv.reset();
        self.mode = Mode::SyncMark;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `minutes` worth of clean sync-mark observations, sync falling
    /// exactly on second `sync_second` of each minute.
    fn feed_minutes(decoder: &mut SecondDecoder, sync_second: u8, minutes: u32) {
        for _ in 0..minutes {
            for s in 0..SECONDS_PER_MINUTE {
                decoder.observe_sync_mark(s == sync_second);
            }
        }
    }

    #[test]
    fn sync_mark_binning_locks_onto_second() {
        let mut decoder = SecondDecoder::new();
        feed_minutes(&mut decoder, 59, 6);
        assert_eq!(decoder.mode(), Mode::Convolution);
    }

    #[test]
    fn convolution_mode_reverts_when_installed_kernel_mismatches() {
        let mut decoder = SecondDecoder::new();
        feed_minutes(&mut decoder, 59, 6);
        assert_eq!(decoder.mode(), Mode::Convolution);

        decoder.set_expected_minute([7u8; 60]);
        // Every observed symbol disagrees maximally with the installed
        // kernel: a lost convolution lock must not silently persist.
        for _ in 0..SECONDS_PER_MINUTE {
            decoder.observe_symbol(0);
        }
        assert_eq!(decoder.mode(), Mode::SyncMark);
    }

    #[test]
    fn resets_to_sync_mark_mode() {
        let mut decoder = SecondDecoder::new();
        feed_minutes(&mut decoder, 59, 6);
        assert_eq!(decoder.mode(), Mode::Convolution);
        decoder.reset();
        assert_eq!(decoder.mode(), Mode::SyncMark);
        assert_eq!(decoder.current_second(2), None);
    }
}
