//! Frequency control (§4.9): a long-horizon loop that measures phase
//! drift over tens of minutes and trims the 1 kHz generator, persisting
//! the result so a reboot doesn't start from scratch.

use crate::config::Config;

/// Second within the minute reserved for calibration bookkeeping (§4.9,
/// GLOSSARY "Calibration second").
pub const CALIBRATION_SECOND: u8 = 5;

struct Calibration {
    elapsed_minutes: u32,
}

/// Trims the 1 kHz tick generator towards the decoded phase, persisting
/// `(precision, adjust_pp16m)` to EEPROM when a readjustment meaningfully
/// improves on what's already stored.
pub struct FrequencyControl {
    adjust_pp16m: i16,
    precision: u8,
    calibration: Option<Calibration>,
    cumulated_phase_deviation: i32,
    config: Config,
}

impl FrequencyControl {
    pub fn new(config: Config) -> Self {
        FrequencyControl {
            adjust_pp16m: 0,
            precision: 0,
            calibration: None,
            cumulated_phase_deviation: 0,
            config,
        }
    }

    pub fn adjust_pp16m(&self) -> i16 {
        self.adjust_pp16m
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Restore a persisted calibration (§4.9 "Load at startup"). Returns
    /// `true` once applied, signalling the caller to mark the crystal
    /// tuned.
    pub fn load_calibration(&mut self, precision: u8, adjust_pp16m: i16) -> bool {
        self.precision = precision;
        self.adjust_pp16m = adjust_pp16m.clamp(-self.config.adjust_clamp_pp16m as i16, self.config.adjust_clamp_pp16m as i16);
        precision > 0
    }

    /// Call once per second. Arms a new measurement cycle at
    /// `CALIBRATION_SECOND` if one isn't already running and the decoder
    /// is qualified to start one.
    pub fn arm(&mut self, second: u8, qualified: bool) {
        if second == CALIBRATION_SECOND && qualified && self.calibration.is_none() {
            self.calibration = Some(Calibration { elapsed_minutes: 0 });
        }
    }

    /// Call once per decoded minute while a cycle is running.
    /// `leap_second_suspected` aborts the cycle outright (§4.9, §7).
    /// `phase_deviation_ticks` is the accumulated measured drift, in
    /// ticks, since the cycle's zero point. Returns `Some((precision,
    /// adjust))` when a readjustment should be persisted.
    pub fn on_minute_elapsed(
        &mut self,
        leap_second_suspected: bool,
        phase_deviation_ticks: i32,
    ) -> Option<(u8, i16)> {
        if leap_second_suspected {
            self.calibration = None;
            return None;
        }

        let elapsed = match &mut self.calibration {
            Some(cal) => {
                cal.elapsed_minutes += 1;
                cal.elapsed_minutes
            }
            None => return None,
        };

        let past_tau_min =
            elapsed >= self.config.tau_min_minutes && phase_deviation_ticks.abs() >= self.config.deviation_threshold_ticks;
        let past_tau_max = elapsed >= self.config.tau_max_minutes;
        if !past_tau_min && !past_tau_max {
            return None;
        }

        let elapsed_i32 = elapsed as i32;
        let frequency_offset = (2667 * phase_deviation_ticks) / elapsed_i32;
        let confirmed_precision = ((2667 + elapsed_i32 - 1) / elapsed_i32).max(1).min(u8::MAX as i32) as u8;
        let clamp = self.config.adjust_clamp_pp16m;
        let new_adjust = ((self.adjust_pp16m as i32) - frequency_offset).clamp(-clamp, clamp) as i16;

        let persist = should_persist(self.precision, confirmed_precision, self.adjust_pp16m, new_adjust);

        self.precision = confirmed_precision;
        self.adjust_pp16m = new_adjust;
        self.calibration = None;

        if persist {
            Some((self.precision, self.adjust_pp16m))
        } else {
            None
        }
    }

    /// Call once per 1 kHz tick. Returns the timer-reload nudge (in 4 µs
    /// steps: -1, 0 or +1) to apply, spending the accumulated deviation
    /// once it crosses ±64000 (§4.9 "1 kHz trim").
    pub fn tick_1khz(&mut self) -> i32 {
        self.cumulated_phase_deviation += self.adjust_pp16m as i32;
        if self.cumulated_phase_deviation >= 64000 {
            self.cumulated_phase_deviation -= 64000;
            1
        } else if self.cumulated_phase_deviation <= -64000 {
            self.cumulated_phase_deviation += 64000;
            -1
        } else {
            0
        }
    }
}

/// Persistence is only worth a write when it genuinely helps (§4.9):
/// precision improves outright, or precision is already good (<8) and the
/// trim drifted meaningfully, or precision is already as good as it gets
/// (1) and the trim moved at all.
fn should_persist(old_precision: u8, new_precision: u8, old_adjust: i16, new_adjust: i16) -> bool {
    if old_precision == 0 {
        return true;
    }
    if new_precision < old_precision {
        return true;
    }
    if old_precision < 8 && (new_adjust as i32 - old_adjust as i32).abs() > 8 {
        return true;
    }
    if old_precision == 1 && new_adjust != old_adjust {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readjusts_after_tau_min_with_enough_deviation() {
        let mut fc = FrequencyControl::new(Config::default());
        fc.arm(CALIBRATION_SECOND, true);
        for _ in 0..333 {
            assert!(fc.on_minute_elapsed(false, 20).is_none());
        }
        let persisted = fc.on_minute_elapsed(false, 20);
        assert!(persisted.is_some());
    }

    #[test]
    fn leap_second_suspicion_aborts_cycle() {
        let mut fc = FrequencyControl::new(Config::default());
        fc.arm(CALIBRATION_SECOND, true);
        fc.on_minute_elapsed(false, 1);
        assert!(fc.on_minute_elapsed(true, 1).is_none());
        // Cycle aborted: further elapsed-minute calls are no-ops until rearmed.
        assert!(fc.on_minute_elapsed(false, 1000).is_none());
    }

    #[test]
    fn adjust_stays_within_clamp() {
        let mut fc = FrequencyControl::new(Config::default());
        fc.arm(CALIBRATION_SECOND, true);
        for _ in 0..5334 {
            fc.on_minute_elapsed(false, 50_000);
        }
        assert!(fc.adjust_pp16m() <= 1600 && fc.adjust_pp16m() >= -1600);
    }

    #[test]
    fn tick_trim_spends_deviation_in_4us_steps() {
        let mut fc = FrequencyControl::new(Config::default());
        fc.adjust_pp16m = 64000;
        assert_eq!(fc.tick_1khz(), 1);
        assert_eq!(fc.cumulated_phase_deviation, 0);
    }
}
