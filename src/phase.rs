//! Phase demodulator (§4.2): finds the second boundary inside the 1 kHz
//! sample stream by binning samples into 100 phase slots per second and
//! sliding a weighted integral across the ring to find the deepest
//! carrier-off window.

/// Number of phase slots per second (10 ms resolution).
pub const BIN_COUNT: usize = 100;
/// Raw samples per second at 1 kHz.
pub const SAMPLES_PER_SECOND: u16 = 1000;
/// Raw samples per phase bin.
pub const SAMPLES_PER_BIN: u16 = SAMPLES_PER_SECOND / BIN_COUNT as u16;
pub const BINS_PER_10MS: usize = BIN_COUNT / 100;
pub const BINS_PER_50MS: usize = 5 * BINS_PER_10MS;
pub const BINS_PER_100MS: usize = 10 * BINS_PER_10MS;
pub const BINS_PER_200MS: usize = 20 * BINS_PER_10MS;
pub const BINS_PER_300MS: usize = 30 * BINS_PER_10MS;

/// Saturation cap for phase bins before the crystal is deemed tuned.
pub const CAP_UNTUNED: u16 = 300;
/// Saturation cap once the crystal is tuned (slower adaptation).
pub const CAP_TUNED: u16 = 3600;

/// One of the two weighting kernels used to integrate the phase-bin ring
/// into a "how deep is the carrier-off window starting here" score.
#[derive(Clone, Copy)]
pub enum PhaseKernel {
    /// `bins 0..9` weight 2, `bins 10..19` weight 1 — a 100 ms strong +
    /// 100 ms tail model, adequate for both DCF77 and MSF (§4.2).
    Uniform,
    /// MSF-specific 59/34/8 weights over three 100 ms segments, matching
    /// the true MSF carrier-off envelope more closely (§4.2, §4.9 open
    /// question: "this spec treats the MSF-specific ... kernel as
    /// normative for MSF").
    Msf,
}

impl PhaseKernel {
    /// Weighted sum of `BINS_PER_100MS`-wide (or 3-segment, for MSF)
    /// windows starting at `start`, wrapping around the 100-slot ring.
    fn integrate(self, data: &[u16; BIN_COUNT], start: usize) -> u32 {
        match self {
            PhaseKernel::Uniform => {
                let mut sum = 0u32;
                for i in 0..BINS_PER_100MS {
                    sum += 2 * data[(start + i) % BIN_COUNT] as u32;
                }
                for i in BINS_PER_100MS..2 * BINS_PER_100MS {
                    sum += data[(start + i) % BIN_COUNT] as u32;
                }
                sum
            }
            PhaseKernel::Msf => {
                // 100 ms segments weighted 59 / 34 / 8, reflecting the
                // proportion of "carrier off" samples a clean minute
                // actually shows across the 0-100/100-200/200-300 ms
                // spans of the MSF second (§4.2).
                let weights = [59u32, 34, 8];
                let mut sum = 0u32;
                for (seg, &w) in weights.iter().enumerate() {
                    for i in 0..BINS_PER_100MS {
                        sum += w * data[(start + seg * BINS_PER_100MS + i) % BIN_COUNT] as u32;
                    }
                }
                sum
            }
        }
    }
}

/// 100-slot ring of sample counts, one per 10 ms of the second, tracking
/// the probability that each slot lies inside the carrier-off window.
#[derive(Clone, Copy)]
pub struct PhaseBins {
    data: [u16; BIN_COUNT],
    tick: u8,
    cap: u16,
    max: u32,
    noise_max: u32,
    max_index: u8,
}

impl Default for PhaseBins {
    fn default() -> Self {
        PhaseBins {
            data: [0; BIN_COUNT],
            tick: 0,
            cap: CAP_UNTUNED,
            max: 0,
            noise_max: 0,
            max_index: 0xff,
        }
    }
}

impl PhaseBins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_index(&self) -> u8 {
        self.max_index
    }

    /// Raise the saturation cap once the crystal is deemed tuned, slowing
    /// the ring's adaptation to genuine phase drift.
    pub fn set_has_tuned_clock(&mut self) {
        self.cap = CAP_TUNED;
    }

    /// Feed one 10 ms bin's majority-vote sample (`true` = carrier off).
    /// Advances the ring cursor.
    pub fn phase_binning(&mut self, input: bool) {
        let idx = self.tick as usize;
        if input {
            if self.data[idx] < self.cap {
                self.data[idx] += 1;
            }
        } else if self.data[idx] > 0 {
            self.data[idx] -= 1;
        }
        self.tick = if (self.tick as usize) < BIN_COUNT - 1 { self.tick + 1 } else { 0 };
    }

    pub fn wrap(v: usize) -> usize {
        v % BIN_COUNT
    }

    /// Sliding weighted integral: `max_index` names the start of the
    /// deepest signal window, `noise_max` is the same integral computed
    /// 200 ms later (the "shadow" window) — the same max/runner-up
    /// structure as [`crate::bins::Bins`], just over a 32-bit integral
    /// instead of saturating `u8` bins (§4.2).
    pub fn phase_detection(&mut self, kernel: PhaseKernel) {
        let mut max = 0u32;
        let mut max_index = 0u8;
        for start in 0..BIN_COUNT {
            let v = kernel.integrate(&self.data, start);
            if v >= max {
                max = v;
                max_index = start as u8;
            }
        }
        let shadow_start = (max_index as usize + BINS_PER_200MS) % BIN_COUNT;
        let noise = kernel.integrate(&self.data, shadow_start);

        self.max = max;
        self.max_index = max_index;
        self.noise_max = noise;
    }

    /// `(max - noise_max) / log2(max)`, the phase-lock SNR (§4.2).
    pub fn quality_factor(&self) -> u8 {
        if self.max <= self.noise_max {
            return 0;
        }
        let delta = self.max - self.noise_max;
        let mut m = self.max;
        let mut log2 = 0u32;
        while m > 0 {
            m >>= 1;
            log2 += 1;
        }
        if log2 <= 1 {
            return delta.min(255) as u8;
        }
        ((delta / log2).min(255)) as u8
    }

    pub fn get_quality(&self) -> (u32, u32) {
        (self.max, self.noise_max)
    }

    /// The located second boundary's offset from dead-center, in 1 ms
    /// ticks rather than 10 ms bins, signed so a boundary drifting late
    /// reads positive and one drifting early reads negative. Feeds
    /// [`crate::freq_control::FrequencyControl::on_minute_elapsed`]'s
    /// `phase_deviation_ticks` (§4.9).
    pub fn phase_deviation_ticks(&self) -> i32 {
        let raw = self.max_index as i32;
        let half = (BIN_COUNT / 2) as i32;
        let signed = if raw > half { raw - BIN_COUNT as i32 } else { raw };
        signed * SAMPLES_PER_BIN as i32
    }

    pub fn reset(&mut self) {
        let cap = self.cap;
        *self = Self::default();
        self.cap = cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed a clean DCF77-shaped second: 200ms low (carrier off -> true
    /// samples), 800ms high (carrier on -> false), at 10ms granularity.
    fn feed_clean_second(bins: &mut PhaseBins, low_start_bin: usize, low_bins: usize) {
        for bin in 0..BIN_COUNT {
            let is_low = {
                let rel = (bin + BIN_COUNT - low_start_bin) % BIN_COUNT;
                rel < low_bins
            };
            bins.phase_binning(is_low);
        }
    }

    #[test]
    fn locates_signal_window() {
        let mut bins = PhaseBins::new();
        for _ in 0..5 {
            feed_clean_second(&mut bins, 0, BINS_PER_200MS);
        }
        bins.phase_detection(PhaseKernel::Uniform);
        assert_eq!(bins.max_index(), 0);
        assert!(bins.quality_factor() > 0);
    }

    #[test]
    fn quality_zero_with_no_signal() {
        let mut bins = PhaseBins::new();
        bins.phase_detection(PhaseKernel::Uniform);
        assert_eq!(bins.quality_factor(), 0);
    }
}
