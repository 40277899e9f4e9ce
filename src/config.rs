//! Tunable constants gathered into one struct rather than scattered
//! `const`s, so a host can override them (e.g. a faster `max_unlocked`
//! for bench testing) without forking the crate.

/// Runtime-tunable knobs for the local clock FSM and frequency-control
/// loop. Every field has a default matching the values named throughout
/// §4.8/§4.9.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Seconds an unlocked clock may free-run before demotion to `free`,
    /// with an untuned crystal (§4.8).
    pub max_unlocked_seconds_untuned: u32,
    /// Same, once the crystal is deemed tuned (§4.8).
    pub max_unlocked_seconds_tuned: u32,
    /// Milliseconds of missing 1 kHz ticks before demotion to `unlocked`
    /// (§5 "Cancellation and timeouts").
    pub missed_tick_demotion_ms: u32,
    /// Quality factor required, per second, to remain `locked` (§4.8).
    pub locked_quality_threshold: u8,
    /// Minimum elapsed minutes before a frequency-control readjustment is
    /// considered, provided the deviation threshold is also met (§4.9).
    pub tau_min_minutes: u32,
    /// Elapsed minutes after which a readjustment is forced regardless of
    /// deviation (§4.9).
    pub tau_max_minutes: u32,
    /// Minimum `|deviation|` in ticks to trigger a `tau_min`-gated
    /// readjustment (§4.9).
    pub deviation_threshold_ticks: i32,
    /// Clamp applied to the persisted frequency trim, in pp16m (§4.9,
    /// §8 property 12).
    pub adjust_clamp_pp16m: i32,
    /// EEPROM byte address of the 8-byte calibration record (§4.9).
    pub eeprom_base: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_unlocked_seconds_untuned: 3000,
            max_unlocked_seconds_tuned: 30000,
            missed_tick_demotion_ms: 1150,
            locked_quality_threshold: 11,
            tau_min_minutes: 334,
            tau_max_minutes: 5334,
            deviation_threshold_ticks: 5,
            adjust_clamp_pp16m: 1600,
            eeprom_base: 0,
        }
    }
}
