//! Local clock reliability FSM (§4.8): six states in decreasing order of
//! doubt, driven by two independent streams — the 1 Hz decoded-quality
//! callback and the 1 kHz phase-drift check.

use crate::config::Config;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClockState {
    /// No signal; time invalid.
    Useless,
    /// Quality > 0 but too low to trust; publish decoded time as-is.
    Dirty,
    /// Once-locked, now running on crystal alone past `max_unlocked`.
    Free,
    /// Once-locked, crystal running, may re-lock if phase returns.
    Unlocked,
    /// Advancing on crystal, phase trusted, quality holding up.
    Locked,
    /// Locked and overall quality > 1: fully trusted.
    Synced,
}

/// Side effects the controller must carry out in response to a
/// transition (§4.8).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClockEvent {
    /// Entering `useless`: the published time must be reset.
    TimeReset,
    /// Dropping out of `locked`/`synced`: every field decoder must be
    /// reset (§4.4, §7 "Phase glitch").
    PhaseLost,
}

pub struct LocalClock {
    state: ClockState,
    unlocked_seconds: u32,
    has_tuned_crystal: bool,
    config: Config,
}

impl LocalClock {
    pub fn new(config: Config) -> Self {
        LocalClock {
            state: ClockState::Useless,
            unlocked_seconds: 0,
            has_tuned_crystal: false,
            config,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn set_tuned_crystal(&mut self, tuned: bool) {
        self.has_tuned_crystal = tuned;
    }

    fn max_unlocked_seconds(&self) -> u32 {
        if self.has_tuned_crystal {
            self.config.max_unlocked_seconds_tuned
        } else {
            self.config.max_unlocked_seconds_untuned
        }
    }

    fn demote_to_unlocked(&mut self) -> Option<ClockEvent> {
        self.state = ClockState::Unlocked;
        self.unlocked_seconds = 0;
        Some(ClockEvent::PhaseLost)
    }

    /// 1 Hz callback: quality-factor gated transitions (§4.8).
    pub fn on_decoded_second(&mut self, quality_factor: u8, overall_quality: u8) -> Option<ClockEvent> {
        let threshold = self.config.locked_quality_threshold;
        match self.state {
            ClockState::Useless => {
                if quality_factor > 0 {
                    self.state = ClockState::Dirty;
                }
                None
            }
            ClockState::Dirty => {
                if quality_factor == 0 {
                    self.state = ClockState::Useless;
                    Some(ClockEvent::TimeReset)
                } else if quality_factor >= threshold {
                    self.state = ClockState::Unlocked;
                    self.unlocked_seconds = 0;
                    None
                } else {
                    None
                }
            }
            ClockState::Free => {
                if quality_factor >= threshold {
                    self.state = ClockState::Unlocked;
                    self.unlocked_seconds = 0;
                }
                None
            }
            ClockState::Unlocked => {
                self.unlocked_seconds += 1;
                if self.unlocked_seconds >= self.max_unlocked_seconds() {
                    self.state = ClockState::Free;
                }
                None
            }
            ClockState::Locked => {
                if quality_factor < threshold {
                    self.demote_to_unlocked()
                } else if overall_quality > 1 {
                    self.state = ClockState::Synced;
                    None
                } else {
                    None
                }
            }
            ClockState::Synced => {
                if quality_factor < threshold {
                    self.demote_to_unlocked()
                } else if overall_quality <= 1 {
                    self.state = ClockState::Locked;
                    None
                } else {
                    None
                }
            }
        }
    }

    /// 1 kHz callback: phase-drift gated. `tick_ms` is the offset of the
    /// current sample inside the located second (§4.8 "tick < 200 ms OR
    /// tick > 800 ms").
    pub fn on_tick_phase(&mut self, tick_ms: u16) {
        if self.state == ClockState::Unlocked && (tick_ms < 200 || tick_ms > 800) {
            self.state = ClockState::Locked;
            self.unlocked_seconds = 0;
        }
    }

    /// A 1 kHz tick drought longer than `missed_tick_demotion_ms` demotes
    /// `locked`/`synced` to `unlocked` (§5 "Cancellation and timeouts").
    pub fn on_missed_ticks(&mut self, gap_ms: u32) -> Option<ClockEvent> {
        if gap_ms > self.config.missed_tick_demotion_ms
            && matches!(self.state, ClockState::Locked | ClockState::Synced)
        {
            self.demote_to_unlocked()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn useless_to_dirty_on_any_quality() {
        let mut clock = LocalClock::new(Config::default());
        assert_eq!(clock.state(), ClockState::Useless);
        clock.on_decoded_second(1, 0);
        assert_eq!(clock.state(), ClockState::Dirty);
    }

    #[test]
    fn reaches_synced_through_phase_confirmation() {
        let mut clock = LocalClock::new(Config::default());
        clock.on_decoded_second(1, 0);
        assert_eq!(clock.state(), ClockState::Dirty);
        clock.on_decoded_second(12, 0);
        assert_eq!(clock.state(), ClockState::Unlocked);
        clock.on_tick_phase(900);
        assert_eq!(clock.state(), ClockState::Locked);
        clock.on_decoded_second(12, 2);
        assert_eq!(clock.state(), ClockState::Synced);
    }

    #[test]
    fn phase_loss_demotes_and_emits_event() {
        let mut clock = LocalClock::new(Config::default());
        clock.on_decoded_second(1, 0);
        clock.on_decoded_second(12, 0);
        clock.on_tick_phase(900);
        clock.on_decoded_second(12, 2);
        assert_eq!(clock.state(), ClockState::Synced);

        let event = clock.on_decoded_second(0, 0);
        assert_eq!(event, Some(ClockEvent::PhaseLost));
        assert_eq!(clock.state(), ClockState::Unlocked);
    }

    #[test]
    fn unlocked_times_out_to_free() {
        let mut config = Config::default();
        config.max_unlocked_seconds_untuned = 3;
        let mut clock = LocalClock::new(config);
        clock.on_decoded_second(1, 0);
        clock.on_decoded_second(12, 0);
        for _ in 0..3 {
            clock.on_decoded_second(0, 0);
        }
        assert_eq!(clock.state(), ClockState::Free);
    }

    #[test]
    fn missed_ticks_demote_locked_clock() {
        let mut clock = LocalClock::new(Config::default());
        clock.on_decoded_second(1, 0);
        clock.on_decoded_second(12, 0);
        clock.on_tick_phase(900);
        assert_eq!(clock.state(), ClockState::Locked);
        let event = clock.on_missed_ticks(2000);
        assert_eq!(event, Some(ClockEvent::PhaseLost));
        assert_eq!(clock.state(), ClockState::Unlocked);
    }
}
