//! Frequency-control bound and EEPROM round-trip properties (spec
//! properties 11, 12, scenario E6), driven through the public crate API.

use longwave_clock::config::Config;
use longwave_clock::eeprom;
use longwave_clock::error::EepromError;
use longwave_clock::freq_control::{FrequencyControl, CALIBRATION_SECOND};
use longwave_clock::platform::EepromStorage;

struct MockEeprom {
    cells: std::collections::HashMap<u16, u8>,
}

impl MockEeprom {
    fn new() -> Self {
        MockEeprom { cells: std::collections::HashMap::new() }
    }
}

impl EepromStorage for MockEeprom {
    fn read(&mut self, addr: u16) -> u8 {
        *self.cells.get(&addr).unwrap_or(&0)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.cells.insert(addr, value);
    }
}

#[test]
fn eeprom_round_trip_and_corruption_detection() {
    let mut storage = MockEeprom::new();
    eeprom::store(&mut storage, 0, 3, -900);
    assert_eq!(eeprom::load(&mut storage, 0), Ok((3, -900)));

    let original = storage.read(4);
    storage.write(4, original ^ 0xff);
    assert_eq!(eeprom::load(&mut storage, 0), Err(EepromError::PayloadMismatch));
}

#[test]
fn frequency_trim_stays_within_clamp_over_many_cycles() {
    // E6: simulate many minutes with a deliberate, consistent offset and
    // confirm the trim never escapes its documented bound, converging
    // towards the expected direction.
    let mut fc = FrequencyControl::new(Config::default());
    let mut last_persisted = None;

    for _ in 0..10 {
        fc.arm(CALIBRATION_SECOND, true);
        for minute in 0..400 {
            if let Some(persisted) = fc.on_minute_elapsed(false, 40) {
                last_persisted = Some(persisted);
            }
            let _ = minute;
        }
    }

    assert!(fc.adjust_pp16m() <= 1600 && fc.adjust_pp16m() >= -1600);
    assert!(last_persisted.is_some());
}
