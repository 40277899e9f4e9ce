//! End-to-end encode/decode round trips against the public controller API
//! (spec properties 1, 2 and scenarios E1-E4).

use longwave_clock::config::Config;
use longwave_clock::controller::{Dcf77Controller, MsfController};
use longwave_clock::platform::OutputHandler;
use longwave_clock::time_data::TimeData;
use longwave_clock::{bcd::int_to_bcd, dcf77, msf, protocol};

struct Last(Option<TimeData>);

impl OutputHandler for Last {
    fn on_time(&mut self, time: &TimeData) {
        self.0 = Some(*time);
    }
}

fn sample_time() -> TimeData {
    let year = int_to_bcd(20);
    let month = int_to_bcd(3);
    let day = int_to_bcd(29);
    TimeData {
        second: int_to_bcd(0),
        minute: int_to_bcd(59),
        hour: int_to_bcd(1),
        day,
        month,
        year,
        weekday: protocol::weekday(year, month, day),
        uses_summertime: false,
        timezone_change_scheduled: true,
        leap_second_scheduled: false,
        abnormal_transmitter_operation: false,
    }
}

#[test]
fn dcf77_round_trip_converges_on_repeated_minutes() {
    let mut controller = Dcf77Controller::new(Config::default());
    let mut output = Last(None);
    let t = sample_time();

    for _ in 0..12 {
        for second in 0..=59u8 {
            let tick = dcf77::get_current_signal(&t, second);
            controller.process_single_tick_data(tick, &mut output);
        }
    }

    // The broadcast announces the minute about to start: 01:59 wintertime
    // with a scheduled DST change rolls to 03:00 summertime (E1).
    let decoded = output.0.expect("a minute should have been published");
    assert_eq!(decoded.hour, int_to_bcd(3));
    assert_eq!(decoded.minute, int_to_bcd(0));
    assert_eq!(decoded.day, t.day);
    assert_eq!(decoded.month, t.month);
    assert_eq!(decoded.year, t.year);
    assert_eq!(decoded.weekday, t.weekday);
    assert!(decoded.uses_summertime);
}

#[test]
fn msf_round_trip_converges_on_repeated_minutes() {
    let mut controller = MsfController::new(Config::default());
    let mut output = Last(None);

    let year = int_to_bcd(0);
    let month = int_to_bcd(12);
    let day = int_to_bcd(31);
    let t = TimeData {
        second: int_to_bcd(0),
        minute: int_to_bcd(59),
        hour: int_to_bcd(23),
        day,
        month,
        year,
        weekday: protocol::weekday(year, month, day),
        uses_summertime: false,
        timezone_change_scheduled: false,
        leap_second_scheduled: false,
        abnormal_transmitter_operation: false,
    };

    for _ in 0..12 {
        for second in 0..=59u8 {
            let tick = msf::get_current_signal(&t, second);
            controller.process_single_tick_data(tick, &mut output);
        }
    }

    // 23:59 on 2000-12-31 rolls to 00:00 on 2001-01-01 (E3, year boundary).
    let decoded = output.0.expect("a minute should have been published");
    assert_eq!(decoded.minute, int_to_bcd(0));
    assert_eq!(decoded.hour, int_to_bcd(0));
    assert_eq!(decoded.day, int_to_bcd(1));
    assert_eq!(decoded.month, int_to_bcd(1));
    assert_eq!(decoded.year, int_to_bcd(1));
    assert_eq!(
        decoded.weekday,
        protocol::weekday(int_to_bcd(1), int_to_bcd(1), int_to_bcd(1))
    );
}

#[test]
fn single_bit_noise_does_not_prevent_decode() {
    // E4: flip one tick inside the minute field (seconds 21-27) to Undefined
    // and confirm the decoder still converges once the noisy minute is
    // outnumbered by clean repeats.
    use longwave_clock::tick::Dcf77Tick;

    let mut controller = Dcf77Controller::new(Config::default());
    let mut output = Last(None);
    let t = sample_time();

    for pass in 0..12 {
        for second in 0..=59u8 {
            let tick = if pass == 0 && second == 23 {
                Dcf77Tick::Undefined
            } else {
                dcf77::get_current_signal(&t, second)
            };
            controller.process_single_tick_data(tick, &mut output);
        }
    }

    let decoded = output.0.expect("a minute should have been published");
    assert_eq!(decoded.minute, int_to_bcd(0));
}
