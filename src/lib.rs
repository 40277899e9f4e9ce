//! DCF77 / MSF longwave time-signal decoding and a disciplined local
//! clock built on top of it.
//!
//! The crate is organized bottom-up, matching the component table of the
//! design this core follows:
//!
//! - [`bcd`], [`arithmetic`], [`bins`] — packed BCD digits and the
//!   saturating bin-voting primitives everything else is built from.
//! - [`phase`] — locates the second boundary inside a 1 kHz sample
//!   stream.
//! - [`tick`] — classifies one located second into a DCF77 or MSF symbol.
//! - [`second_decoder`] — places the running second within the minute.
//! - [`fields`], [`flags`], [`time_data`] — calendar field voting, control
//!   bit integration, and the decoded instant they produce.
//! - [`protocol`] — calendar arithmetic (weekday, DST, leap seconds)
//!   shared by both signal families.
//! - [`dcf77`], [`msf`] — each protocol's bit map and encoder.
//! - [`bitstream`] — a naive, non-voting fallback decode for pre-lock
//!   display.
//! - [`clock`] — the local clock reliability FSM.
//! - [`freq_control`] — crystal calibration and persistence.
//! - [`controller`] — wires all of the above behind the public tick API.
//! - [`platform`], [`config`], [`error`], [`eeprom`] — the ambient host
//!   interface, tunables, error types and calibration storage.
#![cfg_attr(not(test), no_std)]

pub mod arithmetic;
pub mod bcd;
pub mod bins;
pub mod bitstream;
pub mod clock;
pub mod config;
pub mod controller;
pub mod dcf77;
pub mod eeprom;
pub mod error;
pub mod fields;
pub mod flags;
pub mod freq_control;
pub mod msf;
pub mod phase;
pub mod platform;
pub mod protocol;
pub mod second_decoder;
pub mod tick;
pub mod time_data;

pub use bcd::BcdDigit;
pub use clock::ClockState;
pub use config::Config;
pub use controller::{Dcf77Controller, MsfController};
pub use error::{EepromError, ProtocolError};
pub use platform::{EepromStorage, OutputHandler, SampleSource, TickGenerator};
pub use tick::{Dcf77Tick, MsfTick};
pub use time_data::TimeData;
