//! Error types (§7). Nothing in the decoding pipeline panics in steady
//! state; these enums exist for the handful of structural failures that
//! are worth naming rather than silently degrading quality (§7 table).

/// Failures surfaced by the persistence layer (§4.9, §7 "Persisted EEPROM
/// corruption").
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum EepromError {
    #[error("eeprom marker bytes did not match")]
    BadMarker,
    #[error("eeprom doubled payload disagreed")]
    PayloadMismatch,
}

impl ufmt::uDisplay for EepromError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        match self {
            EepromError::BadMarker => f.write_str("eeprom marker bytes did not match"),
            EepromError::PayloadMismatch => f.write_str("eeprom doubled payload disagreed"),
        }
    }
}

/// Structural decoding failures worth naming explicitly; everything else
/// (noisy bits, phase glitches, missed ticks) is absorbed by the voters
/// and FSM rather than raised as an error (§7).
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("field value exceeds its valid BCD range")]
    FieldOutOfRange,
    #[error("requested a leap second outside its permitted slot")]
    InvalidLeapSecondSlot,
}

impl ufmt::uDisplay for ProtocolError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        match self {
            ProtocolError::FieldOutOfRange => f.write_str("field value exceeds its valid BCD range"),
            ProtocolError::InvalidLeapSecondSlot => {
                f.write_str("requested a leap second outside its permitted slot")
            }
        }
    }
}
