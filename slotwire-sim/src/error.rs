use core::convert::Infallible;

use slotwire_shift::ShiftError;
use slotwire_timer::TimerError;

#[derive(Debug, PartialEq, Eq)]
/// Errors setting up an engine on the simulated board
pub enum SimError {
    /// The timer engine rejected its configuration.
    Timer(TimerError<Infallible>),
    /// The shift engine rejected its configuration.
    Shift(ShiftError),
}

impl From<TimerError<Infallible>> for SimError {
    fn from(value: TimerError<Infallible>) -> Self {
        Self::Timer(value)
    }
}

impl From<ShiftError> for SimError {
    fn from(value: ShiftError) -> Self {
        Self::Shift(value)
    }
}
