use core::convert::Infallible;

use slotwire::{Command, OneWireError, OneWireResult, SlotDriver, StepCode};

use crate::{ShiftPort, ShiftSchedule, ShiftStep};

/// A shift-register 1-Wire engine advanced by the caller.
///
/// Every [`poll`](SlotDriver::poll) checks the transfer complete flag and,
/// if set, runs the same step as the interrupt handler of
/// [`ShiftClockEngine`](crate::ShiftClockEngine) would. No interrupt is used,
/// so the step code lives in the struct itself.
pub struct PolledShiftClock<P> {
    port: P,
    schedule: ShiftSchedule,
    code: StepCode,
}

impl<P> PolledShiftClock<P> {
    pub(crate) fn new(port: P, schedule: ShiftSchedule) -> Self {
        Self {
            port,
            schedule,
            code: StepCode::new().with_ready(true),
        }
    }

    /// Current step code.
    pub fn status(&self) -> StepCode {
        self.code
    }

    /// The transfer counts in use.
    pub fn schedule(&self) -> &ShiftSchedule {
        &self.schedule
    }

    /// Gives back the port.
    pub fn release(self) -> P {
        self.port
    }
}

impl<P: ShiftPort> SlotDriver for PolledShiftClock<P> {
    type Error = Infallible;

    fn start(&mut self, command: Command) -> OneWireResult<(), Self::Error> {
        if !self.code.ready() {
            return Err(OneWireError::BusInUse);
        }
        self.code = StepCode::armed(command);
        if let Some(pattern) = self.schedule.pattern(self.code) {
            self.port.write_data(pattern);
        }
        Ok(())
    }

    fn poll(&mut self) -> OneWireResult<Option<bool>, Self::Error> {
        if self.code.ready() {
            return Ok(Some(self.code.result()));
        }
        if !self.port.status().transfer_complete() {
            return Ok(None);
        }
        let captured = self.port.read_data();
        match self.schedule.advance(self.code, captured) {
            Some(ShiftStep::Transfer(code, pattern)) => {
                self.code = code;
                self.port.write_data(pattern);
                Ok(None)
            }
            Some(ShiftStep::Done(code)) => {
                self.code = code;
                Ok(Some(code.result()))
            }
            None => Ok(None),
        }
    }
}
