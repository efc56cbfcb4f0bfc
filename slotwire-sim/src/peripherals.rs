use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use slotwire_shift::{ShiftPort, Spcr, Spsr};
use slotwire_timer::{OverflowTimer, Tccr0, Timsk};

use crate::board::{SharedMachine, with_machine};

/// Open-drain bus pin: `set_low` pulls the line down, `set_high` releases
/// it, reads return the line level.
pub struct SimPin {
    machine: SharedMachine,
}

impl SimPin {
    pub(crate) fn new(machine: SharedMachine) -> Self {
        Self { machine }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        with_machine(&self.machine, |m| m.set_pin_low(true));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        with_machine(&self.machine, |m| m.set_pin_low(false));
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(with_machine(&self.machine, |m| m.line_high()))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Timer/Counter0 in normal mode.
pub struct SimTimer {
    machine: SharedMachine,
}

impl SimTimer {
    pub(crate) fn new(machine: SharedMachine) -> Self {
        Self { machine }
    }
}

impl OverflowTimer for SimTimer {
    fn set_counter(&mut self, value: u8) {
        with_machine(&self.machine, |m| m.set_timer_counter(value));
    }

    fn set_control(&mut self, control: Tccr0) {
        with_machine(&self.machine, |m| m.set_timer_control(control));
    }

    fn set_interrupt_mask(&mut self, mask: Timsk) {
        with_machine(&self.machine, |m| m.timer.mask = mask);
    }
}

/// The SPI peripheral with MOSI driving the line through an open-drain
/// stage and MISO reading it back.
pub struct SimShiftPort {
    machine: SharedMachine,
}

impl SimShiftPort {
    pub(crate) fn new(machine: SharedMachine) -> Self {
        Self { machine }
    }
}

impl ShiftPort for SimShiftPort {
    fn set_control(&mut self, control: Spcr) {
        with_machine(&self.machine, |m| m.spi.control = control);
    }

    fn set_status(&mut self, status: Spsr) {
        with_machine(&self.machine, |m| {
            m.spi.status = m.spi.status.with_double_speed(status.double_speed())
        });
    }

    fn status(&mut self) -> Spsr {
        with_machine(&self.machine, |m| m.spi.status)
    }

    fn write_data(&mut self, byte: u8) {
        with_machine(&self.machine, |m| m.start_transfer(byte));
    }

    fn read_data(&mut self) -> u8 {
        with_machine(&self.machine, |m| {
            m.spi.status = m.spi.status.with_transfer_complete(false);
            m.spi.data
        })
    }
}
