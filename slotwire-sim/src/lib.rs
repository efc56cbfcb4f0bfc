/*! # slotwire-sim
 *
 * A host-side simulation of a 14.7456 MHz 8-bit microcontroller with one
 * open-drain 1-Wire line. It provides the bus pin, Timer/Counter0 and the SPI
 * peripheral to the `slotwire` engines, models the devices on the line, and
 * dispatches interrupts from a clock thread that moves simulated time from
 * one hardware event to the next.
 *
 * ```no_run
 * use slotwire_sim::{Board, EngineKind, devices::PresencePulse};
 *
 * let board = Board::new(PresencePulse::default());
 * let present = board
 *     .with_master(EngineKind::Timer, |bus| bus.reset())
 *     .unwrap();
 * assert_eq!(present, Ok(true));
 * ```
 */

mod board;
pub mod devices;
mod error;
mod peripherals;
mod thermometer;
mod wire;

pub use board::{Board, Interrupt};
pub use error::SimError;
pub use peripherals::{SimPin, SimShiftPort, SimTimer};
pub use thermometer::{CONVERSION_SLOTS, measure_temperature, read_rom};
pub use wire::{RESET_MIN_NS, Responder, Slot, ZERO_MIN_NS};

use core::convert::Infallible;

use slotwire::{InterruptDriven, OneWire, OneWireMaster};
use slotwire_shift::ShiftClockBuilder;
use slotwire_timer::TimerTickBuilder;

/// The engine realizing the bus operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EngineKind {
    /// Timer overflow interrupt, one pin.
    Timer,
    /// SPI transfer complete interrupt.
    Shift,
    /// SPI with the transfer complete flag polled by the caller.
    Polled,
}

impl Board {
    /// Builds an engine of `kind` with default settings on this board's
    /// peripherals and runs `f` with a blocking master on top of it.
    pub fn with_master<R>(
        &self,
        kind: EngineKind,
        f: impl FnOnce(&mut dyn OneWire<BusError = Infallible>) -> R,
    ) -> Result<R, SimError> {
        match kind {
            EngineKind::Timer => {
                let engine = TimerTickBuilder::default().build(self.pin(), self.timer())?;
                let bus = InterruptDriven::new(engine);
                Ok(self.run(|_| bus.on_interrupt(), || f(&mut OneWireMaster::new(&bus))))
            }
            EngineKind::Shift => {
                let engine = ShiftClockBuilder::default().build(self.shift_port())?;
                let bus = InterruptDriven::new(engine);
                Ok(self.run(|_| bus.on_interrupt(), || f(&mut OneWireMaster::new(&bus))))
            }
            EngineKind::Polled => {
                let clock = ShiftClockBuilder::default().build_polled(self.shift_port())?;
                Ok(self.run(|_| {}, || f(&mut OneWireMaster::new(clock))))
            }
        }
    }
}
