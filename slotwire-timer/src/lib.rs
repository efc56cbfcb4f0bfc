#![no_std]
#![deny(missing_docs)]

/*! # slotwire-timer
 *
 * A 1-Wire engine that times every slot segment with an 8-bit counter in
 * overflow-interrupt mode. Each overflow runs one step: it stops the counter,
 * drives, releases or samples the bus pin, then reloads the counter with the
 * delay of the next segment.
 *
 * The bus pin must behave as an open-drain output: `set_low` pulls the line
 * down, `set_high` releases it to the pull-up, and reading it returns the
 * actual line level.
 */

pub use slotwire::{InterruptDriven, OneWire, OneWireError, OneWireMaster, OneWireResult};
mod engine;
mod error;
mod registers;
mod schedule;
mod traits;

pub use error::TimerError;
pub use registers::{ClockSelect, Tccr0, Timsk};
pub use schedule::{BIT_TICKS, PinAction, RESET_TICKS, Reload, TimerSchedule, TimerStep};
pub use traits::OverflowTimer;

use embedded_hal::digital::OutputPin;
use slotwire::SlotTiming;

/// Results of timer-engine setup calls.
pub type TimerResult<T, E> = Result<T, TimerError<E>>;

/// Default CPU clock, a UART-friendly 14.7456 MHz crystal.
pub const DEFAULT_CPU_HZ: u32 = 14_745_600;

/// A timer-driven 1-Wire engine.
///
/// Takes ownership of the open-drain bus pin (implementing
/// [`InputPin`](embedded_hal::digital::InputPin) and
/// [`OutputPin`]) and of the overflow timer. Wrap it in
/// [`InterruptDriven`] and call
/// [`InterruptDriven::on_interrupt`] from the overflow handler.
pub struct TimerTickEngine<P, T> {
    pub(crate) pin: P,
    pub(crate) timer: T,
    pub(crate) schedule: TimerSchedule,
}

impl<P, T> TimerTickEngine<P, T> {
    /// The step tables in use.
    pub fn schedule(&self) -> &TimerSchedule {
        &self.schedule
    }

    /// Gives back the pin and the timer.
    pub fn release(self) -> (P, T) {
        (self.pin, self.timer)
    }
}

/// Builder for creating a [`TimerTickEngine`] instance with custom configuration.
pub struct TimerTickBuilder {
    pub(crate) cpu_hz: u32,
    pub(crate) timing: SlotTiming,
}

impl Default for TimerTickBuilder {
    fn default() -> Self {
        TimerTickBuilder {
            cpu_hz: DEFAULT_CPU_HZ,
            timing: SlotTiming::STANDARD,
        }
    }
}

impl TimerTickBuilder {
    /// Sets the CPU clock feeding the timer prescaler.
    pub fn with_cpu_hz(mut self, cpu_hz: u32) -> Self {
        self.cpu_hz = cpu_hz;
        self
    }

    /// Sets the slot timing.
    pub fn with_timing(mut self, timing: SlotTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Builds the engine: computes the reload tables, releases the line,
    /// stops the counter and enables its overflow interrupt.
    pub fn build<P: OutputPin, T: OverflowTimer>(
        self,
        mut pin: P,
        mut timer: T,
    ) -> TimerResult<TimerTickEngine<P, T>, P::Error> {
        let schedule = TimerSchedule::new(&self.timing, self.cpu_hz)
            .map_err(|micros| TimerError::DelayOutOfRange { micros })?;
        pin.set_high()?;
        timer.set_control(Tccr0::new());
        timer.set_interrupt_mask(Timsk::new().with_overflow(true));
        Ok(TimerTickEngine {
            pin,
            timer,
            schedule,
        })
    }
}
