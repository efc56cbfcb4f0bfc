#![no_std]
#![deny(missing_docs)]

/*! # slotwire-shift
 *
 * A 1-Wire engine that forms time slots by clocking fixed byte patterns
 * through a synchronous serial shift register. The data output drives the bus
 * through an open-drain stage (a `0` bit pulls the line low) and the data
 * input reads the line back, so every transfer both generates a waveform and
 * samples it eight times.
 *
 * - A reset is a run of `0x00` transfers covering the reset pulse, then a run
 *   of `0xff` transfers listening for presence. Any low sample while
 *   listening is a presence pulse.
 * - A read is one `0x7f` transfer; the device's `0` shows up in the samples
 *   after the first bit, starting one and a half bit times into the slot.
 * - A write is one transfer, `0x01` for a `0` and `0x7f` for a `1`.
 *
 * Two variants share the same schedule. [`ShiftClockEngine`] advances on the
 * transfer complete interrupt behind [`InterruptDriven`];
 * [`PolledShiftClock`] advances when the caller polls the transfer complete
 * flag.
 */

pub use slotwire::{InterruptDriven, OneWire, OneWireError, OneWireMaster, OneWireResult};
mod engine;
mod error;
mod polled;
mod registers;
mod schedule;
mod traits;

pub use error::ShiftError;
pub use polled::PolledShiftClock;
pub use registers::{ClockRate, Spcr, Spsr};
pub use schedule::{
    PATTERN_LONG_LOW, PATTERN_LOW, PATTERN_RELEASED, PATTERN_SHORT_LOW, ShiftSchedule, ShiftStep,
};
pub use traits::ShiftPort;

use slotwire::SlotTiming;

/// Default CPU clock, a UART-friendly 14.7456 MHz crystal.
pub const DEFAULT_CPU_HZ: u32 = 14_745_600;

/// Maximum number of transfers in a reset sequence, bounded by the 4-bit
/// progress field of the step code.
pub const MAX_RESET_TRANSFERS: u32 = 15;

/// An interrupt-driven shift-register 1-Wire engine.
///
/// Wrap it in [`InterruptDriven`] and call [`InterruptDriven::on_interrupt`]
/// from the transfer complete handler.
pub struct ShiftClockEngine<P> {
    pub(crate) port: P,
    pub(crate) schedule: ShiftSchedule,
    pub(crate) control: Spcr,
}

impl<P> ShiftClockEngine<P> {
    /// The transfer counts in use.
    pub fn schedule(&self) -> &ShiftSchedule {
        &self.schedule
    }

    /// Gives back the port.
    pub fn release(self) -> P {
        self.port
    }
}

/// Builder for the shift engines.
///
/// The default is a 14.7456 MHz CPU clock divided by 128, which gives
/// 8.68 us per bit and 69.4 us per transfer.
pub struct ShiftClockBuilder {
    pub(crate) cpu_hz: u32,
    pub(crate) rate: ClockRate,
    pub(crate) double_speed: bool,
    pub(crate) timing: SlotTiming,
}

impl Default for ShiftClockBuilder {
    fn default() -> Self {
        ShiftClockBuilder {
            cpu_hz: DEFAULT_CPU_HZ,
            rate: ClockRate::Div128,
            double_speed: false,
            timing: SlotTiming::STANDARD,
        }
    }
}

impl ShiftClockBuilder {
    /// Sets the CPU clock feeding the shift clock divider.
    pub fn with_cpu_hz(mut self, cpu_hz: u32) -> Self {
        self.cpu_hz = cpu_hz;
        self
    }

    /// Sets the shift clock divider.
    pub fn with_rate(mut self, rate: ClockRate) -> Self {
        self.rate = rate;
        self
    }

    /// Halves the shift clock divider.
    pub fn with_double_speed(mut self, double_speed: bool) -> Self {
        self.double_speed = double_speed;
        self
    }

    /// Sets the slot timing.
    pub fn with_timing(mut self, timing: SlotTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Duration of one shifted bit in nanoseconds, saturating.
    pub fn bit_nanos(&self) -> u32 {
        let cycles = self.rate.divider(self.double_speed) as u64 * 1_000_000_000;
        match self.cpu_hz {
            0 => u32::MAX,
            hz => (cycles / hz as u64).min(u32::MAX as u64) as u32,
        }
    }

    /// Derives the transfer counts of the reset sequence.
    ///
    /// # Errors
    /// - [`ShiftError::BitTime`] if seven bits are shorter than a write-0 or
    ///   one bit outlasts the read sample point.
    /// - [`ShiftError::ResetTooLong`] if the reset needs more than
    ///   [`MAX_RESET_TRANSFERS`] transfers.
    pub fn schedule(&self) -> Result<ShiftSchedule, ShiftError> {
        let cpu_hz = self.cpu_hz as u64;
        // Durations compared as CPU cycles times one million.
        let bit = self.rate.divider(self.double_speed) as u64 * 1_000_000;
        let micros = |us: u32| us as u64 * cpu_hz;
        let timing = &self.timing;
        if cpu_hz == 0
            || 7 * bit < micros(timing.write_low + timing.write_zero_hold)
            || bit > micros(timing.read_low + timing.read_settle)
        {
            return Err(ShiftError::BitTime {
                nanos: self.bit_nanos(),
            });
        }
        let transfer = 8 * bit;
        let low = micros(timing.reset_low).div_ceil(transfer).max(1);
        let listen = micros(timing.presence_window).div_ceil(transfer).max(1);
        let transfers = low + listen;
        if transfers > MAX_RESET_TRANSFERS as u64 {
            return Err(ShiftError::ResetTooLong {
                transfers: transfers.min(u32::MAX as u64) as u32,
            });
        }
        Ok(ShiftSchedule::new(low as u8, listen as u8))
    }

    fn configure<P: ShiftPort>(&self, port: &mut P) -> Spcr {
        let control = Spcr::new()
            .with_rate(self.rate)
            .with_master(true)
            .with_enable(true);
        port.set_status(Spsr::new().with_double_speed(self.double_speed));
        port.set_control(control);
        control
    }

    /// Builds the interrupt-driven engine. The port is left enabled in
    /// master mode with its interrupt disabled until the first command.
    pub fn build<P: ShiftPort>(self, mut port: P) -> Result<ShiftClockEngine<P>, ShiftError> {
        let schedule = self.schedule()?;
        let control = self.configure(&mut port);
        Ok(ShiftClockEngine {
            port,
            schedule,
            control,
        })
    }

    /// Builds the polled variant. Its interrupt stays disabled.
    pub fn build_polled<P: ShiftPort>(self, mut port: P) -> Result<PolledShiftClock<P>, ShiftError> {
        let schedule = self.schedule()?;
        self.configure(&mut port);
        Ok(PolledShiftClock::new(port, schedule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_gives_eleven_reset_transfers() {
        let builder = ShiftClockBuilder::default();
        assert_eq!(builder.bit_nanos(), 8680);
        let schedule = builder.schedule().unwrap();
        assert_eq!(schedule.reset_low(), 7);
        assert_eq!(schedule.reset_listen(), 4);
    }

    #[test]
    fn bit_time_must_fit_the_slots() {
        // 8 us bits: seven of them are shorter than a write-0.
        assert_eq!(
            ShiftClockBuilder::default()
                .with_cpu_hz(16_000_000)
                .schedule(),
            Err(ShiftError::BitTime { nanos: 8000 })
        );
        assert!(matches!(
            ShiftClockBuilder::default()
                .with_double_speed(true)
                .schedule(),
            Err(ShiftError::BitTime { .. })
        ));
        // 16 us bits outlast the read sample point.
        assert!(matches!(
            ShiftClockBuilder::default()
                .with_cpu_hz(8_000_000)
                .schedule(),
            Err(ShiftError::BitTime { nanos: 16_000 })
        ));
        assert!(matches!(
            ShiftClockBuilder::default().with_cpu_hz(0).schedule(),
            Err(ShiftError::BitTime { nanos: u32::MAX })
        ));
    }

    #[test]
    fn long_reset_is_rejected() {
        let timing = SlotTiming {
            reset_low: 960,
            ..SlotTiming::STANDARD
        };
        assert_eq!(
            ShiftClockBuilder::default().with_timing(timing).schedule(),
            Err(ShiftError::ResetTooLong { transfers: 18 })
        );
    }
}
