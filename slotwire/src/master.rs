use crate::{Command, OneWire, OneWireError, OneWireResult, SlotDriver};

/// Blocking 1-Wire master on top of a [`SlotDriver`].
///
/// Every operation issues bit commands one at a time and busy-waits for each
/// to report ready before issuing the next, so a backend never sees a command
/// while another is in flight. Bytes are eight bit commands, least
/// significant bit first.
///
/// By default the wait is unbounded: a backend that stops ticking without
/// reporting ready (see [`SlotEngine::tick`](crate::SlotEngine::tick)) hangs
/// the caller. [`with_timeout`](OneWireMaster::with_timeout) bounds it.
pub struct OneWireMaster<D> {
    driver: D,
    timeout: Option<u32>,
}

impl<D> OneWireMaster<D> {
    /// Creates a master with an unbounded wait.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            timeout: None,
        }
    }

    /// Bound each wait to `polls` unsuccessful polls, after which the
    /// operation fails with [`OneWireError::Timeout`].
    ///
    /// The sequence that timed out stays in flight; the backend keeps
    /// rejecting new commands until it reports ready.
    pub fn with_timeout(mut self, polls: u32) -> Self {
        self.timeout = Some(polls);
        self
    }

    /// Returns the driver.
    pub fn release(self) -> D {
        self.driver
    }
}

impl<D: SlotDriver> OneWireMaster<D> {
    fn execute(&mut self, command: Command) -> OneWireResult<bool, D::Error> {
        self.driver.start(command)?;
        self.wait_for_ready()
    }

    fn wait_for_ready(&mut self) -> OneWireResult<bool, D::Error> {
        let mut polls = 0u32;
        loop {
            if let Some(result) = self.driver.poll()? {
                return Ok(result);
            }
            if let Some(limit) = self.timeout {
                if polls >= limit {
                    return Err(OneWireError::Timeout);
                }
                polls += 1;
            }
            core::hint::spin_loop();
        }
    }
}

impl<D: SlotDriver> OneWire for OneWireMaster<D> {
    type BusError = D::Error;

    fn reset(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.execute(Command::reset())
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.execute(Command::write_bit(bit)).map(|_| ())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.execute(Command::read_bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operation;
    use core::convert::Infallible;

    /// Completes every command after `latency` polls and records what it saw.
    /// Reads answer with the bits queued in `reads`, LSB first.
    struct Scripted {
        latency: u32,
        pending: Option<(Command, u32)>,
        present: bool,
        reads: u32,
        written: u32,
        written_count: u32,
        issued_while_busy: bool,
    }

    impl Scripted {
        fn new(latency: u32) -> Self {
            Self {
                latency,
                pending: None,
                present: false,
                reads: 0,
                written: 0,
                written_count: 0,
                issued_while_busy: false,
            }
        }
    }

    impl SlotDriver for Scripted {
        type Error = Infallible;

        fn start(&mut self, command: Command) -> OneWireResult<(), Infallible> {
            if self.pending.is_some() {
                self.issued_while_busy = true;
                return Err(OneWireError::BusInUse);
            }
            self.pending = Some((command, 0));
            Ok(())
        }

        fn poll(&mut self) -> OneWireResult<Option<bool>, Infallible> {
            let Some((command, polls)) = self.pending.take() else {
                return Ok(None);
            };
            if polls < self.latency {
                self.pending = Some((command, polls + 1));
                return Ok(None);
            }
            let result = match command.operation() {
                Operation::ResetPulse => self.present,
                Operation::ReadBit => {
                    let bit = self.reads & 1 != 0;
                    self.reads >>= 1;
                    bit
                }
                Operation::WriteBit => {
                    self.written |= (command.param() as u32) << self.written_count;
                    self.written_count += 1;
                    command.param()
                }
            };
            Ok(Some(result))
        }
    }

    #[test]
    fn write_byte_sends_lsb_first() {
        let mut master = OneWireMaster::new(Scripted::new(3));
        master.write_byte(0xa5).unwrap();
        let driver = master.release();
        assert_eq!(driver.written_count, 8);
        assert_eq!(driver.written, 0xa5);
        assert!(!driver.issued_while_busy);
    }

    #[test]
    fn read_byte_assembles_lsb_first() {
        let mut driver = Scripted::new(2);
        driver.reads = 0b0011_0101;
        let mut master = OneWireMaster::new(&mut driver);
        assert_eq!(master.read_byte(), Ok(0x35));
        assert!(!driver.issued_while_busy);
    }

    #[test]
    fn reset_reports_presence() {
        let mut driver = Scripted::new(5);
        assert_eq!(OneWireMaster::new(&mut driver).reset(), Ok(false));
        driver.present = true;
        assert_eq!(OneWireMaster::new(&mut driver).reset(), Ok(true));
    }

    #[test]
    fn address_requires_presence() {
        let mut master = OneWireMaster::new(Scripted::new(0));
        assert_eq!(master.address(None), Err(OneWireError::NoDevicePresent));
        let mut driver = master.release();
        driver.present = true;
        let mut master = OneWireMaster::new(driver);
        master.address(None).unwrap();
        let driver = master.release();
        assert_eq!(driver.written, crate::ONEWIRE_SKIP_ROM_CMD as u32);
    }

    #[test]
    fn bounded_wait_times_out() {
        let mut master = OneWireMaster::new(Scripted::new(u32::MAX)).with_timeout(100);
        assert_eq!(master.reset(), Err(OneWireError::Timeout));
        // The stuck sequence keeps the bus busy.
        assert_eq!(master.read_bit(), Err(OneWireError::BusInUse));
    }
}
