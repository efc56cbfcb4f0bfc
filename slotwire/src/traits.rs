use crate::{
    Command, OneWireError, OneWireResult,
    consts::{ONEWIRE_MATCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD},
};

/// Blocking view of a 1-Wire bus.
///
/// Implementors provide the primitive slots; byte transfers and ROM
/// addressing are built on top of them.
pub trait OneWire {
    /// Error raised by the pin or peripheral behind the bus.
    type BusError;

    /// Sends a reset pulse and listens for a presence pulse.
    ///
    /// # Returns
    /// `true` if at least one device pulled the line low during the presence
    /// window. An empty bus is not an error.
    fn reset(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    /// # Returns
    /// The bit read from the bus.
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a byte to the 1-Wire bus, least significant bit first.
    /// # Arguments
    /// * `byte` - The byte to write to the bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    /// Reads a byte from the 1-Wire bus, least significant bit first.
    /// # Returns
    /// Byte read from the bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Writes every byte of `bytes` in order.
    fn write_bytes(&mut self, bytes: &[u8]) -> OneWireResult<(), Self::BusError> {
        for &b in bytes {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// Fills `buf` with bytes read from the bus.
    fn read_bytes(&mut self, buf: &mut [u8]) -> OneWireResult<(), Self::BusError> {
        for b in buf.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(())
    }

    /// Addresses devices on the 1-Wire bus.
    /// The first [`OneWire::read_byte`], [`OneWire::read_bit`], [`OneWire::write_byte`], [`OneWire::write_bit`] operation should be preceded by this method to address devices on the bus.
    /// # Arguments
    /// * `rom` - The ROM address of the device to address. Pass [`None`] to skip ROM addressing and address all devices on the bus.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] if nothing answered the reset pulse.
    fn address(&mut self, rom: Option<u64>) -> OneWireResult<(), Self::BusError> {
        if !self.reset()? {
            return Err(OneWireError::NoDevicePresent);
        }
        match rom {
            Some(rom) => {
                self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
                self.write_bytes(&rom.to_le_bytes())
            }
            None => self.write_byte(ONEWIRE_SKIP_ROM_CMD),
        }
    }
}

/// Caller-side handle of a slot engine: issue a bit command, then poll it.
///
/// This is the seam between the blocking façade and a backend. An
/// interrupt-driven backend only reads its shared step code in
/// [`poll`](SlotDriver::poll); a polled backend advances its state machine
/// there.
pub trait SlotDriver {
    /// Error of the underlying hardware.
    type Error;

    /// Issues `command`.
    ///
    /// # Errors
    /// [`OneWireError::BusInUse`] if the previous sequence has not completed.
    fn start(&mut self, command: Command) -> OneWireResult<(), Self::Error>;

    /// Checks the sequence in flight.
    ///
    /// # Returns
    /// `Some(result)` once the sequence is ready, `None` while it runs.
    fn poll(&mut self) -> OneWireResult<Option<bool>, Self::Error>;
}

impl<T: SlotDriver + ?Sized> SlotDriver for &mut T {
    type Error = T::Error;

    fn start(&mut self, command: Command) -> OneWireResult<(), Self::Error> {
        T::start(self, command)
    }

    fn poll(&mut self) -> OneWireResult<Option<bool>, Self::Error> {
        T::poll(self)
    }
}
