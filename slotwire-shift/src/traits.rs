use crate::registers::{Spcr, Spsr};

/// Register access to a synchronous serial shift peripheral in master mode.
///
/// The bus line is wired to the data output through an open-drain stage and
/// back to the data input: a shifted-out `0` pulls the line low, a `1`
/// releases it, and every bit shifted in is the line level sampled in the
/// middle of that bit.
pub trait ShiftPort {
    /// Writes the control register (SPCR).
    fn set_control(&mut self, control: Spcr);
    /// Writes the status register (SPSR); only SPI2X is writable.
    fn set_status(&mut self, status: Spsr);
    /// Reads the status register.
    fn status(&mut self) -> Spsr;
    /// Writes the data register (SPDR), starting a transfer.
    fn write_data(&mut self, byte: u8);
    /// Reads the data register: the byte captured by the last transfer.
    /// Clears the transfer complete flag.
    fn read_data(&mut self) -> u8;
}

impl<T: ShiftPort + ?Sized> ShiftPort for &mut T {
    fn set_control(&mut self, control: Spcr) {
        T::set_control(self, control)
    }

    fn set_status(&mut self, status: Spsr) {
        T::set_status(self, status)
    }

    fn status(&mut self) -> Spsr {
        T::status(self)
    }

    fn write_data(&mut self, byte: u8) {
        T::write_data(self, byte)
    }

    fn read_data(&mut self) -> u8 {
        T::read_data(self)
    }
}
