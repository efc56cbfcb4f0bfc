use bitfield_struct::bitfield;

/// SCK rate select (SPR1:0).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockRate {
    /// CPU clock / 4.
    Div4 = 0,
    /// CPU clock / 16.
    Div16 = 1,
    /// CPU clock / 64.
    Div64 = 2,
    /// CPU clock / 128.
    #[default]
    Div128 = 3,
}

impl ClockRate {
    /// CPU cycles per shifted bit.
    ///
    /// `double_speed` mirrors the SPI2X bit of [`Spsr`] and halves the divider.
    pub const fn divider(self, double_speed: bool) -> u32 {
        let divider = match self {
            ClockRate::Div4 => 4,
            ClockRate::Div16 => 16,
            ClockRate::Div64 => 64,
            ClockRate::Div128 => 128,
        };
        if double_speed { divider / 2 } else { divider }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }

    const fn from_bits(value: u8) -> Self {
        match value & 0x03 {
            0 => ClockRate::Div4,
            1 => ClockRate::Div16,
            2 => ClockRate::Div64,
            _ => ClockRate::Div128,
        }
    }
}

/// SPI control register.
///
/// | Bit | Name | Description |
/// |-----|------|-------------|
/// | 0-1 | SPR  | Clock rate |
/// | 2   | CPHA | Clock phase |
/// | 3   | CPOL | Clock polarity |
/// | 4   | MSTR | Master mode |
/// | 5   | DORD | Data order, set for LSB first |
/// | 6   | SPE  | Peripheral enable |
/// | 7   | SPIE | Transfer complete interrupt enable |
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Spcr {
    /// Clock rate.
    #[bits(2)]
    pub rate: ClockRate,
    /// Sample on the trailing edge.
    pub cpha: bool,
    /// Clock idles high.
    pub cpol: bool,
    /// Master mode.
    pub master: bool,
    /// Shift the least significant bit first.
    pub lsb_first: bool,
    /// Enable the peripheral.
    pub enable: bool,
    /// Raise an interrupt when a transfer completes.
    pub interrupt: bool,
}

/// SPI status register.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Spsr {
    /// SPI2X: double the clock rate.
    pub double_speed: bool,
    #[bits(5)]
    __: u8,
    /// WCOL: the data register was written during a transfer.
    pub write_collision: bool,
    /// SPIF: a transfer has completed. Cleared by reading the data register.
    pub transfer_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_layout() {
        let spcr = Spcr::new()
            .with_rate(ClockRate::Div128)
            .with_master(true)
            .with_enable(true)
            .with_interrupt(true);
        assert_eq!(spcr.into_bits(), 0b1101_0011);
        assert_eq!(Spcr::from_bits(0x51).rate(), ClockRate::Div16);
        assert!(!Spcr::from_bits(0x51).interrupt());
    }

    #[test]
    fn status_flags() {
        let spsr = Spsr::from_bits(0x80);
        assert!(spsr.transfer_complete());
        assert!(!spsr.write_collision());
        assert_eq!(Spsr::new().with_double_speed(true).into_bits(), 0x01);
    }

    #[test]
    fn double_speed_halves_divider() {
        assert_eq!(ClockRate::Div128.divider(false), 128);
        assert_eq!(ClockRate::Div128.divider(true), 64);
        assert_eq!(ClockRate::Div4.divider(true), 2);
    }
}
