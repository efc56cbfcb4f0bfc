use bitfield_struct::bitfield;

/// Clock source of the 8-bit counter (CS02:0).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSelect {
    /// No clock source, the counter is stopped.
    Stopped = 0,
    /// CPU clock, no prescaling.
    Div1 = 1,
    /// CPU clock / 8.
    Div8 = 2,
    /// CPU clock / 64.
    Div64 = 3,
    /// CPU clock / 256.
    Div256 = 4,
    /// CPU clock / 1024.
    Div1024 = 5,
    /// External clock on T0, falling edge.
    ExternalFalling = 6,
    /// External clock on T0, rising edge.
    ExternalRising = 7,
}

impl ClockSelect {
    /// The internal prescaler settings, fastest first.
    pub const PRESCALED: [ClockSelect; 5] = [
        ClockSelect::Div1,
        ClockSelect::Div8,
        ClockSelect::Div64,
        ClockSelect::Div256,
        ClockSelect::Div1024,
    ];

    /// CPU cycles per counter increment, `None` when not clocked by the CPU.
    pub const fn divider(self) -> Option<u32> {
        match self {
            ClockSelect::Div1 => Some(1),
            ClockSelect::Div8 => Some(8),
            ClockSelect::Div64 => Some(64),
            ClockSelect::Div256 => Some(256),
            ClockSelect::Div1024 => Some(1024),
            _ => None,
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }

    const fn from_bits(value: u8) -> Self {
        match value & 0x07 {
            0 => ClockSelect::Stopped,
            1 => ClockSelect::Div1,
            2 => ClockSelect::Div8,
            3 => ClockSelect::Div64,
            4 => ClockSelect::Div256,
            5 => ClockSelect::Div1024,
            6 => ClockSelect::ExternalFalling,
            _ => ClockSelect::ExternalRising,
        }
    }
}

/// Timer/Counter0 control register.
///
/// Only the clock select field is used: the counter runs in normal mode and
/// every overflow from `0xff` to `0x00` raises the overflow interrupt.
/// Writing a control value with [`ClockSelect::Stopped`] halts the counter.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Tccr0 {
    /// Clock source.
    #[bits(3)]
    pub clock: ClockSelect,
    /// Waveform generation mode, bit 1.
    pub wgm01: bool,
    /// Compare output mode.
    #[bits(2)]
    pub com: u8,
    /// Waveform generation mode, bit 0.
    pub wgm00: bool,
    /// Force output compare.
    pub foc: bool,
}

/// Timer interrupt mask register, Timer/Counter0 bits.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Timsk {
    /// TOIE0: overflow interrupt enable.
    pub overflow: bool,
    /// OCIE0: compare match interrupt enable.
    pub compare_match: bool,
    #[bits(6)]
    __: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_encodes_clock_select() {
        assert_eq!(Tccr0::new().with_clock(ClockSelect::Div64).into_bits(), 0b011);
        assert_eq!(Tccr0::from_bits(0b0000_0101).clock(), ClockSelect::Div1024);
        assert_eq!(Tccr0::new().clock(), ClockSelect::Stopped);
    }

    #[test]
    fn mask_enables_overflow_only() {
        assert_eq!(Timsk::new().with_overflow(true).into_bits(), 0x01);
    }
}
