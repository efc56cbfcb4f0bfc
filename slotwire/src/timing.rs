/// Time slot segments of the bus family, in microseconds.
///
/// Engines turn these into their own step tables: the timer engine programs
/// one reload per segment, the shift engine rounds whole phases up to a number
/// of fixed-length transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTiming {
    /// Reset pulse low time (tRSTL).
    pub reset_low: u32,
    /// Release to first presence sample.
    pub presence_settle: u32,
    /// Spacing between the two presence samples.
    pub presence_spacing: u32,
    /// Remainder of the reset slot after the last presence sample.
    pub reset_recovery: u32,
    /// Time after release during which a presence pulse may still be seen.
    pub presence_window: u32,
    /// Low pulse that opens a read slot.
    pub read_low: u32,
    /// Release to sample point of a read slot.
    pub read_settle: u32,
    /// Sample point to end of the read slot.
    pub read_recovery: u32,
    /// Low pulse that opens a write slot (and the whole low time of a 1).
    pub write_low: u32,
    /// Additional low time of a 0.
    pub write_zero_hold: u32,
    /// High time after a write slot before the next slot starts.
    pub write_recovery: u32,
}

impl SlotTiming {
    /// Standard-speed timing.
    pub const STANDARD: Self = Self {
        reset_low: 480,
        presence_settle: 70,
        presence_spacing: 30,
        reset_recovery: 380,
        presence_window: 240,
        read_low: 2,
        read_settle: 10,
        read_recovery: 50,
        write_low: 5,
        write_zero_hold: 55,
        write_recovery: 5,
    };

    /// Time from the release of the reset pulse to the end of the slot.
    pub const fn reset_high(&self) -> u32 {
        self.presence_settle + self.presence_spacing + self.reset_recovery
    }

    /// Total read slot length.
    pub const fn read_slot(&self) -> u32 {
        self.read_low + self.read_settle + self.read_recovery
    }

    /// Total write slot length.
    pub const fn write_slot(&self) -> u32 {
        self.write_low + self.write_zero_hold + self.write_recovery
    }
}

impl Default for SlotTiming {
    fn default() -> Self {
        Self::STANDARD
    }
}
