use bitfield_struct::bitfield;
use portable_atomic::{AtomicU8, Ordering};

/// Bus operation performed by one issued command.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Reset pulse followed by presence detection.
    ResetPulse = 0,
    /// One read time slot.
    ReadBit = 1,
    /// One write time slot.
    WriteBit = 2,
}

impl Operation {
    const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::ResetPulse),
            1 => Some(Self::ReadBit),
            2 => Some(Self::WriteBit),
            _ => None,
        }
    }
}

/// A bit-level command: an operation and its parameter bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    op: Operation,
    param: bool,
}

impl Command {
    /// Reset pulse with presence detection.
    pub const fn reset() -> Self {
        Self {
            op: Operation::ResetPulse,
            param: false,
        }
    }

    /// Read one bit.
    pub const fn read_bit() -> Self {
        Self {
            op: Operation::ReadBit,
            param: false,
        }
    }

    /// Write one bit.
    pub const fn write_bit(bit: bool) -> Self {
        Self {
            op: Operation::WriteBit,
            param: bit,
        }
    }

    /// The operation of this command.
    pub const fn operation(&self) -> Operation {
        self.op
    }

    /// The parameter bit: the value to write for [`Operation::WriteBit`],
    /// `false` otherwise.
    pub const fn param(&self) -> bool {
        self.param
    }
}

/// Packed progress of the sequence in flight.
///
/// | Bit | Description |
/// |-----|-------------|
/// | 0-3 | Progress: index of the next step in the operation's table |
/// | 4-5 | Operation code (`0` reset, `1` read, `2` write, `3` invalid) |
/// | 6   | Result: presence, sampled bit or bit to write |
/// | 7   | Ready: the sequence has completed |
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct StepCode {
    /// Index of the step the next tick performs.
    #[bits(4)]
    pub progress: u8,
    #[bits(2)]
    op: u8,
    /// Presence for a reset, the sampled level for a read, the bit being
    /// written for a write.
    pub result: bool,
    /// Set once, when the terminal step has run.
    pub ready: bool,
}

impl StepCode {
    /// Step code at the start of `command`: progress 0, ready clear.
    pub const fn armed(command: Command) -> Self {
        let result = matches!(command.op, Operation::WriteBit) && command.param;
        Self::new()
            .with_op(command.op as u8)
            .with_result(result)
    }

    /// The encoded operation, or `None` for the invalid code.
    pub const fn operation(&self) -> Option<Operation> {
        Operation::from_code(self.op())
    }

    /// The same code with progress moved to the next step.
    pub const fn advanced(self) -> Self {
        self.with_progress(self.progress() + 1)
    }
}

/// The step code shared between the interrupt handler and the caller.
///
/// Every access is a single load or store of one byte, which is atomic on
/// all targets, including 8-bit ones.
#[derive(Debug)]
pub struct StepCell(AtomicU8);

impl StepCell {
    /// Creates an idle cell (ready set, nothing in flight).
    pub const fn new() -> Self {
        Self(AtomicU8::new(StepCode::new().with_ready(true).into_bits()))
    }

    /// Reads the current step code.
    pub fn load(&self) -> StepCode {
        StepCode::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Publishes a new step code.
    pub fn store(&self, code: StepCode) {
        self.0.store(code.into_bits(), Ordering::Release);
    }

    /// Starts `command`: clears ready and resets progress.
    pub fn arm(&self, command: Command) {
        self.store(StepCode::armed(command));
    }

    /// Whether the last issued sequence has completed.
    pub fn is_ready(&self) -> bool {
        self.load().ready()
    }
}

impl Default for StepCell {
    fn default() -> Self {
        Self::new()
    }
}
