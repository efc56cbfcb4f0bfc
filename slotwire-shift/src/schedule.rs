use slotwire::{Operation, StepCode};

/// Transfer that holds the line low for its whole duration.
pub const PATTERN_LOW: u8 = 0x00;
/// Transfer that leaves the line released; used to listen.
pub const PATTERN_RELEASED: u8 = 0xff;
/// One bit-time low, then released: a write-1 or a read slot.
pub const PATTERN_SHORT_LOW: u8 = 0x7f;
/// Seven bit-times low, then one bit-time of recovery: a write-0 slot.
pub const PATTERN_LONG_LOW: u8 = 0x01;

/// Samples that must all read high for a read slot to return `1`: every
/// sample after the master's own low bit.
const READ_SAMPLE_MASK: u8 = 0x7f;

/// What the next tick does after a transfer has been folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftStep {
    /// Store the code and clock out the pattern.
    Transfer(StepCode, u8),
    /// Store the code; the sequence has completed.
    Done(StepCode),
}

/// Transfer counts of the reset sequence for one bit time.
///
/// Read and write slots always take a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSchedule {
    reset_low: u8,
    reset_listen: u8,
}

impl ShiftSchedule {
    pub(crate) const fn new(reset_low: u8, reset_listen: u8) -> Self {
        Self {
            reset_low,
            reset_listen,
        }
    }

    /// Transfers of `0x00` that form the reset pulse.
    pub const fn reset_low(&self) -> u8 {
        self.reset_low
    }

    /// Transfers of `0xff` spent listening for presence.
    pub const fn reset_listen(&self) -> u8 {
        self.reset_listen
    }

    /// Number of ticks (completed transfers) `op` takes.
    pub const fn ticks(&self, op: Operation) -> u8 {
        match op {
            Operation::ResetPulse => self.reset_low + self.reset_listen,
            Operation::ReadBit | Operation::WriteBit => 1,
        }
    }

    /// The pattern clocked out at the step recorded in `code`, `None` for an
    /// unknown step.
    pub fn pattern(&self, code: StepCode) -> Option<u8> {
        let op = code.operation()?;
        let progress = code.progress();
        if progress >= self.ticks(op) {
            return None;
        }
        Some(match op {
            Operation::ResetPulse if progress < self.reset_low => PATTERN_LOW,
            Operation::ResetPulse => PATTERN_RELEASED,
            Operation::ReadBit => PATTERN_SHORT_LOW,
            Operation::WriteBit if code.result() => PATTERN_SHORT_LOW,
            Operation::WriteBit => PATTERN_LONG_LOW,
        })
    }

    /// Folds the byte `captured` by the transfer at the step recorded in
    /// `code` into the result, then moves to the next step.
    ///
    /// Returns `None` for an unknown step.
    pub fn advance(&self, code: StepCode, captured: u8) -> Option<ShiftStep> {
        let op = code.operation()?;
        let progress = code.progress();
        if progress >= self.ticks(op) {
            return None;
        }
        let code = match op {
            // Any low sample while listening is a device pulling the line.
            Operation::ResetPulse
                if progress >= self.reset_low && captured != PATTERN_RELEASED =>
            {
                code.with_result(true)
            }
            Operation::ReadBit => code.with_result(captured & READ_SAMPLE_MASK == READ_SAMPLE_MASK),
            _ => code,
        };
        if progress + 1 == self.ticks(op) {
            return Some(ShiftStep::Done(code.with_ready(true)));
        }
        let next = code.advanced();
        let pattern = self.pattern(next)?;
        Some(ShiftStep::Transfer(next, pattern))
    }
}
