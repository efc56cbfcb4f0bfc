#[derive(Debug, PartialEq, Eq)]
/// Shift engine setup errors
pub enum ShiftError {
    /// The bit time cannot form read and write slots: seven bits are shorter
    /// than a write-0 low time, or one bit is longer than the release
    /// deadline of a write-1.
    BitTime {
        /// Duration of one shifted bit in nanoseconds.
        nanos: u32,
    },
    /// The reset sequence needs more transfers than the step code can count.
    ResetTooLong {
        /// Transfers needed for the reset low time and the presence window.
        transfers: u32,
    },
}
