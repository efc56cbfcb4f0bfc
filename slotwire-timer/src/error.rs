#[derive(Debug, PartialEq, Eq)]
/// Timer engine setup errors
pub enum TimerError<E> {
    /// Error of the bus pin.
    Pin(E),
    /// A slot segment is longer than the 8-bit counter can time with the
    /// slowest prescaler, or the CPU clock is zero.
    DelayOutOfRange {
        /// The offending delay in microseconds.
        micros: u32,
    },
}

impl<E> From<E> for TimerError<E> {
    fn from(value: E) -> Self {
        Self::Pin(value)
    }
}
