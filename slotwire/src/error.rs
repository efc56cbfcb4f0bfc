/// One wire communication error type.
#[derive(Debug, PartialEq, Eq)]
pub enum OneWireError<E> {
    /// Encapsulates the error type from the underlying hardware.
    Other(E),
    /// Indicates that no device answered the reset pulse.
    NoDevicePresent,
    /// A command was issued while the previous sequence had not completed.
    BusInUse,
    /// The sequence did not report ready within the configured poll budget.
    ///
    /// Only returned when a bound was set with
    /// [`OneWireMaster::with_timeout`](crate::OneWireMaster::with_timeout).
    Timeout,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Other(other)
    }
}
