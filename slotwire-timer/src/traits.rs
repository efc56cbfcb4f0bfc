use crate::registers::{Tccr0, Timsk};

/// Register access to an 8-bit timer/counter in normal (overflow) mode.
///
/// The engine owns the implementor for the lifetime of the program and
/// rewrites whole registers; implementations need no read-modify-write.
pub trait OverflowTimer {
    /// Writes the counter register (TCNT0).
    fn set_counter(&mut self, value: u8);
    /// Writes the control register (TCCR0); a stopped clock halts counting.
    fn set_control(&mut self, control: Tccr0);
    /// Writes the interrupt mask (TIMSK).
    fn set_interrupt_mask(&mut self, mask: Timsk);
}

impl<T: OverflowTimer + ?Sized> OverflowTimer for &mut T {
    fn set_counter(&mut self, value: u8) {
        T::set_counter(self, value)
    }

    fn set_control(&mut self, control: Tccr0) {
        T::set_control(self, control)
    }

    fn set_interrupt_mask(&mut self, mask: Timsk) {
        T::set_interrupt_mask(self, mask)
    }
}
