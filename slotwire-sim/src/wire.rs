use std::ops::Range;

/// Shortest low pulse a device takes as a reset, in nanoseconds.
pub const RESET_MIN_NS: u64 = 480_000;
/// Shortest low pulse a device reads as a written `0`, in nanoseconds.
pub const ZERO_MIN_NS: u64 = 15_000;

/// How a device classifies a low pulse of the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Reset pulse.
    Reset,
    /// Write slot carrying a `0`.
    Zero,
    /// Write slot carrying a `1`, or a read slot.
    One,
}

impl Slot {
    /// Classifies a pulse that kept the line low for `low_for` nanoseconds.
    pub fn classify(low_for: u64) -> Self {
        if low_for >= RESET_MIN_NS {
            Slot::Reset
        } else if low_for >= ZERO_MIN_NS {
            Slot::Zero
        } else {
            Slot::One
        }
    }
}

/// A device on the simulated line.
///
/// The wire reports the master's edges; a device answers with a window,
/// in nanoseconds, during which it holds the line low itself.
pub trait Responder: Send {
    /// The master pulled the line low at `at`.
    fn on_fall(&mut self, _at: u64) -> Option<Range<u64>> {
        None
    }

    /// The master released the line at `at` after holding it low for
    /// `low_for`.
    fn on_release(&mut self, at: u64, low_for: u64) -> Option<Range<u64>>;
}

/// Open-drain line: low while the master drives it or any device holds it.
pub struct Wire {
    responder: Box<dyn Responder>,
    driven_low: bool,
    fell_at: u64,
    holds: Vec<Range<u64>>,
}

impl Wire {
    pub(crate) fn new(responder: Box<dyn Responder>) -> Self {
        Self {
            responder,
            driven_low: false,
            fell_at: 0,
            holds: Vec::new(),
        }
    }

    /// Sets the master's drive at `at`, notifying the device on an edge.
    pub(crate) fn drive(&mut self, at: u64, low: bool) {
        if low == self.driven_low {
            return;
        }
        self.driven_low = low;
        self.holds.retain(|hold| hold.end > at);
        let hold = if low {
            self.fell_at = at;
            log::trace!("{at} ns: master pulls low");
            self.responder.on_fall(at)
        } else {
            let low_for = at - self.fell_at;
            log::trace!("{at} ns: master releases after {low_for} ns");
            self.responder.on_release(at, low_for)
        };
        if let Some(hold) = hold {
            log::trace!("device holds low over {hold:?} ns");
            self.holds.push(hold);
        }
    }

    /// Line level at `at`.
    pub(crate) fn is_high(&self, at: u64) -> bool {
        !self.driven_low && !self.holds.iter().any(|hold| hold.contains(&at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Responder for Echo {
        fn on_release(&mut self, at: u64, low_for: u64) -> Option<Range<u64>> {
            (Slot::classify(low_for) == Slot::Reset).then(|| at + 10..at + 20)
        }
    }

    #[test]
    fn pulses_are_classified_by_length() {
        assert_eq!(Slot::classify(480_000), Slot::Reset);
        assert_eq!(Slot::classify(60_760), Slot::Zero);
        assert_eq!(Slot::classify(8_680), Slot::One);
    }

    #[test]
    fn device_hold_pulls_released_line_low() {
        let mut wire = Wire::new(Box::new(Echo));
        assert!(wire.is_high(0));
        wire.drive(100, true);
        assert!(!wire.is_high(200));
        wire.drive(500_000, false);
        assert!(wire.is_high(500_005));
        assert!(!wire.is_high(500_010));
        assert!(wire.is_high(500_020));
        // Short pulses draw no answer.
        wire.drive(600_000, true);
        wire.drive(605_000, false);
        assert!(wire.is_high(605_015));
    }
}
