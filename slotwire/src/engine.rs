use core::{cell::RefCell, convert::Infallible};

use critical_section::Mutex;

use crate::{Command, OneWireError, OneWireResult, SlotDriver, StepCell, StepCode};

/// A backend that realizes the bus operations one tick at a time.
///
/// Implementations own their hardware handles (pin, timer, shift register)
/// and a backend-local step table. They never block.
pub trait SlotEngine {
    /// Arms the tick source so that the first step of `command` runs on the
    /// next tick.
    ///
    /// Runs in caller context with the handler masked; the step code has
    /// already been armed for `command`.
    fn prime(&mut self, command: Command);

    /// Performs the step recorded in `cell`, then either stores the advanced
    /// code and re-arms the tick source, or sets ready and leaves the tick
    /// source disabled.
    ///
    /// An unknown (operation, progress) pair disables the tick source without
    /// setting ready.
    fn tick(&mut self, cell: &StepCell);
}

/// An interrupt-driven engine together with its step code.
///
/// The engine sits behind a [`critical_section::Mutex`] so the handler and
/// [`SlotDriver::start`] never touch the hardware at the same time, while the
/// step code is polled lock-free.
///
/// ```ignore
/// static BUS: InterruptDriven<MyEngine> = InterruptDriven::new(MyEngine::new());
///
/// #[interrupt]
/// fn TIMER0_OVF() {
///     BUS.on_interrupt();
/// }
///
/// let mut master = OneWireMaster::new(&BUS);
/// let present = master.reset()?;
/// ```
pub struct InterruptDriven<E> {
    cell: StepCell,
    engine: Mutex<RefCell<E>>,
}

impl<E> InterruptDriven<E> {
    /// Wraps `engine`; the bus starts idle.
    pub const fn new(engine: E) -> Self {
        Self {
            cell: StepCell::new(),
            engine: Mutex::new(RefCell::new(engine)),
        }
    }

    /// Current step code.
    pub fn status(&self) -> StepCode {
        self.cell.load()
    }

    /// Runs `f` on the engine inside a critical section.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        critical_section::with(|cs| f(&mut self.engine.borrow_ref_mut(cs)))
    }

    /// Returns the engine.
    pub fn into_inner(self) -> E {
        self.engine.into_inner().into_inner()
    }
}

impl<E: SlotEngine> InterruptDriven<E> {
    /// Advances the sequence in flight by one step.
    ///
    /// Call this from the tick source's interrupt handler.
    pub fn on_interrupt(&self) {
        critical_section::with(|cs| self.engine.borrow_ref_mut(cs).tick(&self.cell));
    }
}

impl<E: SlotEngine> SlotDriver for &InterruptDriven<E> {
    type Error = Infallible;

    fn start(&mut self, command: Command) -> OneWireResult<(), Self::Error> {
        critical_section::with(|cs| {
            if !self.cell.is_ready() {
                return Err(OneWireError::BusInUse);
            }
            self.cell.arm(command);
            self.engine.borrow_ref_mut(cs).prime(command);
            Ok(())
        })
    }

    fn poll(&mut self) -> OneWireResult<Option<bool>, Self::Error> {
        let code = self.cell.load();
        Ok(code.ready().then_some(code.result()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Completes after `steps` ticks; copies the write parameter as result.
    struct Countdown {
        steps: u8,
        primed: u32,
        ticks: u32,
    }

    impl SlotEngine for Countdown {
        fn prime(&mut self, _command: Command) {
            self.primed += 1;
        }

        fn tick(&mut self, cell: &StepCell) {
            self.ticks += 1;
            let code = cell.load();
            if code.ready() {
                return;
            }
            if code.progress() + 1 == self.steps {
                cell.store(code.with_ready(true));
            } else {
                cell.store(code.advanced());
            }
        }
    }

    #[test]
    fn sequence_completes_after_its_ticks() {
        let bus = InterruptDriven::new(Countdown {
            steps: 3,
            primed: 0,
            ticks: 0,
        });
        let mut driver = &bus;
        driver.start(Command::write_bit(true)).unwrap();
        assert_eq!(driver.poll(), Ok(None));
        bus.on_interrupt();
        bus.on_interrupt();
        assert_eq!(driver.poll(), Ok(None));
        assert_eq!(bus.status().progress(), 2);
        bus.on_interrupt();
        assert_eq!(driver.poll(), Ok(Some(true)));
        let engine = bus.into_inner();
        assert_eq!(engine.primed, 1);
        assert_eq!(engine.ticks, 3);
    }

    #[test]
    fn start_is_rejected_while_in_flight() {
        let bus = InterruptDriven::new(Countdown {
            steps: 1,
            primed: 0,
            ticks: 0,
        });
        let mut driver = &bus;
        driver.start(Command::reset()).unwrap();
        assert_eq!(driver.start(Command::read_bit()), Err(OneWireError::BusInUse));
        assert_eq!(bus.with_engine(|e| e.primed), 1);
        bus.on_interrupt();
        assert!(driver.start(Command::read_bit()).is_ok());
        assert_eq!(bus.with_engine(|e| e.primed), 2);
    }
}
