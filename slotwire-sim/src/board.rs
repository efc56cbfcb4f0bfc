use std::{
    cell::RefCell,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use critical_section::Mutex;
use slotwire_shift::{Spcr, Spsr};
use slotwire_timer::{Tccr0, Timsk};

use crate::{
    peripherals::{SimPin, SimShiftPort, SimTimer},
    wire::{Responder, Wire},
};

/// Interrupt sources of the simulated microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Timer/Counter0 overflow.
    TimerOverflow,
    /// SPI transfer complete.
    TransferComplete,
}

/// Outcome of advancing the machine to its next hardware event.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Event {
    /// Nothing is scheduled.
    Idle,
    /// An event was handled without raising an interrupt.
    Handled,
    /// An event raised an enabled interrupt.
    Raised(Interrupt),
}

#[derive(Debug, Default)]
pub(crate) struct Timer {
    pub(crate) counter: u8,
    pub(crate) control: Tccr0,
    pub(crate) mask: Timsk,
    pub(crate) deadline: Option<u64>,
}

impl Timer {
    fn restart(&mut self, now: u64) {
        self.deadline = self
            .control
            .clock()
            .divider()
            .map(|divider| now + (256 - self.counter as u64) * divider as u64);
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Transfer {
    start: u64,
    pattern: u8,
    captured: u8,
    /// Even phases sample bit `phase / 2`, odd phases end it.
    phase: u8,
}

#[derive(Debug, Default)]
pub(crate) struct Spi {
    pub(crate) control: Spcr,
    pub(crate) status: Spsr,
    pub(crate) data: u8,
    pub(crate) transfer: Option<Transfer>,
    drive_low: bool,
}

impl Spi {
    fn bit_cycles(&self) -> u64 {
        self.control.rate().divider(self.status.double_speed()) as u64
    }

    /// Position of shifted bit `index` within the byte.
    fn shift(&self, index: u8) -> u8 {
        if self.control.lsb_first() { index } else { 7 - index }
    }

    fn next_event(&self) -> Option<u64> {
        let transfer = self.transfer?;
        let bit = self.bit_cycles();
        let phase = transfer.phase as u64;
        Some(if phase % 2 == 0 {
            transfer.start + phase / 2 * bit + bit / 2
        } else {
            transfer.start + (phase + 1) / 2 * bit
        })
    }
}

/// State of the simulated microcontroller and its bus line.
///
/// Time is counted in CPU cycles and only moves forward in
/// [`Machine::advance`], to the next scheduled hardware event.
pub(crate) struct Machine {
    cpu_hz: u32,
    now: u64,
    pub(crate) wire: Wire,
    pin_low: bool,
    pub(crate) timer: Timer,
    pub(crate) spi: Spi,
    interrupts: u64,
}

impl Machine {
    fn new(cpu_hz: u32, responder: Box<dyn Responder>) -> Self {
        Self {
            cpu_hz,
            now: 0,
            wire: Wire::new(responder),
            pin_low: false,
            timer: Timer::default(),
            spi: Spi::default(),
            interrupts: 0,
        }
    }

    pub(crate) fn nanos(&self) -> u64 {
        (self.now as u128 * 1_000_000_000 / self.cpu_hz as u128) as u64
    }

    fn update_drive(&mut self) {
        let at = self.nanos();
        self.wire.drive(at, self.pin_low || self.spi.drive_low);
    }

    pub(crate) fn line_high(&self) -> bool {
        self.wire.is_high(self.nanos())
    }

    pub(crate) fn set_pin_low(&mut self, low: bool) {
        self.pin_low = low;
        self.update_drive();
    }

    pub(crate) fn set_timer_counter(&mut self, value: u8) {
        self.timer.counter = value;
        if self.timer.deadline.is_some() {
            self.timer.restart(self.now);
        }
    }

    pub(crate) fn set_timer_control(&mut self, control: Tccr0) {
        self.timer.control = control;
        self.timer.restart(self.now);
    }

    pub(crate) fn start_transfer(&mut self, pattern: u8) {
        let control = self.spi.control;
        if !(control.enable() && control.master()) {
            return;
        }
        if self.spi.transfer.is_some() {
            self.spi.status = self.spi.status.with_write_collision(true);
            return;
        }
        self.spi.status = self.spi.status.with_write_collision(false);
        self.spi.transfer = Some(Transfer {
            start: self.now,
            pattern,
            captured: 0,
            phase: 0,
        });
        self.shift_out(pattern, 0);
    }

    fn shift_out(&mut self, pattern: u8, index: u8) {
        self.spi.drive_low = pattern & (1 << self.spi.shift(index)) == 0;
        self.update_drive();
    }

    fn raise(&mut self, interrupt: Interrupt) -> Event {
        self.interrupts += 1;
        log::trace!("{} ns: {interrupt:?}", self.nanos());
        Event::Raised(interrupt)
    }

    /// Moves time to the next hardware event and handles it. The timer wins
    /// a tie; the transfer event is handled on the next call.
    pub(crate) fn advance(&mut self) -> Event {
        let timer = self.timer.deadline;
        let spi = self.spi.next_event();
        let Some(at) = timer.into_iter().chain(spi).min() else {
            return Event::Idle;
        };
        self.now = self.now.max(at);
        if timer == Some(at) {
            self.timer.counter = 0;
            self.timer.restart(self.now);
            if self.timer.mask.overflow() {
                return self.raise(Interrupt::TimerOverflow);
            }
            return Event::Handled;
        }
        let Some(mut transfer) = self.spi.transfer else {
            return Event::Handled;
        };
        let index = transfer.phase / 2;
        if transfer.phase % 2 == 0 {
            if self.line_high() {
                transfer.captured |= 1 << self.spi.shift(index);
            }
            transfer.phase += 1;
            self.spi.transfer = Some(transfer);
            return Event::Handled;
        }
        if index == 7 {
            self.spi.transfer = None;
            self.spi.data = transfer.captured;
            self.spi.status = self.spi.status.with_transfer_complete(true);
            if self.spi.control.interrupt() {
                return self.raise(Interrupt::TransferComplete);
            }
            return Event::Handled;
        }
        transfer.phase += 1;
        self.spi.transfer = Some(transfer);
        self.shift_out(transfer.pattern, index + 1);
        Event::Handled
    }
}

pub(crate) type SharedMachine = Arc<Mutex<RefCell<Machine>>>;

pub(crate) fn with_machine<R>(machine: &SharedMachine, f: impl FnOnce(&mut Machine) -> R) -> R {
    critical_section::with(|cs| f(&mut machine.borrow_ref_mut(cs)))
}

/// Sets the flag when dropped, so the clock thread stops even if the body
/// panics.
struct StopOnDrop<'a>(&'a AtomicBool);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// A simulated microcontroller with one bus line and a device on it.
///
/// Hand out its peripherals to an engine, then run the bus code with
/// [`run`](Board::run).
pub struct Board {
    machine: SharedMachine,
}

impl Board {
    /// A board clocked at [`DEFAULT_CPU_HZ`](slotwire_timer::DEFAULT_CPU_HZ)
    /// with `responder` on the line.
    pub fn new(responder: impl Responder + 'static) -> Self {
        Self::with_cpu_hz(slotwire_timer::DEFAULT_CPU_HZ, responder)
    }

    /// A board clocked at `cpu_hz`.
    pub fn with_cpu_hz(cpu_hz: u32, responder: impl Responder + 'static) -> Self {
        Self {
            machine: Arc::new(Mutex::new(RefCell::new(Machine::new(
                cpu_hz.max(1),
                Box::new(responder),
            )))),
        }
    }

    /// A board with nothing on the line.
    pub fn empty() -> Self {
        Self::new(crate::devices::NoDevice)
    }

    /// The bus pin, for the timer engine.
    pub fn pin(&self) -> SimPin {
        SimPin::new(self.machine.clone())
    }

    /// Timer/Counter0.
    pub fn timer(&self) -> SimTimer {
        SimTimer::new(self.machine.clone())
    }

    /// The SPI peripheral, its data lines tied to the bus line.
    pub fn shift_port(&self) -> SimShiftPort {
        SimShiftPort::new(self.machine.clone())
    }

    /// Interrupts raised so far.
    pub fn interrupts(&self) -> u64 {
        with_machine(&self.machine, |m| m.interrupts)
    }

    /// Simulated time in nanoseconds.
    pub fn now_nanos(&self) -> u64 {
        with_machine(&self.machine, |m| m.nanos())
    }

    /// Runs `body` while a clock thread advances simulated time and calls
    /// `isr` for every raised interrupt.
    ///
    /// Time stands still while `isr` runs and whenever nothing is
    /// scheduled, so the code in `body` executes in zero simulated time.
    pub fn run<R>(&self, isr: impl FnMut(Interrupt) + Send, body: impl FnOnce() -> R) -> R {
        let stop = AtomicBool::new(false);
        thread::scope(|scope| {
            let mut isr = isr;
            let stop = &stop;
            scope.spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    match with_machine(&self.machine, Machine::advance) {
                        Event::Idle => thread::yield_now(),
                        Event::Handled => {}
                        Event::Raised(interrupt) => isr(interrupt),
                    }
                }
            });
            let _stop = StopOnDrop(stop);
            body()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::PresencePulse;

    fn machine() -> Machine {
        Machine::new(
            slotwire_timer::DEFAULT_CPU_HZ,
            Box::new(PresencePulse::default()),
        )
    }

    #[test]
    fn timer_overflows_after_preload() {
        let mut m = machine();
        m.timer.mask = Timsk::new().with_overflow(true);
        m.set_timer_counter((256 - 111) as u8);
        m.set_timer_control(Tccr0::new().with_clock(slotwire_timer::ClockSelect::Div64));
        assert_eq!(m.advance(), Event::Raised(Interrupt::TimerOverflow));
        assert_eq!(m.now, 111 * 64);
        m.set_timer_control(Tccr0::new());
        assert_eq!(m.advance(), Event::Idle);
    }

    #[test]
    fn transfer_shifts_msb_first_and_samples_the_line() {
        let mut m = machine();
        m.spi.control = Spcr::new()
            .with_rate(slotwire_shift::ClockRate::Div128)
            .with_master(true)
            .with_enable(true);
        m.start_transfer(0x7f);
        assert!(!m.line_high());
        let mut events = 1;
        while m.advance() == Event::Handled && m.spi.transfer.is_some() {
            events += 1;
        }
        assert_eq!(events, 16);
        assert_eq!(m.now, 8 * 128);
        assert!(m.spi.status.transfer_complete());
        assert_eq!(m.spi.data, 0x7f);
    }

    #[test]
    fn write_during_transfer_collides() {
        let mut m = machine();
        m.spi.control = Spcr::new().with_master(true).with_enable(true);
        m.start_transfer(0xff);
        m.start_transfer(0x00);
        assert!(m.spi.status.write_collision());
        assert!(m.line_high());
    }
}
