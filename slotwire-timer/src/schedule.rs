use slotwire::{Operation, SlotTiming};

use crate::registers::ClockSelect;

/// Counter preload and clock that make the next overflow fire after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reload {
    /// Prescaler to run the counter with.
    pub clock: ClockSelect,
    /// Value written to the counter; it overflows after `256 - preload` counts.
    pub preload: u8,
}

impl Reload {
    /// Overflow on the very next CPU cycle. Used to prime a sequence.
    pub const IMMEDIATE: Self = Self {
        clock: ClockSelect::Div1,
        preload: 0xff,
    };

    /// Smallest-prescaler reload that lasts at least `micros`.
    ///
    /// Returns `None` if the delay exceeds 256 counts at /1024.
    pub fn for_delay(micros: u32, cpu_hz: u32) -> Option<Self> {
        if cpu_hz == 0 {
            return None;
        }
        let cycles = (micros as u64 * cpu_hz as u64).div_ceil(1_000_000).max(1);
        ClockSelect::PRESCALED.iter().find_map(|&clock| {
            let counts = cycles.div_ceil(clock.divider()? as u64);
            (counts <= 256).then(|| Self {
                clock,
                preload: (256 - counts) as u8,
            })
        })
    }

    /// CPU cycles until the overflow.
    pub fn cycles(&self) -> u32 {
        (256 - self.preload as u32) * self.clock.divider().unwrap_or(0)
    }
}

/// What the handler does with the bus pin on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAction {
    /// Leave the pin alone.
    Idle,
    /// Pull the line low.
    DriveLow,
    /// Let the pull-up take the line high.
    Release,
    /// Release only if the bit being written is 1.
    ReleaseIfOne,
    /// Sample the line; low means a device is present. Accumulates.
    SamplePresence,
    /// Sample the line into the result bit.
    SampleBit,
}

/// One row of a step table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStep {
    /// Pin action of this step.
    pub action: PinAction,
    /// Delay to the next step, `None` on the terminal step.
    pub next: Option<Reload>,
}

impl TimerStep {
    const TERMINAL: Self = Self {
        action: PinAction::Idle,
        next: None,
    };
}

/// Ticks of a reset/presence sequence, including the terminal tick.
pub const RESET_TICKS: usize = 5;
/// Ticks of a read or write slot, including the terminal tick.
pub const BIT_TICKS: usize = 4;

/// Per-operation step tables with precomputed reloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSchedule {
    reset: [TimerStep; RESET_TICKS],
    read: [TimerStep; BIT_TICKS],
    write: [TimerStep; BIT_TICKS],
}

impl TimerSchedule {
    /// Builds the tables for `timing` on a `cpu_hz` clock.
    ///
    /// # Errors
    /// The first delay, in microseconds, that no prescaler can time.
    pub fn new(timing: &SlotTiming, cpu_hz: u32) -> Result<Self, u32> {
        let after = |action, micros| {
            Reload::for_delay(micros, cpu_hz)
                .map(|reload| TimerStep {
                    action,
                    next: Some(reload),
                })
                .ok_or(micros)
        };
        Ok(Self {
            reset: [
                after(PinAction::DriveLow, timing.reset_low)?,
                after(PinAction::Release, timing.presence_settle)?,
                after(PinAction::SamplePresence, timing.presence_spacing)?,
                after(PinAction::SamplePresence, timing.reset_recovery)?,
                TimerStep::TERMINAL,
            ],
            read: [
                after(PinAction::DriveLow, timing.read_low)?,
                after(PinAction::Release, timing.read_settle)?,
                after(PinAction::SampleBit, timing.read_recovery)?,
                TimerStep::TERMINAL,
            ],
            write: [
                after(PinAction::DriveLow, timing.write_low)?,
                after(PinAction::ReleaseIfOne, timing.write_zero_hold)?,
                after(PinAction::Release, timing.write_recovery)?,
                TimerStep::TERMINAL,
            ],
        })
    }

    /// The step at `progress` of `op`, `None` past the terminal step.
    pub fn step(&self, op: Operation, progress: u8) -> Option<&TimerStep> {
        let table: &[TimerStep] = match op {
            Operation::ResetPulse => &self.reset,
            Operation::ReadBit => &self.read,
            Operation::WriteBit => &self.write,
        };
        table.get(progress as usize)
    }

    /// Number of ticks `op` takes.
    pub fn ticks(&self, op: Operation) -> usize {
        match op {
            Operation::ResetPulse => self.reset.len(),
            Operation::ReadBit => self.read.len(),
            Operation::WriteBit => self.write.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPU_HZ: u32 = 14_745_600;

    #[test]
    fn reload_picks_smallest_prescaler() {
        // 480 us = 7078 cycles, too many for /8, 111 counts at /64.
        let reload = Reload::for_delay(480, CPU_HZ).unwrap();
        assert_eq!(reload.clock, ClockSelect::Div64);
        assert_eq!(reload.preload, (256 - 111) as u8);
        // 2 us = 30 cycles at /1.
        let reload = Reload::for_delay(2, CPU_HZ).unwrap();
        assert_eq!(reload.clock, ClockSelect::Div1);
        assert_eq!(reload.preload, (256 - 30) as u8);
    }

    #[test]
    fn reload_never_undershoots() {
        for micros in [1, 5, 10, 17, 30, 55, 70, 90, 380, 480, 1000] {
            let reload = Reload::for_delay(micros, CPU_HZ).unwrap();
            assert!(reload.cycles() as u64 * 1_000_000 >= micros as u64 * CPU_HZ as u64);
        }
    }

    #[test]
    fn reload_rejects_long_delays() {
        // 256 * 1024 cycles at 14.7456 MHz is about 17.8 ms.
        assert!(Reload::for_delay(17_000, CPU_HZ).is_some());
        assert!(Reload::for_delay(18_000, CPU_HZ).is_none());
        assert!(Reload::for_delay(10, 0).is_none());
    }

    #[test]
    fn reset_table_is_longer_than_bit_tables() {
        let schedule = TimerSchedule::new(&SlotTiming::STANDARD, CPU_HZ).unwrap();
        assert_eq!(schedule.ticks(Operation::ResetPulse), 5);
        assert_eq!(schedule.ticks(Operation::ReadBit), 4);
        assert_eq!(schedule.ticks(Operation::WriteBit), 4);
        assert!(schedule.step(Operation::ReadBit, 4).is_none());
        assert_eq!(
            schedule.step(Operation::ResetPulse, 4),
            Some(&TimerStep::TERMINAL)
        );
    }

    #[test]
    fn unschedulable_timing_is_reported() {
        let timing = SlotTiming {
            reset_recovery: 40_000,
            ..SlotTiming::STANDARD
        };
        assert_eq!(TimerSchedule::new(&timing, CPU_HZ), Err(40_000));
    }
}
