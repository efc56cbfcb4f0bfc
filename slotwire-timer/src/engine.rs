use embedded_hal::digital::{InputPin, OutputPin};
use slotwire::{Command, SlotEngine, StepCell, StepCode};

use crate::{OverflowTimer, PinAction, Reload, Tccr0, TimerTickEngine};

impl<P: InputPin + OutputPin, T: OverflowTimer> TimerTickEngine<P, T> {
    fn start(&mut self, reload: Reload) {
        self.timer.set_counter(reload.preload);
        self.timer.set_control(Tccr0::new().with_clock(reload.clock));
    }

    fn stop(&mut self) {
        self.timer.set_control(Tccr0::new());
    }

    fn act(&mut self, action: PinAction, code: StepCode) -> Result<StepCode, P::Error> {
        match action {
            PinAction::Idle => {}
            PinAction::DriveLow => self.pin.set_low()?,
            PinAction::Release => self.pin.set_high()?,
            PinAction::ReleaseIfOne => {
                if code.result() {
                    self.pin.set_high()?;
                }
            }
            PinAction::SamplePresence => {
                if self.pin.is_low()? {
                    return Ok(code.with_result(true));
                }
            }
            PinAction::SampleBit => return Ok(code.with_result(self.pin.is_high()?)),
        }
        Ok(code)
    }
}

impl<P: InputPin + OutputPin, T: OverflowTimer> SlotEngine for TimerTickEngine<P, T> {
    fn prime(&mut self, _command: Command) {
        self.start(Reload::IMMEDIATE);
    }

    fn tick(&mut self, cell: &StepCell) {
        self.stop();
        let code = cell.load();
        let Some(step) = code
            .operation()
            .and_then(|op| self.schedule.step(op, code.progress()))
            .copied()
        else {
            return;
        };
        // A pin fault is handled like an unknown step: the counter stays
        // stopped and ready is never set.
        let Ok(code) = self.act(step.action, code) else {
            return;
        };
        match step.next {
            Some(reload) => {
                cell.store(code.advanced());
                self.start(reload);
            }
            None => cell.store(code.with_ready(true)),
        }
    }
}
