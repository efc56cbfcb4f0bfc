use slotwire::{Command, SlotEngine, StepCell, StepCode};

use crate::{ShiftClockEngine, ShiftPort, ShiftStep};

impl<P: ShiftPort> SlotEngine for ShiftClockEngine<P> {
    fn prime(&mut self, command: Command) {
        if let Some(pattern) = self.schedule.pattern(StepCode::armed(command)) {
            self.port.set_control(self.control.with_interrupt(true));
            self.port.write_data(pattern);
        }
    }

    fn tick(&mut self, cell: &StepCell) {
        let captured = self.port.read_data();
        match self.schedule.advance(cell.load(), captured) {
            Some(ShiftStep::Transfer(code, pattern)) => {
                cell.store(code);
                self.port.write_data(pattern);
            }
            Some(ShiftStep::Done(code)) => {
                self.port.set_control(self.control);
                cell.store(code);
            }
            None => self.port.set_control(self.control),
        }
    }
}
