use std::{collections::VecDeque, ops::Range};

use fixed::types::I12F4;
use slotwire::{ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_ROM_CMD, ONEWIRE_SKIP_ROM_CMD};

use crate::wire::{Responder, Slot};

/// Starts a temperature conversion.
pub const DS18B20_CONVERT_T: u8 = 0x44;
/// Reads the nine scratchpad bytes.
pub const DS18B20_READ_SCRATCHPAD: u8 = 0xbe;
/// Family code of the DS18B20.
pub const DS18B20_FAMILY: u8 = 0x28;

const MICROS: u64 = 1_000;
/// How long a device holds the line when it sends a `0`.
const READ_ZERO_NS: u64 = 30 * MICROS;

/// Presence pulse `delay_us` after the release at `at`, lasting `width_us`.
fn presence(at: u64, delay_us: u64, width_us: u64) -> Range<u64> {
    let start = at + delay_us * MICROS;
    start..start + width_us * MICROS
}

/// Nobody on the line.
#[derive(Debug, Default)]
pub struct NoDevice;

impl Responder for NoDevice {
    fn on_release(&mut self, _at: u64, _low_for: u64) -> Option<Range<u64>> {
        None
    }
}

/// A device that answers every reset with a presence pulse and ignores
/// everything else.
#[derive(Debug, Clone, Copy)]
pub struct PresencePulse {
    delay_us: u64,
    width_us: u64,
}

impl PresencePulse {
    /// Pulls the line low `delay_us` after the reset ends, for `width_us`.
    pub fn new(delay_us: u64, width_us: u64) -> Self {
        Self { delay_us, width_us }
    }
}

impl Default for PresencePulse {
    /// A 120 us pulse starting 20 us after the reset.
    fn default() -> Self {
        Self::new(20, 120)
    }
}

impl Responder for PresencePulse {
    fn on_release(&mut self, at: u64, low_for: u64) -> Option<Range<u64>> {
        (Slot::classify(low_for) == Slot::Reset)
            .then(|| presence(at, self.delay_us, self.width_us))
    }
}

/// Receives `width` written bits, then sends them back in the next `width`
/// read slots, then starts over. A reset clears it.
#[derive(Debug)]
pub struct Loopback {
    width: usize,
    bits: VecDeque<bool>,
    replaying: bool,
}

impl Loopback {
    /// Echoes blocks of `width` bits.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            bits: VecDeque::with_capacity(width),
            replaying: false,
        }
    }
}

impl Responder for Loopback {
    fn on_fall(&mut self, at: u64) -> Option<Range<u64>> {
        match self.bits.front() {
            Some(false) if self.replaying => Some(at..at + READ_ZERO_NS),
            _ => None,
        }
    }

    fn on_release(&mut self, at: u64, low_for: u64) -> Option<Range<u64>> {
        let slot = Slot::classify(low_for);
        if slot == Slot::Reset {
            self.bits.clear();
            self.replaying = false;
            return Some(presence(at, 30, 120));
        }
        if self.replaying {
            self.bits.pop_front();
            self.replaying = !self.bits.is_empty();
        } else {
            self.bits.push_back(slot == Slot::One);
            self.replaying = self.bits.len() == self.width;
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    RomCommand,
    MatchRom { index: usize, matched: bool },
    Function,
    SendRom,
    SendScratchpad,
}

/// A single DS18B20 temperature sensor.
///
/// Understands Skip ROM, Match ROM and Read ROM, then Convert T and Read
/// Scratchpad. A conversion completes at once, so read slots after Convert T
/// return `1` right away.
#[derive(Debug)]
pub struct Ds18b20 {
    rom: u64,
    temperature: I12F4,
    phase: Phase,
    received: u8,
    received_bits: u8,
    sending: VecDeque<bool>,
}

impl Ds18b20 {
    /// A sensor with the 48-bit `serial` reading `temperature`.
    pub fn new(serial: u64, temperature: I12F4) -> Self {
        let mut rom = [0u8; 8];
        rom[0] = DS18B20_FAMILY;
        rom[1..7].copy_from_slice(&serial.to_le_bytes()[..6]);
        rom[7] = crc8(&rom[..7]);
        Self {
            rom: u64::from_le_bytes(rom),
            temperature,
            phase: Phase::Idle,
            received: 0,
            received_bits: 0,
            sending: VecDeque::new(),
        }
    }

    /// The 64-bit ROM code: family, serial and CRC, least significant byte
    /// first on the wire.
    pub fn rom(&self) -> u64 {
        self.rom
    }

    /// The nine scratchpad bytes.
    pub fn scratchpad(&self) -> [u8; 9] {
        let [lsb, msb] = self.temperature.to_bits().to_le_bytes();
        let mut bytes = [lsb, msb, 0x4b, 0x46, 0x7f, 0xff, 0x0c, 0x10, 0];
        bytes[8] = crc8(&bytes[..8]);
        bytes
    }

    fn send(&mut self, bytes: &[u8], phase: Phase) {
        self.sending = bytes
            .iter()
            .flat_map(|byte| (0..8).map(move |i| byte & (1 << i) != 0))
            .collect();
        self.phase = phase;
    }

    fn receive(&mut self, byte: u8) {
        log::debug!("ds18b20 received {byte:#04x} in {:?}", self.phase);
        self.phase = match (self.phase, byte) {
            (Phase::RomCommand, ONEWIRE_SKIP_ROM_CMD) => Phase::Function,
            (Phase::RomCommand, ONEWIRE_MATCH_ROM_CMD) => Phase::MatchRom {
                index: 0,
                matched: true,
            },
            (Phase::RomCommand, ONEWIRE_READ_ROM_CMD) => {
                self.send(&self.rom.to_le_bytes(), Phase::SendRom);
                return;
            }
            (Phase::MatchRom { index, matched }, byte) => {
                let matched = matched && self.rom.to_le_bytes()[index] == byte;
                match index + 1 {
                    8 if matched => Phase::Function,
                    8 => Phase::Idle,
                    index => Phase::MatchRom { index, matched },
                }
            }
            (Phase::Function, DS18B20_CONVERT_T) => {
                log::debug!("ds18b20 converted {}", self.temperature);
                Phase::Idle
            }
            (Phase::Function, DS18B20_READ_SCRATCHPAD) => {
                self.send(&self.scratchpad(), Phase::SendScratchpad);
                return;
            }
            _ => Phase::Idle,
        };
    }
}

impl Responder for Ds18b20 {
    fn on_fall(&mut self, at: u64) -> Option<Range<u64>> {
        match (self.phase, self.sending.front()) {
            (Phase::SendRom | Phase::SendScratchpad, Some(false)) => Some(at..at + READ_ZERO_NS),
            _ => None,
        }
    }

    fn on_release(&mut self, at: u64, low_for: u64) -> Option<Range<u64>> {
        let slot = Slot::classify(low_for);
        if slot == Slot::Reset {
            self.phase = Phase::RomCommand;
            self.received = 0;
            self.received_bits = 0;
            self.sending.clear();
            return Some(presence(at, 30, 120));
        }
        match self.phase {
            Phase::Idle => {}
            Phase::SendRom | Phase::SendScratchpad => {
                self.sending.pop_front();
                if self.sending.is_empty() {
                    self.phase = match self.phase {
                        Phase::SendRom => Phase::Function,
                        _ => Phase::Idle,
                    };
                }
            }
            _ => {
                if slot == Slot::One {
                    self.received |= 1 << self.received_bits;
                }
                self.received_bits += 1;
                if self.received_bits == 8 {
                    let byte = self.received;
                    self.received = 0;
                    self.received_bits = 0;
                    self.receive(byte);
                }
            }
        }
        None
    }
}

/// Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1, reflected).
fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |crc, &byte| {
        (0..8).fold(crc ^ byte, |crc, _| {
            if crc & 1 != 0 { (crc >> 1) ^ 0x8c } else { crc >> 1 }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESET: u64 = 500_000;
    const ZERO: u64 = 60_000;
    const ONE: u64 = 5_000;

    fn write_byte(device: &mut impl Responder, byte: u8) {
        for i in 0..8 {
            let low_for = if byte & (1 << i) != 0 { ONE } else { ZERO };
            device.on_fall(0);
            assert_eq!(device.on_release(low_for, low_for), None);
        }
    }

    fn read_byte(device: &mut impl Responder) -> u8 {
        (0..8).fold(0, |byte, i| {
            let hold = device.on_fall(0);
            device.on_release(2_000, 2_000);
            match hold {
                Some(_) => byte,
                None => byte | 1 << i,
            }
        })
    }

    #[test]
    fn crc_of_known_rom() {
        // ROM code from the DS18B20 datasheet CRC example.
        assert_eq!(crc8(&[0x02, 0x1c, 0xb8, 0x01, 0x00, 0x00, 0x00]), 0xa2);
    }

    #[test]
    fn presence_only_after_reset() {
        let mut device = PresencePulse::default();
        assert_eq!(device.on_release(1_000_000, RESET), Some(1_020_000..1_140_000));
        assert_eq!(device.on_release(1_000_000, ZERO), None);
    }

    #[test]
    fn loopback_echoes_a_block() {
        let mut device = Loopback::new(8);
        assert!(device.on_release(0, RESET).is_some());
        write_byte(&mut device, 0xa5);
        assert_eq!(read_byte(&mut device), 0xa5);
        write_byte(&mut device, 0x3c);
        assert_eq!(read_byte(&mut device), 0x3c);
    }

    #[test]
    fn sensor_sends_scratchpad_after_skip_rom() {
        let temperature = I12F4::from_num(25.0625);
        let mut device = Ds18b20::new(0x1122_3344_5566, temperature);
        device.on_release(0, RESET);
        write_byte(&mut device, ONEWIRE_SKIP_ROM_CMD);
        write_byte(&mut device, DS18B20_READ_SCRATCHPAD);
        let scratchpad: Vec<u8> = (0..9).map(|_| read_byte(&mut device)).collect();
        assert_eq!(scratchpad, device.scratchpad());
        assert_eq!(scratchpad[..2], [0x91, 0x01]);
        assert_eq!(crc8(&scratchpad), 0);
        // Idle again: read slots return ones.
        assert_eq!(read_byte(&mut device), 0xff);
    }

    #[test]
    fn sensor_ignores_other_roms() {
        let mut device = Ds18b20::new(7, I12F4::ZERO);
        device.on_release(0, RESET);
        write_byte(&mut device, ONEWIRE_MATCH_ROM_CMD);
        for byte in (device.rom() + 1).to_le_bytes() {
            write_byte(&mut device, byte);
        }
        write_byte(&mut device, DS18B20_READ_SCRATCHPAD);
        assert_eq!(read_byte(&mut device), 0xff);

        device.on_release(0, RESET);
        write_byte(&mut device, ONEWIRE_READ_ROM_CMD);
        let rom: Vec<u8> = (0..8).map(|_| read_byte(&mut device)).collect();
        assert_eq!(rom, device.rom().to_le_bytes());
        assert_eq!(rom[0], DS18B20_FAMILY);
        assert_eq!(crc8(&rom), 0);
    }
}
