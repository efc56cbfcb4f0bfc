use fixed::types::I12F4;
use slotwire::{ONEWIRE_READ_ROM_CMD, OneWire, OneWireError, OneWireResult};

use crate::devices::{DS18B20_CONVERT_T, DS18B20_READ_SCRATCHPAD};

/// Read slots to wait for a conversion, about 750 ms of 70 us slots.
pub const CONVERSION_SLOTS: u32 = 11_000;

/// Reads the ROM code of the only device on the bus.
pub fn read_rom<O: OneWire + ?Sized>(bus: &mut O) -> OneWireResult<u64, O::BusError> {
    if !bus.reset()? {
        return Err(OneWireError::NoDevicePresent);
    }
    bus.write_byte(ONEWIRE_READ_ROM_CMD)?;
    let mut rom = [0u8; 8];
    bus.read_bytes(&mut rom)?;
    Ok(u64::from_le_bytes(rom))
}

/// Converts and reads the temperature of a DS18B20.
///
/// Addresses `rom`, or every device if `None`, then waits for the
/// conversion by polling read slots and reads the first two scratchpad
/// bytes.
///
/// # Errors
/// [`OneWireError::NoDevicePresent`] on an empty bus,
/// [`OneWireError::Timeout`] if the conversion never completes.
pub fn measure_temperature<O: OneWire + ?Sized>(
    bus: &mut O,
    rom: Option<u64>,
) -> OneWireResult<I12F4, O::BusError> {
    bus.address(rom)?;
    bus.write_byte(DS18B20_CONVERT_T)?;
    let mut slots = 0;
    while !bus.read_bit()? {
        slots += 1;
        if slots == CONVERSION_SLOTS {
            return Err(OneWireError::Timeout);
        }
    }
    bus.address(rom)?;
    bus.write_byte(DS18B20_READ_SCRATCHPAD)?;
    let mut raw = [0u8; 2];
    bus.read_bytes(&mut raw)?;
    Ok(I12F4::from_le_bytes(raw))
}
