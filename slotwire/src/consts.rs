//! ROM command constants for 1-Wire communication.

/// Command to match a specific ROM address; followed by the 64-bit ROM code.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM addressing. On a single-drop bus this addresses the
/// only device without sending its 64-bit ROM code.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;

/// Command to read the 64-bit ROM code of the only device on the bus.
pub const ONEWIRE_READ_ROM_CMD: u8 = 0x33;
