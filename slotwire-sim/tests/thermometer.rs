mod common;

use common::ENGINES;
use fixed::types::I12F4;
use slotwire::{OneWire, OneWireError};
use slotwire_sim::{
    Board,
    devices::{DS18B20_FAMILY, Ds18b20},
    measure_temperature, read_rom,
};

#[test]
fn sensor_temperature_is_read() {
    for (engine, celsius) in ENGINES.into_iter().zip([21.5, -10.125, 85.0]) {
        let temperature = I12F4::from_num(celsius);
        let board = Board::new(Ds18b20::new(0x31, temperature));
        let measured = board
            .with_master(engine, |bus| measure_temperature(bus, None))
            .unwrap();
        assert_eq!(measured, Ok(temperature), "{engine:?}");
    }
}

#[test]
fn sensor_answers_its_rom() {
    for engine in ENGINES {
        let sensor = Ds18b20::new(0x02c4_8a31, I12F4::from_num(30));
        let rom = sensor.rom();
        let board = Board::new(sensor);
        let (read, measured, other) = board
            .with_master(engine, |bus| {
                (
                    read_rom(&mut *bus),
                    measure_temperature(&mut *bus, Some(rom)),
                    measure_temperature(&mut *bus, Some(rom ^ 0xff00)),
                )
            })
            .unwrap();
        assert_eq!(read, Ok(rom), "{engine:?}");
        assert_eq!(rom as u8, DS18B20_FAMILY);
        assert_eq!(measured, Ok(I12F4::from_num(30)), "{engine:?}");
        // Not addressed: the sensor stays silent and reads as all ones.
        assert_eq!(other, Ok(I12F4::from_bits(-1)), "{engine:?}");
    }
}

#[test]
fn missing_sensor_is_reported() {
    for engine in ENGINES {
        let board = Board::empty();
        let result = board
            .with_master(engine, |bus| {
                (measure_temperature(&mut *bus, None), bus.address(Some(1)))
            })
            .unwrap();
        assert_eq!(
            result,
            (
                Err(OneWireError::NoDevicePresent),
                Err(OneWireError::NoDevicePresent)
            ),
            "{engine:?}"
        );
    }
}
