use clap::Parser;
use fixed::types::I12F4;
use slotwire_sim::{
    Board, EngineKind,
    devices::{Ds18b20, NoDevice},
    measure_temperature, read_rom,
};

/// Measure a simulated DS18B20 over a bit-banged 1-Wire bus
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Engine generating the time slots
    #[arg(short, long, value_enum, default_value_t = EngineKind::Timer)]
    engine: EngineKind,
    /// Temperature reported by the sensor, in degrees Celsius
    #[arg(short, long, default_value_t = 21.5, allow_negative_numbers = true)]
    celsius: f32,
    /// Leave the bus empty
    #[arg(long)]
    absent: bool,
    /// Number of measurements
    #[arg(short = 'n', long, default_value_t = 3)]
    cycles: u32,
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    let board = if args.absent {
        Board::new(NoDevice)
    } else {
        let temperature = I12F4::saturating_from_num(args.celsius);
        Board::new(Ds18b20::new(0x0000_02c4_8a31, temperature))
    };
    log::info!("Using the {:?} engine", args.engine);
    board
        .with_master(args.engine, |bus| {
            match read_rom(&mut *bus) {
                Ok(rom) => log::info!("ROM: {rom:016x}"),
                Err(e) => {
                    log::error!("No sensor: {e:?}");
                    return;
                }
            }
            for _ in 0..args.cycles {
                // Skip ROM: a single sensor on the bus
                match measure_temperature(&mut *bus, None) {
                    Ok(temp) => log::info!("Temperature: {temp}"),
                    Err(e) => log::error!("Measurement failed: {e:?}"),
                }
            }
        })
        .expect("Failed to set up the engine");
    log::info!(
        "Simulated {} us, {} interrupts",
        board.now_nanos() / 1_000,
        board.interrupts()
    );
}
