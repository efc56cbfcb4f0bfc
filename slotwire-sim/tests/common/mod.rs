use slotwire_sim::EngineKind;

pub const ENGINES: [EngineKind; 3] = [EngineKind::Timer, EngineKind::Shift, EngineKind::Polled];
