#![no_std]
#![deny(missing_docs)]
//! # slotwire
//! A no-std core for 1-Wire bus masters that build their time slots from
//! interrupts instead of dedicated bus hardware.
//!
//! Each bus operation (reset/presence, read bit, write bit) is a short, fixed
//! table of steps. An engine implementing [SlotEngine] performs one step per
//! hardware interrupt ("tick") and publishes its progress in a [StepCell], a
//! single atomic byte shared between the interrupt handler and the caller.
//! [InterruptDriven] couples an engine with its cell, and [OneWireMaster] is
//! the blocking façade that composes bit commands into bytes and implements
//! the [OneWire] trait for device-level code.

mod consts;
mod engine;
mod error;
mod master;
mod step;
mod timing;
mod traits;

pub use consts::*;
pub use engine::{InterruptDriven, SlotEngine};
pub use error::OneWireError;
pub use master::OneWireMaster;
pub use step::{Command, Operation, StepCell, StepCode};
pub use timing::SlotTiming;
pub use traits::{OneWire, SlotDriver};

/// Result type of 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;
