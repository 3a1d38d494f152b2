#![cfg_attr(not(test), no_std)]

// Control-loop logic for the treadmill physical-control simulators.
//
// This crate stays portable across host tooling and embedded targets by
// avoiding the Rust standard library. Every entry point takes explicit state
// and an explicit time step, so the control logic is deterministic and
// testable without a live clock, a scheduler, or a real treadmill.

pub mod device;
pub mod estop;
pub mod input;
pub mod rig;
pub mod surface;
pub mod telemetry;
