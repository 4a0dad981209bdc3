//! # Evwrap Library
//!
//! Wrap a physical input device in a remapping virtual device.
//!
//! This library provides the core functionality for grabbing an evdev
//! device exclusively, re-emitting its events through a uinput virtual
//! device with translated event codes, and keeping kernel-level axis
//! calibration consistent while the wrapper runs.

pub mod calibration;
pub mod cli;
pub mod device;
pub mod error;
pub mod forward;
pub mod mapping;
pub mod shutdown;
