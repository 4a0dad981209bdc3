//! # Device Module
//!
//! Physical and virtual input-device handling.
//!
//! This module handles:
//! - Opening and exclusively grabbing the physical evdev device
//! - Async readiness-based event reads
//! - Kernel-level axis-info queries and pushes (EVIOCSABS)
//! - Building the uinput virtual device from the mapping table

pub mod physical;
pub mod virtual_dev;

pub use physical::PhysicalDevice;
pub use virtual_dev::{build_virtual_device, VirtualOutput};
