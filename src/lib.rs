#![warn(clippy::all, clippy::nursery, clippy::pedantic)]

//! Monitor identity resolution and brightness control for Windows displays.
//!
//! Two OS subsystems each know half of what a "monitor" is: the display
//! configuration API knows active paths and hands out control handles, while
//! the instrumentation subsystem knows installed descriptors (manufacturer,
//! serial, internal-vs-external). This crate reconciles the two into one
//! stable identity per physical monitor, duplicate hardware included, and
//! drives brightness through whichever mechanism each monitor supports:
//! management queries for internal panels, the DDC/CI monitor-control
//! protocol for external displays, with bounded retry and fallback between
//! them.
//!
//! The core engine is platform-independent over the [`topology::DisplayTopology`],
//! [`management::ManagementSource`], and [`control::DirectControl`] traits;
//! the live implementations live in [`win`] and only build on Windows.

pub mod codec;
pub mod control;
pub mod error;
pub mod identity;
pub mod inventory;
pub mod management;
pub mod model;
pub mod service;
pub mod topology;

#[cfg(windows)]
pub mod win;

pub use control::{
    BrightnessController, ControlOutcome, ControlPath, DdcReading, DirectControl,
    DDC_RETRY_ATTEMPTS,
};
pub use error::Error;
pub use identity::IdentityResolver;
pub use inventory::MonitorInventory;
pub use management::{ManagementSource, MonitorIdRecord};
pub use model::{
    BrightnessTarget, GetBrightnessResult, MonitorBounds, MonitorDescriptor, MonitorReference,
    SetBrightnessResult, ALL_MONITORS,
};
pub use service::{MonitorPlatform, MonitorService};
pub use topology::{DisplayTopology, HandleEntry, HandleOf, PathInfo};

#[cfg(windows)]
pub use win::{ManagementClient, PhysicalHandle, WindowsPlatform};

/// Lists installed monitors over a fresh service. Returns an empty list if
/// the instrumentation subsystem cannot be reached (logged).
#[cfg(windows)]
pub fn list_monitors() -> Vec<MonitorDescriptor<PhysicalHandle>> {
    match MonitorService::connect() {
        Ok(service) => service.monitors(false),
        Err(e) => {
            tracing::error!(error = %e, "could not open monitor service");
            Vec::new()
        }
    }
}

/// Reads brightness for one monitor; an empty identifier targets the first
/// available monitor.
#[cfg(windows)]
pub fn get_brightness(id: &str) -> GetBrightnessResult {
    match MonitorService::connect() {
        Ok(service) => service.get_brightness(id),
        Err(e) => {
            tracing::error!(error = %e, "could not open monitor service");
            GetBrightnessResult::failed()
        }
    }
}

/// Sets brightness for one monitor; [`ALL_MONITORS`] broadcasts to every
/// monitor, an empty identifier targets the first available monitor.
#[cfg(windows)]
pub fn set_brightness(id: &str, level: i32) -> SetBrightnessResult {
    match MonitorService::connect() {
        Ok(service) => service.set_brightness(id, level),
        Err(e) => SetBrightnessResult::failed_with(e.to_string()),
    }
}

/// Applies a batch of per-monitor brightness targets; succeeds only when
/// every target succeeded.
#[cfg(windows)]
pub fn set_brightness_targets(targets: &[BrightnessTarget]) -> SetBrightnessResult {
    match MonitorService::connect() {
        Ok(service) => service.set_brightness_targets(targets),
        Err(e) => SetBrightnessResult::failed_with(e.to_string()),
    }
}
