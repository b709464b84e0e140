//! The public façade tying inventory and brightness control together.

use crate::control::{BrightnessController, DirectControl};
use crate::inventory::MonitorInventory;
use crate::management::ManagementSource;
use crate::model::{
    BrightnessTarget, GetBrightnessResult, MonitorDescriptor, SetBrightnessResult, ALL_MONITORS,
};
use crate::topology::{DisplayTopology, HandleOf};

/// Everything a platform must provide for the engine to run: display
/// topology, the instrumentation subsystem, and the direct monitor-control
/// protocol, all speaking the same handle type.
pub trait MonitorPlatform:
    DisplayTopology + ManagementSource + DirectControl<Handle = HandleOf<Self>>
{
}

impl<T> MonitorPlatform for T where
    T: DisplayTopology + ManagementSource + DirectControl<Handle = HandleOf<T>>
{
}

/// A self-contained monitor service over one platform value.
///
/// Construct one per top-level call: the service owns the platform (and with
/// it the instrumentation session), every operation re-resolves monitor
/// identity from live OS state, and dropping the service releases
/// everything. Nothing outlives one logical request.
pub struct MonitorService<P: MonitorPlatform> {
    platform: P,
}

impl<P: MonitorPlatform> MonitorService<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    /// Borrows the underlying platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Lists installed monitors, optionally excluding internal panels.
    pub fn monitors(&self, exclude_internal: bool) -> Vec<MonitorDescriptor<HandleOf<P>>> {
        MonitorInventory::new(&self.platform).list_monitors(exclude_internal)
    }

    /// Reads brightness for the monitor with the given identifier. An empty
    /// identifier targets the first available monitor.
    pub fn get_brightness(&self, id: &str) -> GetBrightnessResult {
        let monitors = self.monitors(false);

        let target = if id.is_empty() {
            monitors.first()
        } else {
            monitors.iter().find(|m| m.id == id)
        };

        let Some(monitor) = target else {
            return GetBrightnessResult::failed();
        };

        let outcome = BrightnessController::new(&self.platform).read(&monitor.id);
        match outcome.level {
            Some(level) => GetBrightnessResult::succeeded(level),
            None => GetBrightnessResult::failed(),
        }
    }

    /// Sets brightness for the monitor with the given identifier.
    ///
    /// The reserved [`ALL_MONITORS`] identifier broadcasts to every monitor
    /// best-effort and always reports success. An empty identifier targets
    /// the first available monitor.
    pub fn set_brightness(&self, id: &str, level: i32) -> SetBrightnessResult {
        let controller = BrightnessController::new(&self.platform);

        if id == ALL_MONITORS {
            controller.set_all(level);
            return SetBrightnessResult::succeeded();
        }

        let monitors = self.monitors(false);
        if monitors.is_empty() {
            return SetBrightnessResult::failed_with("No monitors available");
        }

        let target = if id.is_empty() {
            monitors.first()
        } else {
            monitors.iter().find(|m| m.id == id)
        };

        match target {
            Some(monitor) => {
                if controller.apply(&monitor.id, level).succeeded() {
                    SetBrightnessResult::succeeded()
                } else {
                    SetBrightnessResult::failed()
                }
            }
            None => SetBrightnessResult::failed_with("Monitor not found"),
        }
    }

    /// Applies a batch of per-monitor brightness targets; succeeds only when
    /// every target succeeded.
    pub fn set_brightness_targets(&self, targets: &[BrightnessTarget]) -> SetBrightnessResult {
        if BrightnessController::new(&self.platform).set_batch(targets) {
            SetBrightnessResult::succeeded()
        } else {
            SetBrightnessResult::failed()
        }
    }
}
