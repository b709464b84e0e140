//! Brightness reads and writes with per-monitor mechanism selection,
//! bounded retry, and observable fallback.

use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::identity::IdentityResolver;
use crate::inventory::{classify_internal, MonitorInventory};
use crate::management::ManagementSource;
use crate::model::BrightnessTarget;
use crate::topology::{DisplayTopology, HandleOf};

/// Maximum attempts for one direct-control brightness command.
///
/// Commands to external monitors ride the DDC/CI bus, where a request can
/// fail transiently under contention and an immediate retry usually goes
/// through; attempts are therefore bounded by count with no delay between
/// them.
pub const DDC_RETRY_ATTEMPTS: u32 = 10;

/// A brightness reading from the direct monitor-control protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DdcReading {
    pub minimum: u32,
    pub current: u32,
    pub maximum: u32,
}

/// The direct (per-handle) monitor brightness protocol. One call is one
/// attempt; the retry policy lives in [`BrightnessController`].
pub trait DirectControl {
    type Handle;

    fn read_brightness(&self, handle: &Self::Handle) -> Result<DdcReading, Error>;
    fn write_brightness(&self, handle: &Self::Handle, level: u32) -> Result<(), Error>;
}

/// Which control mechanism carried out (or failed to carry out) an
/// operation. The external success/failure contract does not depend on the
/// tag; it exists so fallback behavior is observable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlPath {
    /// Served by an instrumentation-subsystem query or method call.
    ViaManagementQuery,
    /// Served by the direct monitor-control protocol.
    ViaDirectControl,
    /// Neither mechanism succeeded.
    Failed,
}

impl ControlPath {
    pub fn succeeded(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Outcome of a brightness read: the level when one was obtained, plus the
/// mechanism tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlOutcome {
    pub level: Option<u32>,
    pub path: ControlPath,
}

pub(crate) fn clamp_level(level: i32) -> u8 {
    level.clamp(0, 100) as u8
}

/// Drives brightness operations for resolved monitor identities.
///
/// Monitor identity is re-resolved on every call; handles are never retained
/// between invocations because any display reconfiguration invalidates them.
pub struct BrightnessController<'a, P>
where
    P: DisplayTopology + ManagementSource + DirectControl<Handle = HandleOf<P>>,
{
    platform: &'a P,
}

impl<'a, P> BrightnessController<'a, P>
where
    P: DisplayTopology + ManagementSource + DirectControl<Handle = HandleOf<P>>,
{
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    /// Reads the brightness of the monitor with the given identifier.
    ///
    /// Internal panels are read through the instrumentation subsystem;
    /// external monitors through the direct protocol with bounded retry. A
    /// failed management read falls back to the direct protocol when a
    /// control handle exists.
    pub fn read(&self, id: &str) -> ControlOutcome {
        if classify_internal(self.platform, id) {
            match self.platform.current_brightness(id) {
                Ok(Some(level)) => {
                    return ControlOutcome {
                        level: Some(u32::from(level)),
                        path: ControlPath::ViaManagementQuery,
                    };
                }
                Ok(None) => {
                    debug!(id, "no management brightness record, trying direct control");
                }
                Err(e) => {
                    warn!(id, error = %e, "management brightness read failed, trying direct control");
                }
            }
        }

        if let Some(reference) = IdentityResolver::new(self.platform).resolve_by_id(id) {
            if let Some(reading) = self.read_with_retries(&reference.handle) {
                return ControlOutcome {
                    level: Some(reading.current),
                    path: ControlPath::ViaDirectControl,
                };
            }
        }

        ControlOutcome {
            level: None,
            path: ControlPath::Failed,
        }
    }

    /// Sets the brightness of the monitor with the given identifier,
    /// clamping `level` to `[0, 100]` before transmission. Mechanism
    /// selection and fallback mirror [`Self::read`].
    pub fn apply(&self, id: &str, level: i32) -> ControlPath {
        let level = clamp_level(level);

        if classify_internal(self.platform, id) {
            match self.platform.apply_brightness(id, level) {
                Ok(()) => return ControlPath::ViaManagementQuery,
                Err(e) => {
                    warn!(id, error = %e, "management brightness write failed, trying direct control");
                }
            }
        }

        if let Some(reference) = IdentityResolver::new(self.platform).resolve_by_id(id) {
            if self.write_with_retries(&reference.handle, u32::from(level)) {
                return ControlPath::ViaDirectControl;
            }
        }

        ControlPath::Failed
    }

    /// Applies every target in the batch and reports success only when all
    /// of them succeeded. An empty batch is a failure: nothing was set.
    pub fn set_batch(&self, targets: &[BrightnessTarget]) -> bool {
        let results: Vec<bool> = targets
            .iter()
            .map(|t| self.apply(&t.id, t.level).succeeded())
            .collect();
        !results.is_empty() && results.iter().all(|ok| *ok)
    }

    /// Applies `level` to every monitor in the inventory, best-effort:
    /// per-monitor failures are logged and do not affect the reported
    /// success. Deliberately more lenient than [`Self::set_batch`].
    pub fn set_all(&self, level: i32) -> bool {
        let monitors = MonitorInventory::new(self.platform).list_monitors(false);
        for monitor in monitors {
            let path = self.apply(&monitor.id, level);
            if !path.succeeded() {
                debug!(id = %monitor.id, "broadcast brightness write failed for monitor");
            }
        }
        true
    }

    fn read_with_retries(&self, handle: &HandleOf<P>) -> Option<DdcReading> {
        for attempt in 1..=DDC_RETRY_ATTEMPTS {
            match self.platform.read_brightness(handle) {
                Ok(reading) => return Some(reading),
                Err(e) => {
                    trace!(attempt, error = %e, "direct brightness read attempt failed");
                }
            }
        }
        None
    }

    fn write_with_retries(&self, handle: &HandleOf<P>, level: u32) -> bool {
        for attempt in 1..=DDC_RETRY_ATTEMPTS {
            match self.platform.write_brightness(handle, level) {
                Ok(()) => return true,
                Err(e) => {
                    trace!(attempt, error = %e, "direct brightness write attempt failed");
                }
            }
        }
        false
    }
}
