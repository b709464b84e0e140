//! The merged monitor inventory: instrumentation descriptors joined with the
//! resolver's reference table.

use tracing::{error, warn};

use crate::identity::IdentityResolver;
use crate::management::ManagementSource;
use crate::model::MonitorDescriptor;
use crate::topology::{DisplayTopology, HandleOf};

/// `VideoOutputTechnology` value for a panel attached over embedded
/// DisplayPort; what laptop panels report on most hardware.
pub const VIDEO_OUTPUT_EMBEDDED_DISPLAYPORT: u32 = 11;

/// Generic "internal" `VideoOutputTechnology` value; some firmware reports
/// this instead of the embedded-DisplayPort value.
// TODO: confirm on current eDP laptops whether this value is ever seen in
// WmiMonitorConnectionParams, or only in display-config output technology.
pub const VIDEO_OUTPUT_INTERNAL: u32 = 0x8000_0000;

fn is_internal_output(technology: u32) -> bool {
    technology == VIDEO_OUTPUT_EMBEDDED_DISPLAYPORT || technology == VIDEO_OUTPUT_INTERNAL
}

/// Classifies one monitor instance as internal or external.
///
/// Fail-open: a failed or empty classification query yields `external`,
/// because the direct control protocol remains attemptable for an external
/// monitor while the management path is useless for one.
pub fn classify_internal<M: ManagementSource>(management: &M, instance_name: &str) -> bool {
    match management.video_output_technology(instance_name) {
        Ok(Some(technology)) => is_internal_output(technology),
        Ok(None) => false,
        Err(e) => {
            warn!(
                instance_name,
                error = %e,
                "internal-panel classification failed, treating as external"
            );
            false
        }
    }
}

/// Produces [`MonitorDescriptor`]s by querying installed-monitor descriptors
/// and merging each with the reference resolved for the same identifier.
pub struct MonitorInventory<'a, P>
where
    P: DisplayTopology + ManagementSource,
{
    platform: &'a P,
}

impl<'a, P> MonitorInventory<'a, P>
where
    P: DisplayTopology + ManagementSource,
{
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    /// Lists every installed monitor.
    ///
    /// A failed descriptor query yields an empty inventory. Descriptors with
    /// no reference-table match are kept (name `"Unknown"`, no handle, no
    /// bounds) so monitors remain discoverable even when not addressable;
    /// matched internal panels are reported as `"Internal"` rather than by
    /// their friendly name.
    pub fn list_monitors(&self, exclude_internal: bool) -> Vec<MonitorDescriptor<HandleOf<P>>> {
        let records = match self.platform.monitor_ids() {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "monitor descriptor query failed, returning empty inventory");
                return Vec::new();
            }
        };

        let references = IdentityResolver::new(self.platform).resolve_all();

        let mut monitors = Vec::with_capacity(records.len());
        for record in records {
            let reference = references.iter().find(|r| r.id == record.instance_name);
            let internal = classify_internal(self.platform, &record.instance_name);
            if exclude_internal && internal {
                continue;
            }

            let name = match reference {
                Some(_) if internal => "Internal".to_string(),
                Some(r) => r.name.clone(),
                None => "Unknown".to_string(),
            };

            monitors.push(MonitorDescriptor {
                id: record.instance_name,
                name,
                manufacturer: record.manufacturer,
                serial_number: record.serial_number,
                product_code: record.product_code,
                internal,
                bounds: reference.map(|r| r.bounds),
                handle: reference.map(|r| r.handle.clone()),
            });
        }

        monitors
    }
}
