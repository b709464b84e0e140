//! Derivation of stable monitor identifiers and the reference table joining
//! the two enumeration subsystems.

use tracing::debug;

use crate::model::MonitorReference;
use crate::topology::DisplayTopology;

/// Leading segment of every derived identifier.
const IDENTIFIER_PREFIX: &str = "DISPLAY";

/// Derives the composite identifier for a monitor from its raw device path
/// and the number of identical device paths seen earlier in the same
/// resolution pass.
///
/// A raw device path looks like
/// `\\?\DISPLAY#GSM59F2#5&1a2b3c&0&UID4357#{guid}`; the vendor and device
/// segments are recombined as `DISPLAY\GSM59F2\5&1a2b3c&0&UID4357_0`. This
/// reproduces the instrumentation subsystem's instance-name format, which is
/// what lets the two enumerations be joined by plain string equality. The
/// occurrence suffix disambiguates physically identical monitors.
///
/// Paths with fewer than three `#` segments cannot yield vendor/device
/// segments (the sentinel `"Unknown"` path is the common case); the raw
/// string stands in so the identifier stays unique per occurrence.
pub fn derive_identifier(device_path: &str, occurrence: usize) -> String {
    let mut parts = device_path.split('#');
    let _prefix = parts.next();
    match (parts.next(), parts.next()) {
        (Some(vendor), Some(device)) => {
            format!("{IDENTIFIER_PREFIX}\\{vendor}\\{device}_{occurrence}")
        }
        _ => format!("{device_path}_{occurrence}"),
    }
}

/// Builds the canonical monitor-reference table for one resolution pass.
///
/// Nothing is cached: every resolution walks the topology afresh, because a
/// stale control handle is worse than the cost of re-enumeration.
pub struct IdentityResolver<'a, T: DisplayTopology> {
    topology: &'a T,
}

impl<'a, T: DisplayTopology> IdentityResolver<'a, T> {
    pub fn new(topology: &'a T) -> Self {
        Self { topology }
    }

    /// Resolves every active display path to a [`MonitorReference`], in path
    /// enumeration order.
    ///
    /// Each path's handle is found by exact match between the path's source
    /// GDI device name and the handle's GDI device name. Paths with no
    /// matching handle are dropped; such a monitor is not directly
    /// addressable, though it may still surface in the inventory. Only
    /// matched paths consume an occurrence slot, so the counters of the
    /// surviving references are contiguous per device path.
    pub fn resolve_all(&self) -> Vec<MonitorReference<T::Handle>> {
        let paths = self.topology.list_active_paths();
        let handles = self.topology.enumerate_handles();

        let mut seen_paths: Vec<String> = Vec::with_capacity(paths.len());
        let mut references = Vec::with_capacity(paths.len());

        for path in paths {
            let Some(entry) = handles
                .iter()
                .find(|h| h.gdi_device_name == path.gdi_device_name)
            else {
                debug!(
                    gdi_device_name = %path.gdi_device_name,
                    "no control handle for active path, dropping from reference table"
                );
                continue;
            };

            let occurrence = seen_paths
                .iter()
                .filter(|p| p.as_str() == path.device_path)
                .count();
            let id = derive_identifier(&path.device_path, occurrence);
            seen_paths.push(path.device_path);

            references.push(MonitorReference {
                id,
                name: path.friendly_name,
                handle: entry.handle.clone(),
                bounds: entry.bounds,
            });
        }

        references
    }

    /// Looks up a single reference by identifier via a full re-resolution.
    pub fn resolve_by_id(&self, id: &str) -> Option<MonitorReference<T::Handle>> {
        self.resolve_all().into_iter().find(|r| r.id == id)
    }
}
