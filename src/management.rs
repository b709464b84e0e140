use crate::error::Error;

/// An installed-monitor descriptor from the instrumentation subsystem, with
/// the fixed-width identity fields already decoded to text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorIdRecord {
    /// Instance identifier; equal by construction to the identifiers the
    /// resolver derives from raw device paths.
    pub instance_name: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub product_code: String,
}

/// A session with the platform's instrumentation subsystem.
///
/// Unlike [`crate::topology::DisplayTopology`], these operations are fallible
/// at the boundary: the recovery policy (empty inventory, fail-open
/// classification, fallback to direct control) differs per caller, so errors
/// are surfaced and each caller applies its own.
pub trait ManagementSource {
    /// All installed monitor-ID descriptors.
    fn monitor_ids(&self) -> Result<Vec<MonitorIdRecord>, Error>;

    /// The video output technology reported for one monitor instance, or
    /// `None` when the instance has no connection-parameter record.
    fn video_output_technology(&self, instance_name: &str) -> Result<Option<u32>, Error>;

    /// Current brightness of one monitor instance, or `None` when the
    /// instance exposes no brightness record (external monitors do not).
    fn current_brightness(&self, instance_name: &str) -> Result<Option<u8>, Error>;

    /// Invokes the brightness-set method on one monitor instance.
    fn apply_brightness(&self, instance_name: &str, level: u8) -> Result<(), Error>;
}
