use crate::model::MonitorBounds;

/// Shorthand for the control-handle type a topology implementation produces.
pub type HandleOf<T> = <T as DisplayTopology>::Handle;

/// Target metadata for one active display path. Per-path lookup failures are
/// reported as `"Unknown"` sentinels rather than errors, so a single bad
/// path never hides the rest of the topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathInfo {
    /// Raw device path of the path's target (the monitor end).
    pub device_path: String,
    /// Human-readable monitor name reported for the target.
    pub friendly_name: String,
    /// GDI device name of the path's source (e.g. `\\.\DISPLAY1`), the join
    /// key against enumerated handles.
    pub gdi_device_name: String,
}

/// One enumerated OS monitor handle together with the GDI device name it
/// belongs to.
#[derive(Clone, Debug)]
pub struct HandleEntry<H> {
    pub handle: H,
    pub gdi_device_name: String,
    pub bounds: MonitorBounds,
}

/// Access to the OS display-configuration subsystem: the set of active
/// source-to-target paths and the monitor handles usable for direct
/// brightness control.
///
/// Both operations are infallible at this boundary; implementations log
/// unrecoverable enumeration errors and return empty collections, matching
/// the recover-to-empty policy of every consumer.
pub trait DisplayTopology {
    /// Opaque control handle for the direct brightness protocol. Cloning
    /// must be cheap; implementations share ownership rather than duplicate
    /// OS resources.
    type Handle: Clone + std::fmt::Debug;

    /// Lists the currently active display paths in OS enumeration order.
    /// The order is not stable across calls, but identity derivation is
    /// deterministic for a fixed order.
    fn list_active_paths(&self) -> Vec<PathInfo>;

    /// Enumerates monitor handles with their GDI device names. Handles that
    /// resolve to no physical monitor are skipped.
    fn enumerate_handles(&self) -> Vec<HandleEntry<Self::Handle>>;
}
