use serde::{Deserialize, Serialize};

/// Reserved identifier that targets every attached monitor instead of a
/// single device.
pub const ALL_MONITORS: &str = "GLOBAL";

/// One row of the canonical monitor-reference table built by a resolution
/// pass: a stable identifier, the OS friendly name, and the control handle
/// for the direct brightness protocol.
///
/// References are valid for one resolution pass only; handles may be
/// invalidated by any display reconfiguration, so nothing retains them
/// across calls.
#[derive(Clone, Debug)]
pub struct MonitorReference<H> {
    pub id: String,
    pub name: String,
    pub handle: H,
    pub bounds: MonitorBounds,
}

/// The externally visible monitor record: an instrumentation descriptor
/// merged with the reference table entry that shares its identifier.
///
/// `handle` is `None` when no display path matched the descriptor; the
/// monitor is still discoverable, just not directly addressable.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorDescriptor<H> {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub product_code: String,
    pub internal: bool,
    pub bounds: Option<MonitorBounds>,
    #[serde(skip)]
    pub handle: Option<H>,
}

/// Desktop-space rectangle of a monitor, captured during handle enumeration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonitorBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One entry of a batch brightness request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrightnessTarget {
    pub id: String,
    pub level: i32,
}

/// Outcome of a brightness read. `brightness` is `Some` exactly when
/// `success` is true.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GetBrightnessResult {
    pub success: bool,
    pub brightness: Option<u32>,
}

impl GetBrightnessResult {
    pub fn succeeded(brightness: u32) -> Self {
        Self {
            success: true,
            brightness: Some(brightness),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            brightness: None,
        }
    }
}

/// Outcome of a brightness write. `message` carries a human-readable reason
/// on failure and is `None` when there is nothing useful to say.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetBrightnessResult {
    pub success: bool,
    pub message: Option<String>,
}

impl SetBrightnessResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            message: None,
        }
    }

    pub fn failed_with(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            message: (!message.is_empty()).then_some(message),
        }
    }
}
