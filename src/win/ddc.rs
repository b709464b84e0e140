use windows::Win32::Devices::Display::{GetMonitorBrightness, SetMonitorBrightness};

use crate::control::DdcReading;
use crate::error::SysError;

use super::topology::PhysicalHandle;

/// One attempt at reading brightness over the monitor configuration
/// protocol; the caller owns the retry policy.
pub(crate) fn read_brightness(handle: &PhysicalHandle) -> Result<DdcReading, SysError> {
    let mut minimum = 0_u32;
    let mut current = 0_u32;
    let mut maximum = 0_u32;
    unsafe {
        GetMonitorBrightness(handle.raw(), &mut minimum, &mut current, &mut maximum)
            .map_err(SysError::GetMonitorBrightnessFailed)?;
    }
    Ok(DdcReading {
        minimum,
        current,
        maximum,
    })
}

/// One attempt at writing brightness over the monitor configuration
/// protocol.
pub(crate) fn write_brightness(handle: &PhysicalHandle, level: u32) -> Result<(), SysError> {
    unsafe {
        SetMonitorBrightness(handle.raw(), level).map_err(SysError::SetMonitorBrightnessFailed)
    }
}
