use std::iter::once;
use std::mem::size_of;
use std::sync::Arc;

use itertools::Either;
use tracing::debug;
use windows::Win32::Devices::Display::DestroyPhysicalMonitor;
use windows::Win32::Devices::Display::DisplayConfigGetDeviceInfo;
use windows::Win32::Devices::Display::GetDisplayConfigBufferSizes;
use windows::Win32::Devices::Display::GetNumberOfPhysicalMonitorsFromHMONITOR;
use windows::Win32::Devices::Display::GetPhysicalMonitorsFromHMONITOR;
use windows::Win32::Devices::Display::QueryDisplayConfig;
use windows::Win32::Devices::Display::DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME;
use windows::Win32::Devices::Display::DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME;
use windows::Win32::Devices::Display::DISPLAYCONFIG_MODE_INFO;
use windows::Win32::Devices::Display::DISPLAYCONFIG_PATH_INFO;
use windows::Win32::Devices::Display::DISPLAYCONFIG_SOURCE_DEVICE_NAME;
use windows::Win32::Devices::Display::DISPLAYCONFIG_TARGET_DEVICE_NAME;
use windows::Win32::Devices::Display::PHYSICAL_MONITOR;
use windows::Win32::Devices::Display::QDC_ONLY_ACTIVE_PATHS;
use windows::Win32::Foundation::BOOL;
use windows::Win32::Foundation::ERROR_INSUFFICIENT_BUFFER;
use windows::Win32::Foundation::ERROR_SUCCESS;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Foundation::LPARAM;
use windows::Win32::Foundation::RECT;
use windows::Win32::Foundation::WIN32_ERROR;
use windows::Win32::Graphics::Gdi::EnumDisplayMonitors;
use windows::Win32::Graphics::Gdi::GetMonitorInfoW;
use windows::Win32::Graphics::Gdi::HDC;
use windows::Win32::Graphics::Gdi::HMONITOR;
use windows::Win32::Graphics::Gdi::MONITORINFO;
use windows::Win32::Graphics::Gdi::MONITORINFOEXW;

use crate::codec::wide_to_string;
use crate::error::SysError;
use crate::model::MonitorBounds;
use crate::topology::{HandleEntry, PathInfo};

/// Sentinel for per-path device-info queries that fail; a single bad path
/// must not hide the rest of the topology.
const UNKNOWN: &str = "Unknown";

/// A control handle for one physical monitor, destroyed when the last clone
/// is dropped. Cloning shares ownership; the underlying OS handle is never
/// duplicated.
#[derive(Clone)]
pub struct PhysicalHandle(Arc<OwnedPhysicalMonitor>);

impl PhysicalHandle {
    fn new(handle: HANDLE) -> Self {
        Self(Arc::new(OwnedPhysicalMonitor(handle)))
    }

    pub(crate) fn raw(&self) -> HANDLE {
        self.0 .0
    }
}

impl std::fmt::Debug for PhysicalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0 .0 .0)
    }
}

/// A safe wrapper for a physical monitor handle that implements `Drop` to
/// call `DestroyPhysicalMonitor`
struct OwnedPhysicalMonitor(HANDLE);

impl Drop for OwnedPhysicalMonitor {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyPhysicalMonitor(self.0);
        }
    }
}

/// Resolves the active display paths to [`PathInfo`]s. Setup failures
/// short-circuit as a single error item; per-path lookup failures degrade to
/// [`UNKNOWN`] sentinels.
pub(crate) fn active_paths() -> impl Iterator<Item = Result<PathInfo, SysError>> {
    unsafe {
        let paths = match query_display_paths() {
            Ok(paths) => paths,
            Err(e) => return Either::Right(once(Err(e))),
        };

        Either::Left(paths.into_iter().map(|path| {
            let (device_path, friendly_name) = resolve_target_names(&path);
            let gdi_device_name = resolve_source_name(&path);
            Ok(PathInfo {
                device_path,
                friendly_name,
                gdi_device_name,
            })
        }))
    }
}

/// Enumerates monitor handles joined with their GDI device names and desktop
/// rectangles. Handles backed by no physical monitor are skipped, as are
/// handles whose info cannot be read.
pub(crate) fn handle_entries() -> impl Iterator<Item = Result<HandleEntry<PhysicalHandle>, SysError>>
{
    unsafe {
        let hmonitors = match enum_display_monitors() {
            Ok(monitors) => monitors,
            Err(e) => return Either::Right(once(Err(e))),
        };

        Either::Left(hmonitors.into_iter().filter_map(|hmonitor| {
            let handle = match first_physical_monitor(hmonitor) {
                Ok(Some(handle)) => handle,
                Ok(None) => return None,
                Err(e) => {
                    debug!(error = %e, "skipping monitor handle with unreadable physical monitors");
                    return None;
                }
            };
            let info = match monitor_info(hmonitor) {
                Ok(info) => info,
                Err(e) => {
                    debug!(error = %e, "skipping monitor handle with unreadable monitor info");
                    return None;
                }
            };
            Some(Ok(HandleEntry {
                handle,
                gdi_device_name: wide_to_string(&info.szDevice),
                bounds: bounds_of(info.monitorInfo.rcMonitor),
            }))
        }))
    }
}

/// Runs the size-query/query cycle for the active display paths.\
/// The number of active paths can change between the two calls; a
/// buffer-too-small result restarts the cycle with fresh sizes instead of
/// failing.
unsafe fn query_display_paths() -> Result<Vec<DISPLAYCONFIG_PATH_INFO>, SysError> {
    loop {
        let mut path_count = 0;
        let mut mode_count = 0;
        GetDisplayConfigBufferSizes(QDC_ONLY_ACTIVE_PATHS, &mut path_count, &mut mode_count)
            .ok()
            .map_err(SysError::GetDisplayConfigBufferSizesFailed)?;
        let mut display_paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_count as usize];
        let mut display_modes = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_count as usize];
        let status = QueryDisplayConfig(
            QDC_ONLY_ACTIVE_PATHS,
            &mut path_count,
            display_paths.as_mut_ptr(),
            &mut mode_count,
            display_modes.as_mut_ptr(),
            None,
        );
        if status == ERROR_INSUFFICIENT_BUFFER {
            continue;
        }
        status.ok().map_err(SysError::QueryDisplayConfigFailed)?;
        // The query may return fewer paths than were allocated for.
        display_paths.truncate(path_count as usize);
        return Ok(display_paths);
    }
}

/// Resolves a path's target metadata: the raw monitor device path and the
/// friendly device name.
unsafe fn resolve_target_names(path: &DISPLAYCONFIG_PATH_INFO) -> (String, String) {
    let mut device_name = DISPLAYCONFIG_TARGET_DEVICE_NAME::default();
    device_name.header.size = size_of::<DISPLAYCONFIG_TARGET_DEVICE_NAME>() as u32;
    device_name.header.adapterId = path.targetInfo.adapterId;
    device_name.header.id = path.targetInfo.id;
    device_name.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME;

    match WIN32_ERROR(DisplayConfigGetDeviceInfo(&mut device_name.header) as u32) {
        ERROR_SUCCESS => (
            wide_to_string(&device_name.monitorDevicePath),
            wide_to_string(&device_name.monitorFriendlyDeviceName),
        ),
        _ => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    }
}

/// Resolves a path's source-side GDI device name (e.g. `\\.\DISPLAY1`),
/// which is the join key against enumerated monitor handles.
unsafe fn resolve_source_name(path: &DISPLAYCONFIG_PATH_INFO) -> String {
    let mut source_name = DISPLAYCONFIG_SOURCE_DEVICE_NAME::default();
    source_name.header.size = size_of::<DISPLAYCONFIG_SOURCE_DEVICE_NAME>() as u32;
    source_name.header.adapterId = path.targetInfo.adapterId;
    source_name.header.id = path.sourceInfo.id;
    source_name.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME;

    match WIN32_ERROR(DisplayConfigGetDeviceInfo(&mut source_name.header) as u32) {
        ERROR_SUCCESS => wide_to_string(&source_name.viewGdiDeviceName),
        _ => UNKNOWN.to_string(),
    }
}

/// Calls `EnumDisplayMonitors` and returns a list of `HMONITOR` handles.\
/// Note that a `HMONITOR` is a logical construct that may correspond to
/// multiple physical monitors, e.g. when in "Duplicate" mode two physical
/// monitors will belong to the same `HMONITOR`
unsafe fn enum_display_monitors() -> Result<Vec<HMONITOR>, SysError> {
    unsafe extern "system" fn enum_monitors(
        handle: HMONITOR,
        _: HDC,
        _: *mut RECT,
        data: LPARAM,
    ) -> BOOL {
        let monitors = &mut *(data.0 as *mut Vec<HMONITOR>);
        monitors.push(handle);
        true.into()
    }
    let mut hmonitors = Vec::<HMONITOR>::new();
    EnumDisplayMonitors(
        HDC::default(),
        None,
        Some(enum_monitors),
        LPARAM(&mut hmonitors as *mut _ as isize),
    )
    .ok()
    .map_err(SysError::EnumDisplayMonitorsFailed)?;
    Ok(hmonitors)
}

/// Gets the first `PHYSICAL_MONITOR` handle that belongs to a `HMONITOR`,
/// or `None` when the `HMONITOR` has no physical monitors behind it.\
/// These handles are required for the DDC/CI brightness functions; a valid
/// handle is still returned for non DDC/CI monitors.
unsafe fn first_physical_monitor(hmonitor: HMONITOR) -> Result<Option<PhysicalHandle>, SysError> {
    let mut physical_number: u32 = 0;
    GetNumberOfPhysicalMonitorsFromHMONITOR(hmonitor, &mut physical_number)
        .map_err(SysError::GetPhysicalMonitorsFailed)?;
    if physical_number == 0 {
        return Ok(None);
    }
    let mut raw_physical_monitors = vec![PHYSICAL_MONITOR::default(); physical_number as usize];
    // Allocate first so that pushing the wrapped handles always succeeds.
    let mut physical_monitors = Vec::with_capacity(raw_physical_monitors.len());
    GetPhysicalMonitorsFromHMONITOR(hmonitor, &mut raw_physical_monitors)
        .map_err(SysError::GetPhysicalMonitorsFailed)?;
    // Wrap immediately so the handles don't leak; only the first one is
    // addressed, the rest are destroyed when this vector drops.
    raw_physical_monitors
        .into_iter()
        .for_each(|pm| physical_monitors.push(PhysicalHandle::new(pm.hPhysicalMonitor)));
    Ok(physical_monitors.into_iter().next())
}

unsafe fn monitor_info(hmonitor: HMONITOR) -> Result<MONITORINFOEXW, SysError> {
    let mut info = MONITORINFOEXW::default();
    info.monitorInfo.cbSize = size_of::<MONITORINFOEXW>() as u32;
    let info_ptr = &mut info as *mut _ as *mut MONITORINFO;
    GetMonitorInfoW(hmonitor, info_ptr)
        .ok()
        .map_err(SysError::GetMonitorInfoFailed)?;
    Ok(info)
}

fn bounds_of(rect: RECT) -> MonitorBounds {
    MonitorBounds {
        x: rect.left,
        y: rect.top,
        width: rect.right - rect.left,
        height: rect.bottom - rect.top,
    }
}
