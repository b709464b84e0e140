use std::error::Error as StdError;

use thiserror::Error;

type Source = Box<dyn StdError + Send + Sync>;

/// Errors used in this API
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Enumerating the display topology failed
    #[error("Failed to enumerate the display topology")]
    TopologyEnumerationFailed(#[source] Source),
    /// Opening a session to the instrumentation subsystem failed
    #[error("Failed to connect to the instrumentation subsystem")]
    ManagementConnectionFailed(#[source] Source),
    /// An instrumentation query failed
    #[error("Instrumentation query failed")]
    ManagementQueryFailed(#[source] Source),
    /// Invoking an instrumentation method failed
    #[error("Instrumentation method invocation failed")]
    ManagementMethodFailed(#[source] Source),
    /// No brightness-method instance exists for the given monitor
    #[error("No brightness instance found for monitor {0}")]
    BrightnessInstanceMissing(String),
    /// A single monitor brightness command failed (one attempt; callers retry)
    #[error("Monitor brightness command failed")]
    DirectControlFailed(#[source] Source),
}

#[cfg(windows)]
pub(crate) use sys::SysError;

#[cfg(windows)]
mod sys {
    use thiserror::Error;
    use windows::core::Error as WinError;
    use wmi::WMIError;

    use super::Error;

    #[derive(Debug, Error)]
    pub(crate) enum SysError {
        #[error("Failed to enumerate device monitors")]
        EnumDisplayMonitorsFailed(#[source] WinError),
        #[error("Failed to get display config buffer sizes")]
        GetDisplayConfigBufferSizesFailed(#[source] WinError),
        #[error("Failed to query display config")]
        QueryDisplayConfigFailed(#[source] WinError),
        #[error("Failed to get monitor info")]
        GetMonitorInfoFailed(#[source] WinError),
        #[error("Failed to get physical monitors from the HMONITOR")]
        GetPhysicalMonitorsFailed(#[source] WinError),
        #[error("Failed to read monitor brightness over the monitor configuration protocol")]
        GetMonitorBrightnessFailed(#[source] WinError),
        #[error("Failed to write monitor brightness over the monitor configuration protocol")]
        SetMonitorBrightnessFailed(#[source] WinError),
        #[error("Failed to connect to the WMI service")]
        WmiConnectionFailed(#[source] WMIError),
        #[error("WMI query failed")]
        WmiQueryFailed(#[source] WMIError),
        #[error("WMI method execution failed")]
        WmiMethodFailed(#[source] WMIError),
    }

    impl From<SysError> for Error {
        fn from(e: SysError) -> Self {
            match &e {
                SysError::EnumDisplayMonitorsFailed(..)
                | SysError::GetDisplayConfigBufferSizesFailed(..)
                | SysError::QueryDisplayConfigFailed(..)
                | SysError::GetMonitorInfoFailed(..)
                | SysError::GetPhysicalMonitorsFailed(..) => {
                    Self::TopologyEnumerationFailed(Box::new(e))
                }
                SysError::GetMonitorBrightnessFailed(..)
                | SysError::SetMonitorBrightnessFailed(..) => Self::DirectControlFailed(Box::new(e)),
                SysError::WmiConnectionFailed(..) => Self::ManagementConnectionFailed(Box::new(e)),
                SysError::WmiQueryFailed(..) => Self::ManagementQueryFailed(Box::new(e)),
                SysError::WmiMethodFailed(..) => Self::ManagementMethodFailed(Box::new(e)),
            }
        }
    }
}
