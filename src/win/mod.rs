//! Windows implementations of the platform traits: display-configuration
//! topology, the WMI instrumentation session, and the physical-monitor
//! control protocol.

mod client;
mod ddc;
mod topology;

pub use client::ManagementClient;
pub use topology::PhysicalHandle;

use tracing::error;

use crate::control::{DdcReading, DirectControl};
use crate::error::Error;
use crate::management::{ManagementSource, MonitorIdRecord};
use crate::service::MonitorService;
use crate::topology::{DisplayTopology, HandleEntry, PathInfo};

/// The live Windows platform, owning one instrumentation session.
pub struct WindowsPlatform {
    client: ManagementClient,
}

impl WindowsPlatform {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            client: ManagementClient::connect()?,
        })
    }
}

impl DisplayTopology for WindowsPlatform {
    type Handle = PhysicalHandle;

    fn list_active_paths(&self) -> Vec<PathInfo> {
        let mut paths = Vec::new();
        for item in topology::active_paths() {
            match item {
                Ok(path) => paths.push(path),
                Err(e) => {
                    error!(error = %e, "display path enumeration failed, returning empty topology");
                    return Vec::new();
                }
            }
        }
        paths
    }

    fn enumerate_handles(&self) -> Vec<HandleEntry<Self::Handle>> {
        let mut entries = Vec::new();
        for item in topology::handle_entries() {
            match item {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    error!(error = %e, "monitor handle enumeration failed, returning no handles");
                    return Vec::new();
                }
            }
        }
        entries
    }
}

impl ManagementSource for WindowsPlatform {
    fn monitor_ids(&self) -> Result<Vec<MonitorIdRecord>, Error> {
        self.client.monitor_ids()
    }

    fn video_output_technology(&self, instance_name: &str) -> Result<Option<u32>, Error> {
        self.client.video_output_technology(instance_name)
    }

    fn current_brightness(&self, instance_name: &str) -> Result<Option<u8>, Error> {
        self.client.current_brightness(instance_name)
    }

    fn apply_brightness(&self, instance_name: &str, level: u8) -> Result<(), Error> {
        self.client.apply_brightness(instance_name, level)
    }
}

impl DirectControl for WindowsPlatform {
    type Handle = PhysicalHandle;

    fn read_brightness(&self, handle: &Self::Handle) -> Result<DdcReading, Error> {
        Ok(ddc::read_brightness(handle)?)
    }

    fn write_brightness(&self, handle: &Self::Handle, level: u32) -> Result<(), Error> {
        Ok(ddc::write_brightness(handle, level)?)
    }
}

impl MonitorService<WindowsPlatform> {
    /// Opens a service over the live Windows platform. Construct one per
    /// top-level call; dropping it releases the instrumentation session.
    pub fn connect() -> Result<Self, Error> {
        Ok(Self::new(WindowsPlatform::new()?))
    }
}
