use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wmi::{COMLibrary, Variant, WMIConnection};

use crate::codec::{decode_utf16_field, escape_wql};
use crate::error::{Error, SysError};
use crate::management::{ManagementSource, MonitorIdRecord};

/// Namespace hosting the monitor instrumentation classes.
const NAMESPACE: &str = "ROOT\\WMI";

/// A session with the WMI service.
///
/// One client is constructed per [`crate::service::MonitorService`] and
/// shared by reference across that service's operations; the COM apartment
/// is initialized for the calling thread on first use and the session is
/// released when the client drops.
pub struct ManagementClient {
    connection: WMIConnection,
}

#[derive(Deserialize)]
#[serde(rename = "WmiMonitorID")]
struct WmiMonitorId {
    #[serde(rename = "InstanceName")]
    instance_name: String,
    #[serde(rename = "ManufacturerName")]
    manufacturer_name: Option<Vec<u16>>,
    #[serde(rename = "SerialNumberID")]
    serial_number_id: Option<Vec<u16>>,
    #[serde(rename = "ProductCodeID")]
    product_code_id: Option<Vec<u16>>,
}

#[derive(Deserialize)]
struct WmiMonitorConnectionParams {
    #[serde(rename = "VideoOutputTechnology")]
    video_output_technology: u32,
}

#[derive(Deserialize)]
struct WmiMonitorBrightness {
    #[serde(rename = "InstanceName")]
    instance_name: String,
    #[serde(rename = "CurrentBrightness")]
    current_brightness: u8,
}

#[derive(Deserialize)]
#[serde(rename = "WmiMonitorBrightnessMethods")]
struct WmiMonitorBrightnessMethods {
    #[serde(rename = "__Path")]
    object_path: String,
}

#[derive(Serialize)]
struct WmiSetBrightnessInput {
    #[serde(rename = "Timeout")]
    timeout: u32,
    #[serde(rename = "Brightness")]
    brightness: u8,
}

impl ManagementClient {
    /// Opens a session against [`NAMESPACE`].
    pub fn connect() -> Result<Self, Error> {
        let com = COMLibrary::new().map_err(SysError::WmiConnectionFailed)?;
        let connection = WMIConnection::with_namespace_path(NAMESPACE, com)
            .map_err(SysError::WmiConnectionFailed)?;
        Ok(Self { connection })
    }

    fn query<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        Ok(self.connection.query().map_err(SysError::WmiQueryFailed)?)
    }

    fn raw_query<T: serde::de::DeserializeOwned>(&self, wql: &str) -> Result<Vec<T>, Error> {
        Ok(self
            .connection
            .raw_query(wql)
            .map_err(SysError::WmiQueryFailed)?)
    }

    fn instances_named<T: serde::de::DeserializeOwned>(
        &self,
        class: &str,
        instance_name: &str,
    ) -> Result<Vec<T>, Error> {
        let wql = format!(
            "SELECT * FROM {class} WHERE InstanceName='{}'",
            escape_wql(instance_name)
        );
        self.raw_query(&wql)
    }
}

impl ManagementSource for ManagementClient {
    fn monitor_ids(&self) -> Result<Vec<MonitorIdRecord>, Error> {
        let rows: Vec<WmiMonitorId> = self.query()?;
        Ok(rows
            .into_iter()
            .map(|row| MonitorIdRecord {
                instance_name: row.instance_name,
                manufacturer: decode_utf16_field(row.manufacturer_name.as_deref().unwrap_or_default()),
                serial_number: decode_utf16_field(row.serial_number_id.as_deref().unwrap_or_default()),
                product_code: decode_utf16_field(row.product_code_id.as_deref().unwrap_or_default()),
            })
            .collect())
    }

    fn video_output_technology(&self, instance_name: &str) -> Result<Option<u32>, Error> {
        let rows: Vec<WmiMonitorConnectionParams> =
            self.instances_named("WmiMonitorConnectionParams", instance_name)?;
        Ok(rows.into_iter().next().map(|row| row.video_output_technology))
    }

    fn current_brightness(&self, instance_name: &str) -> Result<Option<u8>, Error> {
        let rows: Vec<WmiMonitorBrightness> =
            self.raw_query("SELECT * FROM WmiMonitorBrightness")?;
        Ok(rows
            .into_iter()
            .find(|row| row.instance_name == instance_name)
            .map(|row| row.current_brightness))
    }

    fn apply_brightness(&self, instance_name: &str, level: u8) -> Result<(), Error> {
        let instances: Vec<WmiMonitorBrightnessMethods> =
            self.instances_named("WmiMonitorBrightnessMethods", instance_name)?;
        let Some(instance) = instances.into_iter().next() else {
            return Err(Error::BrightnessInstanceMissing(instance_name.to_string()));
        };

        let input = WmiSetBrightnessInput {
            timeout: 0,
            brightness: level,
        };
        let _output: Option<HashMap<String, Variant>> = self
            .connection
            .exec_instance_method::<WmiMonitorBrightnessMethods, _, _>(
                &instance.object_path,
                "WmiSetBrightness",
                input,
            )
            .map_err(SysError::WmiMethodFailed)?;
        Ok(())
    }
}
