//! Engine behavior over a mock platform: identity resolution with duplicate
//! hardware, mechanism selection and fallback, retry bounds, and the
//! batch/broadcast success semantics.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use win32_brightness_control::{
    BrightnessController, BrightnessTarget, ControlPath, DdcReading, DirectControl,
    DisplayTopology, Error, HandleEntry, IdentityResolver, ManagementSource, MonitorBounds,
    MonitorIdRecord, MonitorInventory, MonitorService, PathInfo, ALL_MONITORS,
    DDC_RETRY_ATTEMPTS,
};

// ── Mock platform ────────────────────────────────────────────────

/// Embedded-DisplayPort output technology, the common internal-panel value.
const TECH_EDP: u32 = 11;
const TECH_HDMI: u32 = 5;

#[derive(Default)]
struct MockPlatform {
    paths: Vec<PathInfo>,
    handles: Vec<HandleEntry<u32>>,
    records: Vec<MonitorIdRecord>,
    output_technology: HashMap<String, u32>,
    classification_errors: HashSet<String>,
    fail_monitor_ids: bool,
    management_write_errors: HashSet<String>,
    management_levels: RefCell<HashMap<String, u8>>,
    ddc_levels: RefCell<HashMap<u32, u32>>,
    ddc_read_failures: RefCell<HashMap<u32, u32>>,
    ddc_write_failures: RefCell<HashMap<u32, u32>>,
    ddc_read_attempts: RefCell<HashMap<u32, u32>>,
    ddc_write_attempts: RefCell<HashMap<u32, u32>>,
}

impl MockPlatform {
    fn device_path(vendor: &str, unit: &str) -> String {
        format!("\\\\?\\DISPLAY#{vendor}#{unit}#{{11111111-2222-3333-4444-555555555555}}")
    }

    fn instance_name(vendor: &str, unit: &str, occurrence: usize) -> String {
        format!("DISPLAY\\{vendor}\\{unit}_{occurrence}")
    }

    fn add_path(&mut self, vendor: &str, unit: &str, name: &str, gdi: &str) {
        self.paths.push(PathInfo {
            device_path: Self::device_path(vendor, unit),
            friendly_name: name.to_string(),
            gdi_device_name: gdi.to_string(),
        });
    }

    fn add_handle(&mut self, handle: u32, gdi: &str) {
        self.handles.push(HandleEntry {
            handle,
            gdi_device_name: gdi.to_string(),
            bounds: MonitorBounds::default(),
        });
    }

    fn add_record(&mut self, instance_name: &str) {
        self.records.push(MonitorIdRecord {
            instance_name: instance_name.to_string(),
            manufacturer: "GSM".to_string(),
            serial_number: "123456789".to_string(),
            product_code: "59F2".to_string(),
        });
    }

    /// A fully wired external monitor: active path, matching handle,
    /// instrumentation descriptor, and an initial direct-control level.
    fn add_external(&mut self, vendor: &str, unit: &str, name: &str, gdi: &str, handle: u32) -> String {
        self.add_path(vendor, unit, name, gdi);
        self.add_handle(handle, gdi);
        let id = Self::instance_name(vendor, unit, 0);
        self.add_record(&id);
        self.output_technology.insert(id.clone(), TECH_HDMI);
        self.ddc_levels.borrow_mut().insert(handle, 50);
        id
    }

    /// A fully wired internal panel: management-controlled, but with a
    /// handle so the direct protocol remains available as a fallback.
    fn add_internal(&mut self, vendor: &str, unit: &str, gdi: &str, handle: u32) -> String {
        self.add_path(vendor, unit, "Integrated Panel", gdi);
        self.add_handle(handle, gdi);
        let id = Self::instance_name(vendor, unit, 0);
        self.add_record(&id);
        self.output_technology.insert(id.clone(), TECH_EDP);
        self.management_levels.borrow_mut().insert(id.clone(), 50);
        self.ddc_levels.borrow_mut().insert(handle, 50);
        id
    }

    fn ddc_level(&self, handle: u32) -> Option<u32> {
        self.ddc_levels.borrow().get(&handle).copied()
    }

    fn write_attempts(&self, handle: u32) -> u32 {
        self.ddc_write_attempts.borrow().get(&handle).copied().unwrap_or(0)
    }

    fn read_attempts(&self, handle: u32) -> u32 {
        self.ddc_read_attempts.borrow().get(&handle).copied().unwrap_or(0)
    }
}

impl DisplayTopology for MockPlatform {
    type Handle = u32;

    fn list_active_paths(&self) -> Vec<PathInfo> {
        self.paths.clone()
    }

    fn enumerate_handles(&self) -> Vec<HandleEntry<u32>> {
        self.handles.clone()
    }
}

impl ManagementSource for MockPlatform {
    fn monitor_ids(&self) -> Result<Vec<MonitorIdRecord>, Error> {
        if self.fail_monitor_ids {
            return Err(Error::ManagementQueryFailed("simulated query failure".into()));
        }
        Ok(self.records.clone())
    }

    fn video_output_technology(&self, instance_name: &str) -> Result<Option<u32>, Error> {
        if self.classification_errors.contains(instance_name) {
            return Err(Error::ManagementQueryFailed("simulated query failure".into()));
        }
        Ok(self.output_technology.get(instance_name).copied())
    }

    fn current_brightness(&self, instance_name: &str) -> Result<Option<u8>, Error> {
        Ok(self.management_levels.borrow().get(instance_name).copied())
    }

    fn apply_brightness(&self, instance_name: &str, level: u8) -> Result<(), Error> {
        if self.management_write_errors.contains(instance_name) {
            return Err(Error::ManagementMethodFailed("simulated method failure".into()));
        }
        match self.management_levels.borrow_mut().get_mut(instance_name) {
            Some(slot) => {
                *slot = level;
                Ok(())
            }
            None => Err(Error::BrightnessInstanceMissing(instance_name.to_string())),
        }
    }
}

impl DirectControl for MockPlatform {
    type Handle = u32;

    fn read_brightness(&self, handle: &u32) -> Result<DdcReading, Error> {
        *self.ddc_read_attempts.borrow_mut().entry(*handle).or_insert(0) += 1;
        if let Some(remaining) = self.ddc_read_failures.borrow_mut().get_mut(handle) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::DirectControlFailed("transient bus failure".into()));
            }
        }
        match self.ddc_level(*handle) {
            Some(current) => Ok(DdcReading {
                minimum: 0,
                current,
                maximum: 100,
            }),
            None => Err(Error::DirectControlFailed("monitor does not respond".into())),
        }
    }

    fn write_brightness(&self, handle: &u32, level: u32) -> Result<(), Error> {
        *self.ddc_write_attempts.borrow_mut().entry(*handle).or_insert(0) += 1;
        if let Some(remaining) = self.ddc_write_failures.borrow_mut().get_mut(handle) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::DirectControlFailed("transient bus failure".into()));
            }
        }
        match self.ddc_levels.borrow_mut().get_mut(handle) {
            Some(slot) => {
                *slot = level;
                Ok(())
            }
            None => Err(Error::DirectControlFailed("monitor does not respond".into())),
        }
    }
}

// ── Identity resolution ──────────────────────────────────────────

#[test]
fn duplicate_hardware_resolves_to_distinct_occurrence_counters() {
    let mut platform = MockPlatform::default();
    // Two physically identical monitors plus one different model.
    platform.add_path("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1");
    platform.add_path("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY2");
    platform.add_path("DEL4066", "unitB", "DELL U2412M", "\\\\.\\DISPLAY3");
    platform.add_handle(1, "\\\\.\\DISPLAY1");
    platform.add_handle(2, "\\\\.\\DISPLAY2");
    platform.add_handle(3, "\\\\.\\DISPLAY3");

    let references = IdentityResolver::new(&platform).resolve_all();
    let ids: Vec<&str> = references.iter().map(|r| r.id.as_str()).collect();

    assert_eq!(
        ids,
        [
            "DISPLAY\\GSM59F2\\unitA_0",
            "DISPLAY\\GSM59F2\\unitA_1",
            "DISPLAY\\DEL4066\\unitB_0",
        ]
    );
    // Stable correspondence with enumeration order.
    assert_eq!(references[0].handle, 1);
    assert_eq!(references[1].handle, 2);
    assert_eq!(references[2].handle, 3);
}

#[test]
fn path_without_matching_handle_is_dropped_and_consumes_no_occurrence_slot() {
    let mut platform = MockPlatform::default();
    platform.add_path("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1");
    platform.add_path("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY2");
    // Only the second path has a handle; it still gets occurrence 0.
    platform.add_handle(2, "\\\\.\\DISPLAY2");

    let references = IdentityResolver::new(&platform).resolve_all();

    assert_eq!(references.len(), 1);
    assert_eq!(references[0].id, "DISPLAY\\GSM59F2\\unitA_0");
    assert_eq!(references[0].handle, 2);
}

#[test]
fn resolve_by_id_finds_the_same_reference() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let resolver = IdentityResolver::new(&platform);
    let reference = resolver.resolve_by_id(&id).expect("reference should resolve");
    assert_eq!(reference.name, "LG ULTRAWIDE");
    assert!(resolver.resolve_by_id("DISPLAY\\NOPE\\none_0").is_none());
}

// ── Inventory ────────────────────────────────────────────────────

#[test]
fn inventory_merges_descriptors_with_references() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let monitors = MonitorInventory::new(&platform).list_monitors(false);

    assert_eq!(monitors.len(), 1);
    assert_eq!(monitors[0].id, id);
    assert_eq!(monitors[0].name, "LG ULTRAWIDE");
    assert_eq!(monitors[0].manufacturer, "GSM");
    assert!(!monitors[0].internal);
    assert_eq!(monitors[0].handle, Some(1));
}

#[test]
fn descriptor_without_reference_is_kept_without_handle() {
    let mut platform = MockPlatform::default();
    // Instrumentation knows the monitor, but no active path matches it.
    platform.add_record("DISPLAY\\GSM59F2\\ghost_0");

    let monitors = MonitorInventory::new(&platform).list_monitors(false);

    assert_eq!(monitors.len(), 1);
    assert_eq!(monitors[0].name, "Unknown");
    assert_eq!(monitors[0].handle, None);
    assert_eq!(monitors[0].bounds, None);
}

#[test]
fn matched_internal_panel_is_named_internal() {
    let mut platform = MockPlatform::default();
    let id = platform.add_internal("LEN40B0", "unitI", "\\\\.\\DISPLAY1", 9);

    let monitors = MonitorInventory::new(&platform).list_monitors(false);

    assert_eq!(monitors[0].id, id);
    assert!(monitors[0].internal);
    assert_eq!(monitors[0].name, "Internal");
}

#[test]
fn both_internal_enumerants_classify_as_internal() {
    let mut platform = MockPlatform::default();
    let id = platform.add_internal("LEN40B0", "unitI", "\\\\.\\DISPLAY1", 9);
    platform.output_technology.insert(id.clone(), 0x8000_0000);

    let monitors = MonitorInventory::new(&platform).list_monitors(false);
    assert!(monitors[0].internal);
}

#[test]
fn classification_failure_defaults_to_external() {
    let mut platform = MockPlatform::default();
    let id = platform.add_internal("LEN40B0", "unitI", "\\\\.\\DISPLAY1", 9);
    platform.classification_errors.insert(id.clone());

    let monitors = MonitorInventory::new(&platform).list_monitors(false);

    // Fail-open: direct control stays attemptable for an external monitor.
    assert!(!monitors[0].internal);
}

#[test]
fn exclude_internal_filters_internal_panels() {
    let mut platform = MockPlatform::default();
    platform.add_internal("LEN40B0", "unitI", "\\\\.\\DISPLAY1", 9);
    let external = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY2", 1);

    let monitors = MonitorInventory::new(&platform).list_monitors(true);

    assert_eq!(monitors.len(), 1);
    assert_eq!(monitors[0].id, external);
}

#[test]
fn descriptor_query_failure_yields_empty_inventory() {
    let mut platform = MockPlatform::default();
    platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);
    platform.fail_monitor_ids = true;

    assert!(MonitorInventory::new(&platform).list_monitors(false).is_empty());
}

// ── Mechanism selection and fallback ─────────────────────────────

#[test]
fn internal_panel_reads_and_writes_via_management() {
    let mut platform = MockPlatform::default();
    let id = platform.add_internal("LEN40B0", "unitI", "\\\\.\\DISPLAY1", 9);

    let controller = BrightnessController::new(&platform);

    assert_eq!(controller.apply(&id, 70), ControlPath::ViaManagementQuery);
    assert_eq!(platform.management_levels.borrow().get(&id), Some(&70));

    let outcome = controller.read(&id);
    assert_eq!(outcome.path, ControlPath::ViaManagementQuery);
    assert_eq!(outcome.level, Some(70));
    // The direct protocol was never touched.
    assert_eq!(platform.write_attempts(9), 0);
    assert_eq!(platform.read_attempts(9), 0);
}

#[test]
fn external_monitor_uses_direct_control() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let controller = BrightnessController::new(&platform);

    assert_eq!(controller.apply(&id, 35), ControlPath::ViaDirectControl);
    let outcome = controller.read(&id);
    assert_eq!(outcome.path, ControlPath::ViaDirectControl);
    assert_eq!(outcome.level, Some(35));
}

#[test]
fn management_write_failure_falls_back_to_direct_control() {
    let mut platform = MockPlatform::default();
    let id = platform.add_internal("LEN40B0", "unitI", "\\\\.\\DISPLAY1", 9);
    platform.management_write_errors.insert(id.clone());

    let path = BrightnessController::new(&platform).apply(&id, 25);

    assert_eq!(path, ControlPath::ViaDirectControl);
    assert_eq!(platform.ddc_level(9), Some(25));
}

#[test]
fn unknown_identifier_fails_both_mechanisms() {
    let mut platform = MockPlatform::default();
    platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let controller = BrightnessController::new(&platform);
    assert_eq!(controller.apply("DISPLAY\\NOPE\\none_0", 50), ControlPath::Failed);
    assert_eq!(controller.read("DISPLAY\\NOPE\\none_0").level, None);
}

// ── Retry bound ──────────────────────────────────────────────────

#[test]
fn write_succeeds_when_final_attempt_succeeds() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);
    platform
        .ddc_write_failures
        .borrow_mut()
        .insert(1, DDC_RETRY_ATTEMPTS - 1);

    let service = MonitorService::new(platform);
    let result = service.set_brightness(&id, 40);

    assert!(result.success);
    assert_eq!(service.platform().write_attempts(1), DDC_RETRY_ATTEMPTS);
    assert_eq!(service.platform().ddc_level(1), Some(40));
}

#[test]
fn write_stops_at_the_retry_bound() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);
    platform.ddc_write_failures.borrow_mut().insert(1, u32::MAX);

    let service = MonitorService::new(platform);
    let result = service.set_brightness(&id, 40);

    assert!(!result.success);
    // Exactly the bound, never an extra attempt.
    assert_eq!(service.platform().write_attempts(1), DDC_RETRY_ATTEMPTS);
    assert_eq!(service.platform().ddc_level(1), Some(50));
}

#[test]
fn read_retries_transient_failures() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);
    platform
        .ddc_read_failures
        .borrow_mut()
        .insert(1, DDC_RETRY_ATTEMPTS - 1);

    let service = MonitorService::new(platform);
    let result = service.get_brightness(&id);

    assert!(result.success);
    assert_eq!(result.brightness, Some(50));
    assert_eq!(service.platform().read_attempts(1), DDC_RETRY_ATTEMPTS);
}

// ── Service semantics ────────────────────────────────────────────

#[test]
fn set_then_get_round_trips() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let service = MonitorService::new(platform);
    assert!(service.set_brightness(&id, 42).success);
    assert_eq!(service.get_brightness(&id).brightness, Some(42));
}

#[test]
fn levels_clamp_to_range_before_transmission() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let service = MonitorService::new(platform);

    assert!(service.set_brightness(&id, -5).success);
    assert_eq!(service.platform().ddc_level(1), Some(0));

    assert!(service.set_brightness(&id, 150).success);
    assert_eq!(service.platform().ddc_level(1), Some(100));
}

#[test]
fn empty_identifier_targets_first_monitor() {
    let mut platform = MockPlatform::default();
    platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);
    platform.add_external("DEL4066", "unitB", "DELL U2412M", "\\\\.\\DISPLAY2", 2);

    let service = MonitorService::new(platform);
    assert!(service.set_brightness("", 33).success);
    assert_eq!(service.platform().ddc_level(1), Some(33));
    assert_eq!(service.platform().ddc_level(2), Some(50));

    assert_eq!(service.get_brightness("").brightness, Some(33));
}

#[test]
fn get_with_no_monitors_attached_fails() {
    let service = MonitorService::new(MockPlatform::default());
    let result = service.get_brightness("");
    assert!(!result.success);
    assert_eq!(result.brightness, None);
}

#[test]
fn set_with_no_monitors_reports_message() {
    let service = MonitorService::new(MockPlatform::default());
    let result = service.set_brightness("", 50);
    assert!(!result.success);
    assert_eq!(result.message.as_deref(), Some("No monitors available"));
}

#[test]
fn set_for_unknown_monitor_reports_message() {
    let mut platform = MockPlatform::default();
    platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let service = MonitorService::new(platform);
    let result = service.set_brightness("DISPLAY\\NOPE\\none_0", 50);
    assert!(!result.success);
    assert_eq!(result.message.as_deref(), Some("Monitor not found"));
}

// ── Batch vs broadcast ───────────────────────────────────────────
//
// The two multi-monitor operations deliberately disagree: a batch is
// all-or-nothing, while the GLOBAL broadcast is best-effort and reports
// success regardless of individual failures.

#[test]
fn batch_fails_when_any_target_fails() {
    let mut platform = MockPlatform::default();
    let id = platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let service = MonitorService::new(platform);
    let result = service.set_brightness_targets(&[
        BrightnessTarget {
            id: id.clone(),
            level: 50,
        },
        BrightnessTarget {
            id: "DISPLAY\\NOPE\\none_0".to_string(),
            level: 50,
        },
    ]);

    // The unknown target poisons the aggregate, but the known one was
    // still applied.
    assert!(!result.success);
    assert_eq!(service.platform().ddc_level(1), Some(50));
}

#[test]
fn empty_batch_is_a_failure() {
    let mut platform = MockPlatform::default();
    platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);

    let service = MonitorService::new(platform);
    assert!(!service.set_brightness_targets(&[]).success);
}

#[test]
fn global_broadcast_is_best_effort() {
    let mut platform = MockPlatform::default();
    platform.add_external("GSM59F2", "unitA", "LG ULTRAWIDE", "\\\\.\\DISPLAY1", 1);
    platform.add_external("DEL4066", "unitB", "DELL U2412M", "\\\\.\\DISPLAY2", 2);
    // The second monitor never acknowledges a write.
    platform.ddc_write_failures.borrow_mut().insert(2, u32::MAX);

    let service = MonitorService::new(platform);
    let result = service.set_brightness(ALL_MONITORS, 30);

    // Success even though one monitor silently failed.
    assert!(result.success);
    assert_eq!(service.platform().ddc_level(1), Some(30));
    assert_eq!(service.platform().ddc_level(2), Some(50));
}
