//! BatteryService - shared, event-driven battery state via UPower.
//!
//! - Asynchronously connects to the system DBus and UPower DisplayDevice
//! - Reads cached properties for initial state
//! - Listens for `PropertiesChanged` ("g-properties-changed") updates
//! - Polls on a timer as a fallback for properties UPower is slow to signal
//! - Notifies listeners on the GLib main loop with a canonical snapshot.
//!
//! Both the change-signal producer and the timer producer feed the same
//! `refresh` path, so listeners only ever see deduplicated snapshots.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use gtk4::gio;
use gtk4::glib;
use gtk4::prelude::*;
use tracing::{debug, error, warn};

use batring_core::BatteryStatus;

use super::callbacks::Callbacks;
use super::config_manager::ConfigManager;

/// Path to the kernel's power supply sysfs directory.
const POWER_SUPPLY_PATH: &str = "/sys/class/power_supply";

/// DBus constants for the UPower DisplayDevice.
const UPOWER_NAME: &str = "org.freedesktop.UPower";
const DISPLAY_PATH: &str = "/org/freedesktop/UPower/devices/DisplayDevice";
const DEVICE_IFACE: &str = "org.freedesktop.UPower.Device";

/// UPower state codes of interest.
/// See: https://upower.freedesktop.org/docs/Device.html#Device:state
pub const STATE_CHARGING: u32 = 1;
pub const STATE_FULLY_CHARGED: u32 = 4;

/// Shared, process-wide battery service.
pub struct BatteryService {
    proxy: RefCell<Option<gio::DBusProxy>>,
    status: Cell<BatteryStatus>,
    callbacks: Callbacks<BatteryStatus>,
    poll_source: RefCell<Option<glib::SourceId>>,
}

impl BatteryService {
    fn new() -> Rc<Self> {
        let service = Rc::new(Self {
            proxy: RefCell::new(None),
            status: Cell::new(BatteryStatus::unknown()),
            callbacks: Callbacks::new(),
            poll_source: RefCell::new(None),
        });

        if Self::has_battery_device() {
            Self::init_dbus(&service);
            Self::start_polling(&service, ConfigManager::global().poll_interval_secs());

            // Restart the poll timer when the configured interval changes.
            let weak = Rc::downgrade(&service);
            let last_interval = Cell::new(ConfigManager::global().poll_interval_secs());
            ConfigManager::global().connect(move |config| {
                let Some(service) = weak.upgrade() else {
                    return;
                };
                if config.indicator.poll_interval_secs != last_interval.get() {
                    last_interval.set(config.indicator.poll_interval_secs);
                    Self::start_polling(&service, last_interval.get());
                }
            });
        } else {
            warn!("BatteryService: no battery device found; indicator stays hidden");
        }

        service
    }

    /// Check if any battery device exists under /sys/class/power_supply.
    fn has_battery_device() -> bool {
        let path = Path::new(POWER_SUPPLY_PATH);
        if !path.exists() {
            debug!("BatteryService: {} does not exist", POWER_SUPPLY_PATH);
            return false;
        }

        let entries = match fs::read_dir(path) {
            Ok(it) => it,
            Err(err) => {
                debug!(
                    "BatteryService: failed to read {}: {err}",
                    POWER_SUPPLY_PATH
                );
                return false;
            }
        };

        for entry in entries.flatten() {
            let type_path = entry.path().join("type");
            if fs::read_to_string(&type_path)
                .is_ok_and(|content| content.trim().eq_ignore_ascii_case("battery"))
            {
                return true;
            }
        }

        debug!(
            "BatteryService: no battery type device found in {}",
            POWER_SUPPLY_PATH
        );
        false
    }

    /// Get the global BatteryService singleton.
    pub fn global() -> Rc<Self> {
        thread_local! {
            static INSTANCE: Rc<BatteryService> = BatteryService::new();
        }

        INSTANCE.with(|s| s.clone())
    }

    /// Register a callback to be invoked whenever the battery snapshot
    /// changes. The callback is always executed on the GLib main loop.
    pub fn connect<F>(&self, callback: F)
    where
        F: Fn(&BatteryStatus) + 'static,
    {
        self.callbacks.register(callback);

        // Immediately send the current snapshot so the indicator can decide
        // its visibility without waiting for the next change.
        self.callbacks.notify(&self.status.get());
    }

    /// Return the current battery snapshot.
    pub fn status(&self) -> BatteryStatus {
        self.status.get()
    }

    /// Stop the poll timer. Called on application shutdown.
    pub fn shutdown(&self) {
        if let Some(id) = self.poll_source.borrow_mut().take() {
            id.remove();
            debug!("BatteryService: poll timer stopped");
        }
    }

    fn init_dbus(this: &Rc<Self>) {
        let this_weak = Rc::downgrade(this);

        // Asynchronously create proxy on the system bus.
        gio::DBusProxy::for_bus(
            gio::BusType::System,
            gio::DBusProxyFlags::NONE,
            None::<&gio::DBusInterfaceInfo>,
            UPOWER_NAME,
            DISPLAY_PATH,
            DEVICE_IFACE,
            None::<&gio::Cancellable>,
            move |res| {
                let this = match this_weak.upgrade() {
                    Some(this) => this,
                    None => return,
                };

                let proxy = match res {
                    Ok(p) => p,
                    Err(e) => {
                        error!("Failed to create UPower DBusProxy: {}", e);
                        // Leave the sentinel snapshot; the indicator stays hidden.
                        return;
                    }
                };

                this.proxy.replace(Some(proxy.clone()));

                // Initial snapshot.
                this.refresh();

                // Subscribe to property changes.
                let this_weak = Rc::downgrade(&this);
                proxy.connect_local("g-properties-changed", false, move |_values| {
                    if let Some(this) = this_weak.upgrade() {
                        this.refresh();
                    }
                    None
                });

                // Monitor for the service appearing/disappearing (e.g., UPower restart).
                let this_weak = Rc::downgrade(&this);
                proxy.connect_local("notify::g-name-owner", false, move |values| {
                    let this = this_weak.upgrade()?;
                    let proxy = values[0].get::<gio::DBusProxy>().ok();
                    let has_owner = proxy.and_then(|p| p.name_owner()).is_some();
                    if has_owner {
                        // Service reappeared - refresh state.
                        this.refresh();
                    } else {
                        // Service disappeared - mark unavailable.
                        this.set_unavailable();
                    }
                    None
                });
            },
        );
    }

    fn start_polling(this: &Rc<Self>, interval_secs: u32) {
        if let Some(id) = this.poll_source.borrow_mut().take() {
            id.remove();
        }

        debug!("BatteryService: polling every {}s", interval_secs);

        let weak = Rc::downgrade(this);
        let id = glib::timeout_add_seconds_local(interval_secs, move || match weak.upgrade() {
            Some(service) => {
                service.refresh();
                glib::ControlFlow::Continue
            }
            None => glib::ControlFlow::Break,
        });
        this.poll_source.replace(Some(id));
    }

    fn set_unavailable(&self) {
        let sentinel = BatteryStatus::unknown();
        if self.status.get() == sentinel {
            return; // Already unavailable
        }
        self.status.set(sentinel);
        self.callbacks.notify(&sentinel);
    }

    /// Re-read the cached proxy properties and notify on change.
    ///
    /// This is the single consumer fed by all three producers: the poll
    /// timer, `g-properties-changed`, and the name-owner watch.
    fn refresh(&self) {
        let Some(proxy) = self.proxy.borrow().clone() else {
            // No proxy yet; keep the sentinel snapshot.
            return;
        };

        fn variant_f64(v: Option<glib::Variant>) -> Option<f64> {
            v.and_then(|v| v.get::<f64>())
        }

        fn variant_u32(v: Option<glib::Variant>) -> Option<u32> {
            v.and_then(|v| v.get::<u32>())
        }

        fn variant_bool(v: Option<glib::Variant>) -> Option<bool> {
            v.and_then(|v| v.get::<bool>())
        }

        let percentage = variant_f64(proxy.cached_property("Percentage"));
        let state = variant_u32(proxy.cached_property("State"));
        let present = variant_bool(proxy.cached_property("IsPresent")).unwrap_or(true);

        let new_status = status_from_properties(percentage, state, present);

        if self.status.get() == new_status {
            return;
        }

        debug!(
            "BatteryService: {}% (charging: {})",
            new_status.percentage, new_status.is_charging
        );
        self.status.set(new_status);
        self.callbacks.notify(&new_status);
    }
}

/// Map raw UPower properties to a canonical snapshot.
///
/// A missing or absent battery maps to the negative sentinel percentage.
/// Charging covers both the Charging and FullyCharged states, so the bolt
/// stays visible while plugged in at 100%.
fn status_from_properties(
    percentage: Option<f64>,
    state: Option<u32>,
    present: bool,
) -> BatteryStatus {
    if !present {
        return BatteryStatus::unknown();
    }

    let Some(percentage) = percentage else {
        return BatteryStatus::unknown();
    };
    if percentage.is_nan() {
        return BatteryStatus::unknown();
    }

    BatteryStatus {
        percentage: percentage.clamp(0.0, 100.0).round() as i32,
        is_charging: matches!(state, Some(STATE_CHARGING) | Some(STATE_FULLY_CHARGED)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_basic() {
        let status = status_from_properties(Some(57.4), Some(2), true);
        assert_eq!(status.percentage, 57);
        assert!(!status.is_charging);
        assert!(status.is_known());
    }

    #[test]
    fn test_status_mapping_rounds_and_clamps() {
        assert_eq!(
            status_from_properties(Some(99.5), None, true).percentage,
            100
        );
        assert_eq!(
            status_from_properties(Some(150.0), None, true).percentage,
            100
        );
        assert_eq!(status_from_properties(Some(-3.0), None, true).percentage, 0);
    }

    #[test]
    fn test_status_mapping_charging_states() {
        assert!(status_from_properties(Some(50.0), Some(STATE_CHARGING), true).is_charging);
        assert!(status_from_properties(Some(100.0), Some(STATE_FULLY_CHARGED), true).is_charging);
        // Discharging (2) and unknown states are not charging.
        assert!(!status_from_properties(Some(50.0), Some(2), true).is_charging);
        assert!(!status_from_properties(Some(50.0), None, true).is_charging);
    }

    #[test]
    fn test_status_mapping_sentinel() {
        assert_eq!(
            status_from_properties(None, Some(STATE_CHARGING), true),
            BatteryStatus::unknown()
        );
        assert_eq!(
            status_from_properties(Some(50.0), Some(STATE_CHARGING), false),
            BatteryStatus::unknown()
        );
        assert_eq!(
            status_from_properties(Some(f64::NAN), None, true),
            BatteryStatus::unknown()
        );
    }
}
