//! Configuration manager with live reload support.
//!
//! This service watches the configuration file for changes and coordinates
//! updates when the config changes.
//!
//! ## Architecture
//!
//! - A file watcher thread monitors `config.toml` for modifications.
//! - On change, the new config is parsed and validated.
//! - If valid, changes are dispatched to the GTK main thread via glib::idle_add_once.
//! - The main thread applies changes by notifying registered listeners
//!   (the indicator window and the battery service's poll timer).

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use gtk4::glib;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer, notify::RecursiveMode};
use tracing::{debug, error, info, warn};

use batring_core::{Config, GaugeConfig, IndicatorConfig};

use super::callbacks::Callbacks;

/// Debounce interval (in ms) for file change events. Editors often trigger
/// multiple events for a single save; this batches them into one reload.
const FILE_CHANGE_DEBOUNCE_MS: u64 = 300;

/// Messages sent from the file watcher thread to the GTK main thread.
#[derive(Debug)]
pub enum ConfigMessage {
    /// A new valid config was loaded.
    Reloaded(Box<Config>),
    /// Config file changed but failed to load/validate.
    Error(String),
}

/// Send a config message to the main thread via glib::idle_add_once.
fn send_config_message(msg: ConfigMessage) {
    glib::idle_add_once(move || {
        ConfigManager::global().handle_config_message(msg);
    });
}

/// Manages configuration state and live reload.
///
/// This is a singleton service that:
/// - Holds the current configuration
/// - Exposes clamped threshold accessors for the visibility policy
/// - Watches the config file for changes and fans updates out to listeners
pub struct ConfigManager {
    /// Current configuration.
    config: RefCell<Config>,
    /// Path to the config file being watched (if any).
    config_path: RefCell<Option<PathBuf>>,
    /// Listeners notified after a successful reload.
    callbacks: Callbacks<Config>,
    /// Shutdown flag for the file watcher thread.
    shutdown_flag: Arc<AtomicBool>,
}

// Thread-local singleton storage
thread_local! {
    static CONFIG_MANAGER_INSTANCE: RefCell<Option<Rc<ConfigManager>>> = const { RefCell::new(None) };
}

impl ConfigManager {
    /// Create a new ConfigManager with the given initial config.
    fn new(config: Config, config_path: Option<PathBuf>) -> Rc<Self> {
        Rc::new(Self {
            config: RefCell::new(config),
            config_path: RefCell::new(config_path),
            callbacks: Callbacks::new(),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the global ConfigManager singleton.
    ///
    /// Panics if `init_global` hasn't been called.
    pub fn global() -> Rc<Self> {
        CONFIG_MANAGER_INSTANCE.with(|cell| {
            cell.borrow()
                .as_ref()
                .expect("ConfigManager not initialized; call init_global first")
                .clone()
        })
    }

    /// Initialize the global ConfigManager singleton.
    ///
    /// Must be called once during application startup, before `global()` is used.
    pub fn init_global(config: Config, config_path: Option<PathBuf>) {
        CONFIG_MANAGER_INSTANCE.with(|cell| {
            let mut opt = cell.borrow_mut();
            if opt.is_some() {
                warn!("ConfigManager already initialized, ignoring init_global call");
                return;
            }
            *opt = Some(ConfigManager::new(config, config_path));
        });
    }

    /// Register a listener invoked on the GTK main loop after each
    /// successful config reload.
    pub fn connect<F>(&self, callback: F)
    where
        F: Fn(&Config) + 'static,
    {
        self.callbacks.register(callback);
    }

    /// Current indicator section (placement, polling, thresholds).
    pub fn indicator(&self) -> IndicatorConfig {
        self.config.borrow().indicator.clone()
    }

    /// Current gauge drawing parameters.
    pub fn gauge(&self) -> GaugeConfig {
        self.config.borrow().gauge.clone()
    }

    /// Charging visibility threshold, clamped to [0, 100].
    pub fn charging_threshold(&self) -> i32 {
        self.config.borrow().indicator.charging_threshold()
    }

    /// Discharging visibility threshold, clamped to [0, 100].
    pub fn discharging_threshold(&self) -> i32 {
        self.config.borrow().indicator.discharging_threshold()
    }

    /// Battery poll interval in seconds.
    pub fn poll_interval_secs(&self) -> u32 {
        self.config.borrow().indicator.poll_interval_secs
    }

    /// Start watching the config file for changes.
    ///
    /// This spawns a background thread that monitors the config file. When changes
    /// are detected, the new config is parsed and sent to the GTK main thread.
    ///
    /// Does nothing if no config file path is set (using defaults).
    pub fn start_watching(self: &Rc<Self>) {
        let config_path = self.config_path.borrow().clone();
        let Some(path) = config_path else {
            info!("No config file to watch (using defaults)");
            return;
        };

        if !path.exists() {
            warn!(
                "Config file does not exist, cannot watch: {}",
                path.display()
            );
            return;
        }

        info!("Starting config file watcher for: {}", path.display());

        let watch_path = path.clone();
        let shutdown_flag = self.shutdown_flag.clone();

        thread::spawn(move || {
            Self::run_file_watcher(watch_path, shutdown_flag);
        });
    }

    /// Run the file watcher loop (called on a background thread).
    fn run_file_watcher(path: PathBuf, shutdown_flag: Arc<AtomicBool>) {
        // Debounce events to avoid multiple reloads for a single save
        let debounce_duration = Duration::from_millis(FILE_CHANGE_DEBOUNCE_MS);

        // Canonicalize the path so we can compare with absolute paths from notify
        let path_for_handler = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to canonicalize config path: {}", e);
                return;
            }
        };

        let mut debouncer =
            match new_debouncer(debounce_duration, move |res: DebounceEventResult| {
                match res {
                    Ok(events) => {
                        let config_changed = events.iter().any(|e| e.path == path_for_handler);
                        if config_changed {
                            debug!("Config file change detected");
                            Self::reload_and_send(&path_for_handler);
                        }
                    }
                    Err(err) => {
                        error!("File watcher error: {}", err);
                    }
                }
            }) {
                Ok(d) => d,
                Err(e) => {
                    error!("Failed to create file watcher: {}", e);
                    return;
                }
            };

        // Watch the config file's parent directory (more reliable than watching
        // the file directly, since editors replace files on save).
        let canonical_path = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to canonicalize config path for watching: {}", e);
                return;
            }
        };
        let watch_dir = canonical_path.parent().unwrap_or(&canonical_path);
        if let Err(e) = debouncer
            .watcher()
            .watch(watch_dir, RecursiveMode::NonRecursive)
        {
            error!("Failed to watch config directory: {}", e);
            return;
        }

        info!("File watcher started, watching: {}", watch_dir.display());

        // Keep the thread alive until shutdown is signaled.
        // Use shorter sleep intervals to allow responsive shutdown.
        while !shutdown_flag.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(500));
        }

        debug!("Config file watcher thread shutting down");
    }

    /// Reload config from file and send result to GTK thread via idle_add_once.
    fn reload_and_send(path: &std::path::Path) {
        match Config::load(path) {
            Ok(new_config) => {
                if let Err(e) = new_config.validate() {
                    let msg = format!("Config validation failed: {}", e);
                    warn!("{}", msg);
                    send_config_message(ConfigMessage::Error(msg));
                    return;
                }

                info!("Config reloaded successfully from: {}", path.display());
                send_config_message(ConfigMessage::Reloaded(Box::new(new_config)));
            }
            Err(e) => {
                let msg = format!("Failed to reload config: {}", e);
                warn!("{}", msg);
                send_config_message(ConfigMessage::Error(msg));
            }
        }
    }

    /// Handle a config message from the file watcher.
    /// Called via glib::idle_add_once from send_config_message.
    pub(crate) fn handle_config_message(&self, msg: ConfigMessage) {
        match msg {
            ConfigMessage::Reloaded(new_config) => {
                self.apply_config(*new_config);
            }
            ConfigMessage::Error(err) => {
                // Just log the error - keep using the old config
                error!("Config reload error: {}", err);
            }
        }
    }

    /// Apply a new configuration and fan it out to listeners.
    fn apply_config(&self, new_config: Config) {
        let old_config = self.config.borrow().clone();

        if old_config == new_config {
            debug!("Config unchanged after reload");
            return;
        }

        info!("Applying new configuration...");

        if thresholds_changed(&old_config.indicator, &new_config.indicator) {
            info!(
                "Visibility thresholds changed: charging {} -> {}, discharging {} -> {}",
                old_config.indicator.charging_threshold(),
                new_config.indicator.charging_threshold(),
                old_config.indicator.discharging_threshold(),
                new_config.indicator.discharging_threshold()
            );
        }

        if indicator_layout_changed(&old_config.indicator, &new_config.indicator) {
            info!(
                "Indicator layout changed: {}px at {} (margin {}px)",
                new_config.indicator.size, new_config.indicator.position, new_config.indicator.margin
            );
        }

        // Store the new config BEFORE notifying, so listeners reading back
        // through the singleton see the new values.
        *self.config.borrow_mut() = new_config.clone();

        self.callbacks.notify(&new_config);

        info!("Configuration applied successfully");
    }

    /// Stop watching the config file.
    pub fn stop_watching(&self) {
        // Signal the watcher thread to shut down
        self.shutdown_flag.store(true, Ordering::Relaxed);
        debug!("Config watcher stopped");
    }
}

/// Check if the clamped visibility thresholds changed.
pub(crate) fn thresholds_changed(old: &IndicatorConfig, new: &IndicatorConfig) -> bool {
    old.charging_threshold() != new.charging_threshold()
        || old.discharging_threshold() != new.discharging_threshold()
}

/// Check if the indicator window needs re-anchoring or resizing.
pub(crate) fn indicator_layout_changed(old: &IndicatorConfig, new: &IndicatorConfig) -> bool {
    old.size != new.size || old.position != new.position || old.margin != new.margin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_changed() {
        let old = IndicatorConfig::default();
        let mut new = IndicatorConfig::default();

        assert!(!thresholds_changed(&old, &new));

        new.charging_threshold = 60;
        assert!(thresholds_changed(&old, &new));
    }

    #[test]
    fn test_thresholds_changed_ignores_equivalent_clamped_values() {
        let mut old = IndicatorConfig::default();
        let mut new = IndicatorConfig::default();

        // 150 and 400 both clamp to 100: not a visible change.
        old.charging_threshold = 150;
        new.charging_threshold = 400;
        assert!(!thresholds_changed(&old, &new));
    }

    #[test]
    fn test_indicator_layout_changed() {
        let old = IndicatorConfig::default();
        let mut new = IndicatorConfig::default();

        assert!(!indicator_layout_changed(&old, &new));

        new.position = "bottom-left".to_string();
        assert!(indicator_layout_changed(&old, &new));

        let mut new = IndicatorConfig::default();
        new.size = 48;
        assert!(indicator_layout_changed(&old, &new));
    }
}
