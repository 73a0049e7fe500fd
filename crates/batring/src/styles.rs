//! CSS for the indicator surface.
//!
//! The indicator is a transparent layer-shell window; the only styling it
//! needs is stripping the default window background so the gauge floats
//! directly over the desktop.

use tracing::{debug, warn};

/// CSS class constants used across the codebase.
pub mod class {
    /// Indicator window class (`.indicator`).
    pub const INDICATOR: &str = "indicator";
}

/// Stylesheet applied at startup. Everything the gauge shows is drawn
/// with cairo, so CSS only has to make the window itself invisible.
const INDICATOR_CSS: &str = "\
window.indicator {
    background: transparent;
}
";

/// Load the indicator stylesheet into the default display.
pub fn load_css() {
    let provider = gtk4::CssProvider::new();
    provider.load_from_string(INDICATOR_CSS);

    // USER priority so the transparent background wins over GTK themes.
    if let Some(display) = gtk4::gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_USER,
        );
        debug!("Indicator CSS loaded");
    } else {
        warn!("No default display available, CSS styling not applied");
    }
}
