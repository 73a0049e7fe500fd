//! Indicator window: the layer-shell surface hosting the gauge.
//!
//! This is the integration context that owns every external handle - the
//! window, the drawing area, and the service subscriptions. It is created
//! on application activate and torn down on shutdown; no state lives in
//! globals beyond the singleton services themselves.
//!
//! The window itself makes no drawing or policy decisions: visibility comes
//! from `batring_core::visibility::should_show`, geometry and color from
//! `batring_core::gauge::GaugePlan`.

use std::cell::Cell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow, DrawingArea};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};
use tracing::debug;

use batring_core::config::IndicatorConfig;
use batring_core::gauge::GLYPH_HEIGHT_RATIO;
use batring_core::{BatteryStatus, GaugePlan, should_show};

use crate::render;
use crate::services::battery::BatteryService;
use crate::services::config_manager::{self, ConfigManager};
use crate::services::glyph::GlyphService;
use crate::styles;

/// The indicator window and its subscriptions.
pub struct IndicatorWindow {
    window: ApplicationWindow,
    area: DrawingArea,
    /// Last known battery snapshot, shared with the draw func.
    status: Rc<Cell<BatteryStatus>>,
}

impl IndicatorWindow {
    /// Create the indicator window and wire it to the battery and config
    /// services. The window stays hidden until the first snapshot passes
    /// the visibility policy.
    pub fn new(app: &Application) -> Rc<Self> {
        let indicator_config = ConfigManager::global().indicator();

        let window = ApplicationWindow::builder()
            .application(app)
            .title("batring")
            .decorated(false)
            .resizable(false)
            .build();

        window.add_css_class(styles::class::INDICATOR);

        // Initialize layer-shell: a small overlay surface in a screen
        // corner. Unlike a bar, the indicator reserves no exclusive zone.
        window.init_layer_shell();
        window.set_layer(Layer::Top);
        window.set_keyboard_mode(KeyboardMode::None);

        let status = Rc::new(Cell::new(BatteryStatus::unknown()));

        let area = DrawingArea::new();
        {
            let status = status.clone();
            area.set_draw_func(move |_, cr, width, height| {
                draw_gauge(cr, status.get(), width, height);
            });
        }
        window.set_child(Some(&area));

        let indicator = Rc::new(Self {
            window,
            area,
            status,
        });

        indicator.apply_layout(&indicator_config);

        // Battery snapshots drive both visibility and redraws. The service
        // replays the current snapshot on connect, so the indicator settles
        // into the right state immediately.
        {
            let indicator = indicator.clone();
            BatteryService::global().connect(move |snapshot| {
                indicator.status.set(*snapshot);
                indicator.refresh();
            });
        }

        // Config reloads may move the window, resize the gauge, or change
        // the thresholds; re-apply layout only when needed.
        {
            let indicator = indicator.clone();
            let last = Cell::new(ConfigManager::global().indicator());
            ConfigManager::global().connect(move |config| {
                let previous = last.replace(config.indicator.clone());
                if config_manager::indicator_layout_changed(&previous, &config.indicator) {
                    indicator.apply_layout(&config.indicator);
                }
                indicator.refresh();
            });
        }

        indicator
    }

    /// Re-anchor and resize the window per the indicator config.
    fn apply_layout(&self, config: &IndicatorConfig) {
        let size = config.size as i32;
        let margin = config.margin as i32;

        self.area.set_content_width(size);
        self.area.set_content_height(size);
        self.window.set_default_size(size, size);

        let top = config.position.starts_with("top");
        let left = config.position.ends_with("left");

        self.window.set_anchor(Edge::Top, top);
        self.window.set_anchor(Edge::Bottom, !top);
        self.window.set_anchor(Edge::Left, left);
        self.window.set_anchor(Edge::Right, !left);

        for edge in [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right] {
            self.window.set_margin(edge, margin);
        }

        debug!(
            "Indicator layout: {}px at {} (margin {}px)",
            size, config.position, margin
        );
    }

    /// Re-evaluate the visibility policy and queue a redraw when shown.
    fn refresh(&self) {
        let status = self.status.get();
        let config_manager = ConfigManager::global();

        let visible = should_show(
            &status,
            config_manager.charging_threshold(),
            config_manager.discharging_threshold(),
        );

        if visible {
            self.window.set_visible(true);
            self.area.queue_draw();
        } else {
            self.window.set_visible(false);
        }
    }
}

/// Draw one frame: plan in core, paint in `render`.
fn draw_gauge(cr: &gtk4::cairo::Context, status: BatteryStatus, width: i32, height: i32) {
    // Out-of-domain percentage suppresses rendering entirely; the policy
    // normally hides the window first, but the draw func guards anyway.
    if !status.is_known() {
        return;
    }

    let gauge_config = ConfigManager::global().gauge();

    let glyph = if status.is_charging {
        let glyph_height =
            (f64::from(height) * gauge_config.font_ratio * GLYPH_HEIGHT_RATIO).round() as i32;
        GlyphService::global().load(&gauge_config.icon_path, glyph_height)
    } else {
        None
    };

    let glyph_aspect = glyph
        .as_ref()
        .map(|pixbuf| f64::from(pixbuf.width()) / f64::from(pixbuf.height()));

    if let Some(plan) = GaugePlan::compute(
        &status,
        f64::from(width),
        f64::from(height),
        glyph_aspect,
        &gauge_config,
    ) {
        render::paint_gauge(cr, &plan, glyph.as_ref());
    }
}
