//! Gauge renderer math.
//!
//! Everything here is a pure function from a battery snapshot and a surface
//! size to a draw plan. The GTK side executes the plan with cairo but makes
//! no geometry or color decisions of its own, which keeps all of the visual
//! logic unit-testable without a display server.

use std::f64::consts::FRAC_PI_2;

use crate::config::GaugeConfig;

/// Arc start angle: top of the circle, in radians (cairo convention,
/// y axis pointing down, so -90 degrees points up).
const START_ANGLE: f64 = -FRAC_PI_2;

/// Charging glyph height relative to the label font size.
pub const GLYPH_HEIGHT_RATIO: f64 = 1.7;

/// Horizontal overlap factor between glyph and label. The glyph advance is
/// its width divided by this, so glyph and text visually adjoin.
const GLYPH_OVERLAP: f64 = 1.05;

/// Battery status snapshot, produced once per poll or change event.
///
/// A percentage outside [0, 100] is the "unavailable" sentinel: the
/// indicator is hidden and nothing is rendered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    /// Charge percentage in [0, 100], or a negative sentinel when the
    /// battery state is unknown.
    pub percentage: i32,
    /// Whether the battery is currently charging (or full on AC).
    pub is_charging: bool,
}

impl BatteryStatus {
    /// Sentinel snapshot for "no battery / state unknown".
    pub fn unknown() -> Self {
        Self {
            percentage: -1,
            is_charging: false,
        }
    }

    /// Whether the percentage is inside the renderable domain.
    pub fn is_known(&self) -> bool {
        (0..=100).contains(&self.percentage)
    }
}

/// An RGB color with channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl GaugeColor {
    /// Map a percentage to the gauge gradient.
    ///
    /// Two-segment linear interpolation: pure red at 0%, pure yellow at
    /// 50%, pure green at 100%. A percentage outside [0, 100] returns
    /// sentinel black; callers must not render with it.
    pub fn for_percentage(percentage: i32) -> Self {
        if !(0..=100).contains(&percentage) {
            return Self {
                red: 0.0,
                green: 0.0,
                blue: 0.0,
            };
        }

        let p = percentage as f64;
        if percentage <= 50 {
            Self {
                red: 1.0,
                green: p / 50.0,
                blue: 0.0,
            }
        } else {
            Self {
                red: 1.0 - (p - 50.0) / 50.0,
                green: 1.0,
                blue: 0.0,
            }
        }
    }
}

/// Filled arc sweep in degrees for a percentage: a full circle is 100%.
///
/// Input is clamped to [0, 100]; within that domain the sweep is strictly
/// monotonic, 0 at 0% and 360 at 100%.
pub fn sweep_degrees(percentage: i32) -> f64 {
    let p = percentage.clamp(0, 100) as f64;
    p / 100.0 * 360.0
}

/// Annulus geometry for one frame, recomputed on every render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGeometry {
    pub center_x: f64,
    pub center_y: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
    /// Arc start angle in radians (top of the circle).
    pub start_angle: f64,
    /// Arc end angle in radians; the arc is drawn clockwise from start.
    pub end_angle: f64,
}

impl RingGeometry {
    /// Compute the ring for a surface of `width` x `height` pixels.
    pub fn compute(width: f64, height: f64, percentage: i32, config: &GaugeConfig) -> Self {
        let outer_radius = width.min(height) / 2.0 - config.padding;
        let inner_radius = outer_radius * config.inner_ratio;
        let sweep = sweep_degrees(percentage).to_radians();

        Self {
            center_x: width / 2.0,
            center_y: height / 2.0,
            outer_radius,
            inner_radius,
            start_angle: START_ANGLE,
            end_angle: START_ANGLE + sweep,
        }
    }

    /// Whether any arc is filled at all (0% draws nothing).
    pub fn has_arc(&self) -> bool {
        self.end_angle > self.start_angle
    }
}

/// Placement for the tinted charging glyph, relative to the label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Rasterized glyph width in pixels.
    pub width: f64,
    /// Rasterized glyph height in pixels (1.7x the label font size).
    pub height: f64,
    /// Horizontal space the glyph occupies next to the label. Slightly
    /// less than the width, so the glyph tucks against the first digit.
    pub advance: f64,
}

/// Deterministic draw plan for one frame.
///
/// The glyph slot is only populated when the battery is charging *and* a
/// glyph source is available; a failed glyph load leaves the label exactly
/// where it would be when discharging.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugePlan {
    pub ring: RingGeometry,
    pub color: GaugeColor,
    /// Label text: the bare percentage number.
    pub label: String,
    /// Label font size in pixels.
    pub font_size: f64,
    /// Horizontal center of the label. Shifted right by half the glyph
    /// advance when a glyph is present, so the glyph+label group stays
    /// centered in the ring. Note the direction: the label moves *right*
    /// and the glyph fills the space opened on its left, rather than the
    /// label moving left away from a fixed glyph.
    pub label_center_x: f64,
    /// Vertical center of the label.
    pub label_center_y: f64,
    pub glyph: Option<GlyphMetrics>,
}

impl GaugePlan {
    /// Build the draw plan for a snapshot on a `width` x `height` surface.
    ///
    /// `glyph_aspect` is the width/height ratio of the charging glyph, or
    /// `None` when no glyph could be loaded.
    ///
    /// Returns `None` for an unknown percentage: rendering is suppressed
    /// entirely rather than drawn with the sentinel color.
    pub fn compute(
        status: &BatteryStatus,
        width: f64,
        height: f64,
        glyph_aspect: Option<f64>,
        config: &GaugeConfig,
    ) -> Option<Self> {
        if !status.is_known() {
            return None;
        }

        let ring = RingGeometry::compute(width, height, status.percentage, config);
        let color = GaugeColor::for_percentage(status.percentage);
        let font_size = height * config.font_ratio;

        let glyph = if status.is_charging {
            glyph_aspect.map(|aspect| {
                let glyph_height = font_size * GLYPH_HEIGHT_RATIO;
                let glyph_width = glyph_height * aspect;
                GlyphMetrics {
                    width: glyph_width,
                    height: glyph_height,
                    advance: glyph_width / GLYPH_OVERLAP,
                }
            })
        } else {
            None
        };

        let label_shift = glyph.map(|g| g.advance / 2.0).unwrap_or(0.0);

        Some(Self {
            ring,
            color,
            label: status.percentage.to_string(),
            font_size,
            label_center_x: ring.center_x + label_shift,
            label_center_y: ring.center_y,
            glyph,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(p: i32) -> (f64, f64, f64) {
        let c = GaugeColor::for_percentage(p);
        (c.red, c.green, c.blue)
    }

    #[test]
    fn color_endpoints() {
        assert_eq!(color(0), (1.0, 0.0, 0.0), "0% is pure red");
        assert_eq!(color(50), (1.0, 1.0, 0.0), "50% is pure yellow");
        assert_eq!(color(100), (0.0, 1.0, 0.0), "100% is pure green");
    }

    #[test]
    fn color_is_continuous() {
        // Adjacent integer percentages never move a channel by more than 1/50.
        let max_step = 1.0 / 50.0 + 1e-9;
        for p in 0..100 {
            let a = GaugeColor::for_percentage(p);
            let b = GaugeColor::for_percentage(p + 1);
            assert!((a.red - b.red).abs() <= max_step, "red jump at {}", p);
            assert!((a.green - b.green).abs() <= max_step, "green jump at {}", p);
            assert!((a.blue - b.blue).abs() <= max_step, "blue jump at {}", p);
        }
    }

    #[test]
    fn color_out_of_domain_is_black() {
        assert_eq!(color(-1), (0.0, 0.0, 0.0));
        assert_eq!(color(101), (0.0, 0.0, 0.0));
    }

    #[test]
    fn sweep_is_strictly_monotonic() {
        assert_eq!(sweep_degrees(0), 0.0);
        assert_eq!(sweep_degrees(100), 360.0);
        for p in 0..100 {
            assert!(
                sweep_degrees(p) < sweep_degrees(p + 1),
                "sweep not increasing at {}",
                p
            );
        }
    }

    #[test]
    fn ring_geometry_radii_and_start() {
        let config = GaugeConfig::default();
        let ring = RingGeometry::compute(28.0, 28.0, 75, &config);

        assert_eq!(ring.outer_radius, 12.0); // 28 / 2 - 2px padding
        assert_eq!(ring.inner_radius, 12.0 * 0.9);
        assert_eq!(ring.start_angle, -FRAC_PI_2);
        assert!(
            (ring.end_angle - ring.start_angle - 270f64.to_radians()).abs() < 1e-9,
            "75% sweeps three quarters of the circle"
        );
    }

    #[test]
    fn ring_empty_at_zero_percent() {
        let config = GaugeConfig::default();
        let ring = RingGeometry::compute(28.0, 28.0, 0, &config);
        assert!(!ring.has_arc());
    }

    #[test]
    fn plan_suppressed_for_unknown_status() {
        let config = GaugeConfig::default();
        let plan = GaugePlan::compute(&BatteryStatus::unknown(), 28.0, 28.0, None, &config);
        assert!(plan.is_none());
    }

    #[test]
    fn plan_label_and_font() {
        let config = GaugeConfig::default();
        let status = BatteryStatus {
            percentage: 42,
            is_charging: false,
        };
        let plan = GaugePlan::compute(&status, 30.0, 30.0, None, &config).unwrap();

        assert_eq!(plan.label, "42");
        assert!((plan.font_size - 30.0 * 0.33).abs() < 1e-9);
        assert_eq!(plan.label_center_x, 15.0);
        assert_eq!(plan.label_center_y, 15.0);
        assert!(plan.glyph.is_none());
    }

    #[test]
    fn plan_glyph_load_failure_keeps_label_centered() {
        // Charging but no glyph available: the label must sit exactly where
        // it does when not charging.
        let config = GaugeConfig::default();
        let discharging = BatteryStatus {
            percentage: 42,
            is_charging: false,
        };
        let charging = BatteryStatus {
            percentage: 42,
            is_charging: true,
        };

        let base = GaugePlan::compute(&discharging, 28.0, 28.0, None, &config).unwrap();
        let degraded = GaugePlan::compute(&charging, 28.0, 28.0, None, &config).unwrap();

        assert_eq!(base.label_center_x, degraded.label_center_x);
        assert_eq!(base.label_center_y, degraded.label_center_y);
        assert!(degraded.glyph.is_none());
    }

    #[test]
    fn plan_glyph_shifts_label() {
        let config = GaugeConfig::default();
        let status = BatteryStatus {
            percentage: 42,
            is_charging: true,
        };
        let plan = GaugePlan::compute(&status, 28.0, 28.0, Some(0.6), &config).unwrap();

        let glyph = plan.glyph.expect("glyph metrics expected while charging");
        assert!((glyph.height - plan.font_size * 1.7).abs() < 1e-9);
        assert!((glyph.width - glyph.height * 0.6).abs() < 1e-9);
        assert!(glyph.advance < glyph.width, "glyph overlaps the label");
        assert!(
            (plan.label_center_x - (14.0 + glyph.advance / 2.0)).abs() < 1e-9,
            "label shifts by half the glyph advance"
        );
    }

    #[test]
    fn plan_glyph_only_while_charging() {
        let config = GaugeConfig::default();
        let status = BatteryStatus {
            percentage: 42,
            is_charging: false,
        };
        let plan = GaugePlan::compute(&status, 28.0, 28.0, Some(0.6), &config).unwrap();
        assert!(plan.glyph.is_none());
    }
}
