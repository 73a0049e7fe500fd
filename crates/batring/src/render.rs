//! Cairo execution of a gauge draw plan.
//!
//! All geometry and color decisions live in `batring_core::gauge`; this
//! module only turns a [`GaugePlan`] into cairo calls: the annulus wedge,
//! the centered percentage label, and the alpha-mask-tinted charging glyph.

use gtk4::cairo::{self, FontSlant, FontWeight};
use gtk4::gdk::prelude::GdkCairoContextExt;
use gtk4::gdk_pixbuf::Pixbuf;
use tracing::warn;

use batring_core::GaugePlan;

/// Font family for the percentage label.
const LABEL_FONT_FAMILY: &str = "Sans";

/// Paint a gauge plan onto the given context.
///
/// Cairo errors drop the frame with a warning; they never panic or
/// propagate into the GTK draw cycle.
pub fn paint_gauge(cr: &cairo::Context, plan: &GaugePlan, glyph: Option<&Pixbuf>) {
    if let Err(err) = try_paint(cr, plan, glyph) {
        warn!("Gauge paint failed: {}", err);
    }
}

fn try_paint(
    cr: &cairo::Context,
    plan: &GaugePlan,
    glyph: Option<&Pixbuf>,
) -> Result<(), cairo::Error> {
    let ring = plan.ring;
    let color = plan.color;

    cr.set_source_rgb(color.red, color.green, color.blue);

    // Annulus wedge: outer arc clockwise, inner arc back, fill. The
    // remaining ring stays transparent. At 0% there is no arc at all.
    if ring.has_arc() {
        cr.new_path();
        cr.arc(
            ring.center_x,
            ring.center_y,
            ring.outer_radius,
            ring.start_angle,
            ring.end_angle,
        );
        cr.arc_negative(
            ring.center_x,
            ring.center_y,
            ring.inner_radius,
            ring.end_angle,
            ring.start_angle,
        );
        cr.close_path();
        cr.fill()?;
    }

    // Percentage label, centered per the plan.
    cr.select_font_face(LABEL_FONT_FAMILY, FontSlant::Normal, FontWeight::Bold);
    cr.set_font_size(plan.font_size);
    let extents = cr.text_extents(&plan.label)?;

    let text_x = plan.label_center_x - extents.width() / 2.0 - extents.x_bearing();
    let text_y = plan.label_center_y - extents.height() / 2.0 - extents.y_bearing();
    cr.move_to(text_x, text_y);
    cr.show_text(&plan.label)?;

    // Charging glyph, tinted to the gauge color by painting flat color
    // through the glyph's alpha channel.
    if let (Some(metrics), Some(pixbuf)) = (plan.glyph, glyph) {
        let label_left = plan.label_center_x - extents.width() / 2.0;
        let glyph_x = label_left - metrics.advance;
        let glyph_y = plan.label_center_y - f64::from(pixbuf.height()) / 2.0;

        cr.push_group();
        cr.set_source_pixbuf(pixbuf, glyph_x, glyph_y);
        cr.paint()?;
        let mask = cr.pop_group()?;

        cr.set_source_rgb(color.red, color.green, color.blue);
        cr.mask(&mask)?;
    }

    Ok(())
}
