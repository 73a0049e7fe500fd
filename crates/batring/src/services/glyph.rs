//! GlyphService - loading and caching the charging-bolt glyph.
//!
//! The glyph comes either from a user-configured icon path (anything the
//! pixbuf loaders understand, typically an SVG) or from the bolt icon
//! embedded in the binary. Rasterized pixbufs are cached per source and
//! pixel height; tinting happens at draw time in the renderer, since the
//! tint color changes with every percentage tick.
//!
//! Load failures never propagate: the first failure per source logs one
//! diagnostic and the renderer falls back to a label-only gauge.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use gtk4::gdk_pixbuf::prelude::*;
use gtk4::gdk_pixbuf::{InterpType, Pixbuf, PixbufLoader};
use tracing::{debug, warn};

/// Embedded bolt icon - included at compile time so the indicator works
/// without any external icon files installed.
const EMBEDDED_BOLT_SVG: &[u8] = include_bytes!("../../../../assets/icons/bolt.svg");

/// Cache key label for the embedded icon.
const BUILTIN_SOURCE: &str = "<builtin>";

/// Shared, process-wide glyph loader.
pub struct GlyphService {
    cache: RefCell<HashMap<(String, i32), Pixbuf>>,
    /// Sources that already produced a load-failure diagnostic.
    failed: RefCell<HashSet<String>>,
}

impl GlyphService {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            cache: RefCell::new(HashMap::new()),
            failed: RefCell::new(HashSet::new()),
        })
    }

    /// Get the global GlyphService singleton.
    pub fn global() -> Rc<Self> {
        thread_local! {
            static INSTANCE: Rc<GlyphService> = GlyphService::new();
        }

        INSTANCE.with(|s| s.clone())
    }

    /// Load the charging glyph at the given pixel height.
    ///
    /// `icon_path` is the configured override; an empty string selects the
    /// embedded bolt. Returns `None` on load failure (logged once per
    /// source), in which case the gauge renders label-only.
    pub fn load(&self, icon_path: &str, height: i32) -> Option<Pixbuf> {
        if height <= 0 {
            return None;
        }

        let source = if icon_path.is_empty() {
            BUILTIN_SOURCE.to_string()
        } else {
            icon_path.to_string()
        };

        let key = (source.clone(), height);
        if let Some(pixbuf) = self.cache.borrow().get(&key) {
            return Some(pixbuf.clone());
        }

        let loaded = if icon_path.is_empty() {
            load_embedded_bolt(height)
        } else {
            load_from_path(icon_path, height)
        };

        match loaded {
            Ok(pixbuf) => {
                debug!(
                    "GlyphService: rasterized {} at {}x{}",
                    source,
                    pixbuf.width(),
                    pixbuf.height()
                );
                self.cache.borrow_mut().insert(key, pixbuf.clone());
                Some(pixbuf)
            }
            Err(err) => {
                // One diagnostic per source; later frames degrade silently.
                if self.failed.borrow_mut().insert(source.clone()) {
                    warn!(
                        "GlyphService: failed to load charging glyph from {}: {}; rendering label only",
                        source, err
                    );
                }
                None
            }
        }
    }
}

/// Rasterize a glyph file at the given height, preserving aspect ratio.
fn load_from_path(path: &str, height: i32) -> Result<Pixbuf, gtk4::glib::Error> {
    Pixbuf::from_file_at_scale(path, -1, height, true)
}

/// Rasterize the embedded bolt SVG at the given height.
fn load_embedded_bolt(height: i32) -> Result<Pixbuf, gtk4::glib::Error> {
    let loader = PixbufLoader::new();
    loader.write(EMBEDDED_BOLT_SVG)?;
    loader.close()?;

    let pixbuf = loader.pixbuf().ok_or_else(|| {
        gtk4::glib::Error::new(
            gtk4::gdk_pixbuf::PixbufError::Failed,
            "embedded bolt icon produced no pixbuf",
        )
    })?;

    let width = (pixbuf.width() as f64 * height as f64 / pixbuf.height() as f64).round() as i32;
    pixbuf
        .scale_simple(width.max(1), height, InterpType::Bilinear)
        .ok_or_else(|| {
            gtk4::glib::Error::new(
                gtk4::gdk_pixbuf::PixbufError::InsufficientMemory,
                "failed to scale embedded bolt icon",
            )
        })
}
