//! batring-core - host-independent logic for the batring battery gauge.
//!
//! This crate holds everything that can be computed and tested without a
//! running display server:
//!
//! - [`config`]: TOML configuration schema, XDG lookup, validation.
//! - [`gauge`]: the gauge renderer math - color gradient, ring geometry,
//!   and the per-frame draw plan.
//! - [`visibility`]: the show/hide policy driven by user thresholds.
//! - [`logging`]: tracing subscriber setup shared with the binary.
//!
//! The GTK integration in the `batring` crate consumes these types and is
//! deliberately kept free of any drawing or policy decisions of its own.

pub mod config;
pub mod error;
pub mod gauge;
pub mod logging;
pub mod visibility;

pub use config::{Config, ConfigLoadResult, GaugeConfig, IndicatorConfig};
pub use error::{Error, Result};
pub use gauge::{BatteryStatus, GaugeColor, GaugePlan, RingGeometry};
pub use visibility::should_show;
