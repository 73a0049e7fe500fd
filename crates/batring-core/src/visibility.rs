//! Visibility policy: should the indicator be shown at all?

use crate::gauge::BatteryStatus;

/// Decide whether the indicator should be visible.
///
/// Rules, evaluated in order:
///
/// 1. A negative percentage is the "battery unavailable" sentinel and hides
///    the indicator regardless of thresholds.
/// 2. While charging, show when the percentage is below *either* threshold.
///    The OR means the larger of the two thresholds wins while charging, so
///    lowering `charging_threshold` below `discharging_threshold` has no
///    visible effect.
/// 3. While discharging, show when below the discharging threshold.
///
/// Both thresholds must already be clamped to [0, 100] by the caller
/// (`IndicatorConfig` accessors do this); the policy does not re-clamp.
pub fn should_show(
    status: &BatteryStatus,
    charging_threshold: i32,
    discharging_threshold: i32,
) -> bool {
    if status.percentage < 0 {
        return false;
    }

    if status.is_charging {
        status.percentage < charging_threshold || status.percentage < discharging_threshold
    } else {
        status.percentage < discharging_threshold
    }
}
