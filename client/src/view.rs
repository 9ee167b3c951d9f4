use std::cell::Cell;

/// Zoom bounds for the step and wheel controls. Manual entry is only sanity
/// checked, so it may land below `MIN_ZOOM`.
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 10.0;

pub const STEP_ZOOM_IN: f64 = 1.25;
pub const STEP_ZOOM_OUT: f64 = 0.8;
pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Manual zoom entry accepts percentages in (0, 1000].
pub const MAX_MANUAL_ZOOM_PERCENT: f64 = 1000.0;

/// Pointer travel below this distinguishes a click from a pan.
pub const CLICK_DRAG_THRESHOLD_PX: f64 = 5.0;

/// Apply a step-button or wheel factor to the current zoom, clamped.
pub fn step_zoom(zoom: f64, factor: f64) -> f64 {
    (zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Zoom factor after a wheel gesture. Scrolling up zooms in.
pub fn wheel_zoom(zoom: f64, delta_y: f64) -> f64 {
    let factor = if delta_y < 0.0 {
        WHEEL_ZOOM_IN
    } else {
        WHEEL_ZOOM_OUT
    };
    step_zoom(zoom, factor)
}

/// Parse a manual zoom entry like `"250%"` or `"250"`. Returns the zoom
/// factor, or `None` when the text is not a percentage in (0, 1000].
pub fn parse_manual_zoom(text: &str) -> Option<f64> {
    let cleaned = text.replace('%', "");
    let percent: f64 = cleaned.trim().parse().ok()?;
    if percent.is_finite() && percent > 0.0 && percent <= MAX_MANUAL_ZOOM_PERCENT {
        Some(percent / 100.0)
    } else {
        None
    }
}

/// Zoom factor as the percentage string shown in the toolbar box.
pub fn format_zoom_percent(zoom: f64) -> String {
    format!("{}%", (zoom * 100.0).round() as i64)
}

/// Reentrancy guard for the document render pipeline. A render that arrives
/// while another is in flight is dropped, not queued; the canvases would tear
/// if two resize-and-paint passes interleaved.
#[derive(Debug, Default)]
pub struct RenderGate {
    busy: Cell<bool>,
}

impl RenderGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate. Returns false while a render is already in flight.
    pub fn try_acquire(&self) -> bool {
        if self.busy.get() {
            return false;
        }
        self.busy.set(true);
        true
    }

    /// Release after the render resolves, success or failure. Failing to
    /// release would lock the viewer out of all further renders.
    pub fn release(&self) {
        self.busy.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_zoom_clamps_to_control_bounds() {
        assert!((step_zoom(4.0, STEP_ZOOM_IN) - 5.0).abs() < 1e-9);
        assert!((step_zoom(9.0, STEP_ZOOM_IN) - MAX_ZOOM).abs() < 1e-9);
        assert!((step_zoom(0.22, STEP_ZOOM_OUT) - MIN_ZOOM).abs() < 1e-9);
    }

    #[test]
    fn wheel_zoom_direction_follows_scroll_sign() {
        assert!((wheel_zoom(4.0, -53.0) - 4.4).abs() < 1e-9);
        assert!((wheel_zoom(4.0, 53.0) - 3.6).abs() < 1e-9);
        assert!((wheel_zoom(9.8, -1.0) - MAX_ZOOM).abs() < 1e-9);
        assert!((wheel_zoom(0.21, 1.0) - MIN_ZOOM).abs() < 1e-9);
    }

    #[test]
    fn manual_zoom_accepts_percent_text() {
        assert_eq!(parse_manual_zoom("250%"), Some(2.5));
        assert_eq!(parse_manual_zoom(" 250 "), Some(2.5));
        assert_eq!(parse_manual_zoom("1000"), Some(10.0));
        // Below the wheel/step floor but inside the manual sanity range.
        assert_eq!(parse_manual_zoom("5"), Some(0.05));
    }

    #[test]
    fn manual_zoom_rejects_out_of_range_or_junk() {
        assert_eq!(parse_manual_zoom("0"), None);
        assert_eq!(parse_manual_zoom("-40"), None);
        assert_eq!(parse_manual_zoom("1001"), None);
        assert_eq!(parse_manual_zoom("NaN"), None);
        assert_eq!(parse_manual_zoom("lots"), None);
        assert_eq!(parse_manual_zoom(""), None);
    }

    #[test]
    fn format_zoom_percent_rounds_to_whole_percent() {
        assert_eq!(format_zoom_percent(4.0), "400%");
        assert_eq!(format_zoom_percent(0.8999), "90%");
    }

    #[test]
    fn render_gate_drops_requests_while_busy() {
        let gate = RenderGate::new();
        assert!(gate.try_acquire());
        // A rapid second and third request during the busy window are dropped.
        assert!(!gate.try_acquire());
        assert!(!gate.try_acquire());

        gate.release();
        assert!(gate.try_acquire());
    }
}
