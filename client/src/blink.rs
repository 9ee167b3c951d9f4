use std::cell::RefCell;

use gloo_timers::callback::Interval;
use leptos::prelude::*;

/// Saved-cell markers flip visibility on this cadence.
pub const BLINK_PERIOD_MS: u32 = 500;

struct BlinkBinding {
    interval: Interval,
}

thread_local! {
    static BLINK_BINDING: RefCell<Option<BlinkBinding>> = const { RefCell::new(None) };
}

/// Start the marker blink loop if it is not already running. The phase
/// signal starts visible, so annotations present at load time show up
/// before the first flip.
pub fn ensure_running(phase: RwSignal<bool>) {
    BLINK_BINDING.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_some() {
            return;
        }
        let interval = Interval::new(BLINK_PERIOD_MS, move || {
            phase.update(|visible| *visible = !*visible);
        });
        *slot = Some(BlinkBinding { interval });
    });
}

/// Stop the blink loop and leave markers visible.
pub fn stop(phase: RwSignal<bool>) {
    BLINK_BINDING.with(|cell| {
        if let Some(binding) = cell.borrow_mut().take() {
            binding.interval.cancel();
        }
    });
    phase.set(true);
}
