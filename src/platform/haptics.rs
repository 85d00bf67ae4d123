//! Vibration feedback

/// Tap pulse used when a touch hold starts (ms)
pub const HOLD_PULSE: &[u32] = &[12];

/// Vibrate with a pattern of on/off durations in ms. Returns whether the
/// device accepted it.
#[cfg(target_arch = "wasm32")]
pub fn vibrate(pattern: &[u32]) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let array = js_sys::Array::new();
    for &ms in pattern {
        array.push(&wasm_bindgen::JsValue::from(ms));
    }
    window.navigator().vibrate_with_pattern(&array)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn vibrate(_pattern: &[u32]) -> bool {
    false
}
