//! Pointer and touch mapping

/// Touches only start a hold inside the middle band of the screen
const HOLD_BAND_TOP: f32 = 0.2;
const HOLD_BAND_BOTTOM: f32 = 0.8;

/// Whether a touch at `y` (relative to the element top) may start a hold
pub fn in_hold_band(y: f32, height: f32) -> bool {
    y > height * HOLD_BAND_TOP && y < height * HOLD_BAND_BOTTOM
}

/// Horizontal position mapped to [-1, 1] around the screen centre
pub fn normalized_pointer(x: f32, width: f32) -> f32 {
    if width <= 0.0 {
        return 0.0;
    }
    let half = width / 2.0;
    ((x - half) / half).clamp(-1.0, 1.0)
}

/// Mouse steering target: follows the pointer only while the button is
/// held, otherwise the player recenters
pub fn drag_target(holding: bool, x: f32, width: f32) -> Option<f32> {
    holding.then(|| normalized_pointer(x, width))
}
