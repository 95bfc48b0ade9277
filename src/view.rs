use egui::{vec2, Vec2};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;
const ZOOM_STEP: f32 = 0.1;
const WHEEL_STEP: f32 = 0.05;
/// Margin kept around the canvas by [`ViewState::fit_to`]
const FIT_PADDING: f32 = 40.0;

/// Display-only state: none of it affects layer pixels or history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub zoom: f32,
    /// Offset of the canvas from the centred position, in screen pixels
    pub pan: Vec2,
    pub show_grid: bool,
    pub show_ruler: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            show_grid: false,
            show_ruler: false,
        }
    }
}

impl ViewState {
    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }

    /// Zoom by one wheel notch. Scrolling down (`delta_y > 0`) zooms out.
    pub fn wheel(&mut self, delta_y: f32) -> f32 {
        if delta_y == 0.0 {
            return self.zoom;
        }
        let step = if delta_y > 0.0 { -WHEEL_STEP } else { WHEEL_STEP };
        self.set_zoom(self.zoom + step)
    }

    /// Set the zoom factor, clamped to the supported range.
    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        self.zoom
    }

    /// Back to 100 % with no pan.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Drop the pan offset, keeping the zoom.
    pub fn center(&mut self) {
        self.pan = Vec2::ZERO;
    }

    /// Largest zoom (up to 100 %) at which the canvas fits inside `container`.
    pub fn fit_to(&mut self, container: Vec2, canvas_width: u32, canvas_height: u32) -> f32 {
        let available = container - vec2(FIT_PADDING, FIT_PADDING);
        let scale_x = available.x / canvas_width.max(1) as f32;
        let scale_y = available.y / canvas_height.max(1) as f32;
        self.pan = Vec2::ZERO;
        self.set_zoom(scale_x.min(scale_y).min(1.0))
    }

    /// Zoom as a rounded percentage, e.g. `110`.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = ViewState::default();
        for _ in 0..60 {
            view.zoom_in();
        }
        assert_eq!(view.zoom, MAX_ZOOM);
        for _ in 0..60 {
            view.zoom_out();
        }
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_wheel_steps() {
        let mut view = ViewState::default();
        view.wheel(-3.0);
        assert_eq!(view.zoom_percent(), 105);
        view.wheel(120.0);
        view.wheel(120.0);
        assert_eq!(view.zoom_percent(), 95);
    }

    #[test]
    fn test_center_keeps_zoom() {
        let mut view = ViewState::default();
        view.zoom_in();
        view.pan_by(vec2(30.0, -12.0));
        view.center();
        assert_eq!(view.pan, Vec2::ZERO);
        assert_eq!(view.zoom_percent(), 110);
        view.reset();
        assert_eq!(view.zoom, 1.0);
    }

    #[test]
    fn test_fit_to_container() {
        let mut view = ViewState::default();
        let zoom = view.fit_to(vec2(1000.0, 600.0), 1920, 1080);
        assert!((zoom - 0.5).abs() < 1e-6);
        // Small canvases are never magnified.
        assert_eq!(view.fit_to(vec2(1000.0, 600.0), 100, 100), 1.0);
    }
}
