//! Camera module for pan/zoom transforms.

use crate::config::EditorConfig;
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Camera manages the view transform of the editor canvas.
///
/// Zoom is kept as an integer percentage so wheel steps land on round
/// values. The offset is the screen position of the world origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Current translation offset (pan) in screen pixels.
    pub offset: Vec2,
    zoom_percent: i32,
    min_zoom_percent: i32,
    max_zoom_percent: i32,
    zoom_step: i32,
    viewport: Size,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Camera {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom_percent: 100,
            min_zoom_percent: config.min_zoom_percent,
            max_zoom_percent: config.max_zoom_percent,
            zoom_step: config.zoom_step,
            viewport: Size::new(800.0, 600.0),
        }
    }

    pub fn zoom_percent(&self) -> i32 {
        self.zoom_percent
    }

    /// Scale factor applied to world coordinates.
    pub fn scale(&self) -> f64 {
        f64::from(self.zoom_percent) / 100.0
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// World to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale())
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.transform().inverse() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom in (`steps > 0`) or out, keeping the viewport center fixed.
    pub fn zoom_steps(&mut self, steps: i32) {
        self.set_zoom_percent(self.zoom_percent + steps * self.zoom_step);
    }

    /// Zoom by one wheel notch in the direction of `delta`.
    pub fn zoom_wheel(&mut self, delta: f64) {
        if delta > 0.0 {
            self.zoom_steps(1);
        } else if delta < 0.0 {
            self.zoom_steps(-1);
        }
    }

    fn set_zoom_percent(&mut self, percent: i32) {
        let percent = percent.clamp(self.min_zoom_percent, self.max_zoom_percent);
        if percent == self.zoom_percent {
            return;
        }
        let anchor = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        let world_anchor = self.screen_to_world(anchor);
        self.zoom_percent = percent;

        // Keep the anchor at the same screen position
        let moved = self.world_to_screen(world_anchor);
        self.offset += anchor - moved;
    }

    /// Fit the content into the viewport and center it.
    ///
    /// The limiting axis is chosen by comparing the aspect ratios of the
    /// viewport and the content.
    pub fn zoom_to_fit(&mut self, bounds: Rect) {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }
        let view_aspect = self.viewport.height / self.viewport.width;
        let content_aspect = bounds.height() / bounds.width();
        let by_width = self.viewport.width * 100.0 / bounds.width();
        let by_height = self.viewport.height * 100.0 / bounds.height();

        let percent = if view_aspect < 1.0 {
            if content_aspect < view_aspect { by_width } else { by_height }
        } else if content_aspect > view_aspect {
            by_height
        } else {
            by_width
        };
        self.zoom_percent = (percent as i32).clamp(self.min_zoom_percent, self.max_zoom_percent);
        self.center_on(bounds.center());
    }

    /// Put a world point in the middle of the viewport.
    pub fn center_on(&mut self, world_point: Point) {
        let scale = self.scale();
        self.offset = Vec2::new(
            self.viewport.width / 2.0 - world_point.x * scale,
            self.viewport.height / 2.0 - world_point.y * scale,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_world_round_trip() {
        let mut camera = Camera::default();
        camera.pan(Vec2::new(40.0, -20.0));
        camera.zoom_steps(3);

        let world = Point::new(123.0, 45.0);
        let back = camera.screen_to_world(camera.world_to_screen(world));
        assert!((back.x - world.x).abs() < 1e-9);
        assert!((back.y - world.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.zoom_steps(50);
        assert_eq!(camera.zoom_percent(), 200);
        camera.zoom_steps(-50);
        assert_eq!(camera.zoom_percent(), 10);
    }

    #[test]
    fn test_wheel_zoom_keeps_center() {
        let mut camera = Camera::default();
        let center = Point::new(400.0, 300.0);
        let before = camera.screen_to_world(center);

        camera.zoom_wheel(120.0);
        assert_eq!(camera.zoom_percent(), 110);
        let after = camera.screen_to_world(center);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);

        camera.zoom_wheel(0.0);
        assert_eq!(camera.zoom_percent(), 110);
    }

    #[test]
    fn test_zoom_to_fit_wide_content() {
        let mut camera = Camera::default();
        camera.zoom_to_fit(Rect::new(0.0, 0.0, 1600.0, 200.0));
        assert_eq!(camera.zoom_percent(), 50);

        let center = camera.world_to_screen(Point::new(800.0, 100.0));
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_to_fit_tall_content() {
        let mut camera = Camera::default();
        camera.zoom_to_fit(Rect::new(0.0, 0.0, 100.0, 400.0));
        assert_eq!(camera.zoom_percent(), 150);
    }
}
