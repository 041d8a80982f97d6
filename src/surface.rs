//! What the coordinator draws, independent of any GUI toolkit.

/// Overlay text colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Self = Self(255, 0, 0);
    pub const YELLOW: Self = Self(255, 255, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// The bouncing logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoState {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
    pub width: i32,
    pub height: i32,
    pub visible: bool,
}

/// Bounces `pos` off `[0, limit - extent]`, returning the new position and velocity.
const fn bounce(pos: i32, velocity: i32, extent: i32, limit: i32) -> (i32, i32) {
    let pos = pos + velocity;
    let max = if limit - extent > 0 { limit - extent } else { 0 };
    if pos <= 0 || pos + extent >= limit {
        let clamped = if pos < 0 {
            0
        } else if pos > max {
            max
        } else {
            pos
        };
        (clamped, -velocity)
    } else {
        (pos, velocity)
    }
}

impl LogoState {
    #[must_use]
    pub const fn new(width: i32, height: i32, speed: i32) -> Self {
        Self {
            x: 0,
            y: 0,
            dx: speed,
            dy: speed,
            width,
            height,
            visible: true,
        }
    }

    pub fn center_in(&mut self, bounds: Size) {
        self.x = ((bounds.width - self.width) / 2).max(0);
        self.y = ((bounds.height - self.height) / 2).max(0);
    }

    pub fn clamp_into(&mut self, bounds: Size) {
        self.x = self.x.min(bounds.width - self.width).max(0);
        self.y = self.y.min(bounds.height - self.height).max(0);
    }

    /// One animation step: move, reflect off the edges it reached, clamp.
    pub fn step(&mut self, bounds: Size) {
        (self.x, self.dx) = bounce(self.x, self.dx, self.width, bounds.width);
        (self.y, self.dy) = bounce(self.y, self.dy, self.height, bounds.height);
    }
}

/// An overlay as the surface renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub text: String,
    pub color: Rgb,
    pub font_size: f32,
    /// Text wraps at this width, centred on screen.
    pub wrap_width: f32,
}

/// The draw and clear primitives the coordinator drives.
pub trait Surface {
    fn draw_logo(&mut self, logo: &LogoState);
    fn hide_logo(&mut self);
    fn draw_overlay(&mut self, overlay: &OverlayView);
    fn clear_overlay(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Size = Size::new(1920, 1080);

    fn in_bounds(logo: &LogoState, bounds: Size) -> bool {
        logo.x >= 0
            && logo.y >= 0
            && logo.x + logo.width <= bounds.width
            && logo.y + logo.height <= bounds.height
    }

    #[test]
    fn centers_in_screen() {
        let mut logo = LogoState::new(200, 200, 2);
        logo.center_in(SCREEN);
        assert_eq!((logo.x, logo.y), (860, 440));
    }

    #[test]
    fn moves_by_velocity() {
        let mut logo = LogoState::new(200, 200, 2);
        logo.center_in(SCREEN);
        logo.step(SCREEN);
        assert_eq!((logo.x, logo.y), (862, 442));
        assert_eq!((logo.dx, logo.dy), (2, 2));
    }

    #[test]
    fn reflects_and_clamps_at_right_edge() {
        let mut logo = LogoState::new(200, 200, 3);
        logo.x = 1719;
        logo.y = 500;
        logo.step(SCREEN);
        assert_eq!(logo.x, 1720);
        assert_eq!(logo.dx, -3);
        assert_eq!(logo.dy, 3);
        logo.step(SCREEN);
        assert_eq!(logo.x, 1717);
    }

    #[test]
    fn reflects_at_top_left_corner() {
        let mut logo = LogoState::new(200, 200, 2);
        logo.x = 1;
        logo.y = 1;
        logo.dx = -2;
        logo.dy = -2;
        logo.step(SCREEN);
        assert_eq!((logo.x, logo.y), (0, 0));
        assert_eq!((logo.dx, logo.dy), (2, 2));
    }

    #[test]
    fn stays_in_bounds_over_many_steps() {
        let mut logo = LogoState::new(200, 150, 7);
        logo.dy = -5;
        logo.center_in(SCREEN);
        for _ in 0..10_000 {
            logo.step(SCREEN);
            assert!(in_bounds(&logo, SCREEN), "{logo:?}");
        }
    }

    #[test]
    fn clamps_after_shrinking_screen() {
        let mut logo = LogoState::new(200, 200, 2);
        logo.x = 1700;
        logo.y = 800;
        let small = Size::new(800, 600);
        logo.clamp_into(small);
        assert_eq!((logo.x, logo.y), (600, 400));
        assert!(in_bounds(&logo, small));
    }

    #[test]
    fn screen_smaller_than_logo_pins_to_origin() {
        let mut logo = LogoState::new(200, 200, 2);
        let tiny = Size::new(100, 100);
        logo.step(tiny);
        assert_eq!((logo.x, logo.y), (0, 0));
        assert!(Size::new(0, 10).is_empty());
    }
}
