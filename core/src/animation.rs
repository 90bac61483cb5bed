//! Timer-driven easing toward a target, plus the window-move geometry.
//!
//! Everything here is driven from the UI thread: the platform shell owns the
//! timer, calls [`Animator::tick`] on each expiry and applies the returned value.

use std::f64::consts::FRAC_PI_2;

/// Ease-out sine: fast start, slow settle.
pub fn ease_out_sine(progress: f64) -> f64 {
    (progress * FRAC_PI_2).sin()
}

/// Values that can be interpolated between a start and a target.
pub trait Lerp: Copy + PartialEq {
    fn lerp(start: Self, target: Self, t: f64) -> Self;
}

impl Lerp for i32 {
    fn lerp(start: Self, target: Self, t: f64) -> Self {
        start + (f64::from(target - start) * t).round() as i32
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Lerp for Point {
    fn lerp(start: Self, target: Self, t: f64) -> Self {
        Self {
            x: i32::lerp(start.x, target.x, t),
            y: i32::lerp(start.y, target.y, t),
        }
    }
}

/// One in-flight animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation<T> {
    pub start: T,
    pub target: T,
    /// In `[0.0, 1.0]`.
    pub progress: f64,
    /// Progress gained per tick.
    pub step: f64,
}

/// Result of a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<T> {
    pub value: T,
    /// The animation reached its target; the timer can stop.
    pub done: bool,
}

/// Drives at most one animation for a single animatable target.
#[derive(Clone, Debug)]
pub struct Animator<T> {
    state: Option<Animation<T>>,
    tick_ms: u32,
}

impl<T: Lerp> Animator<T> {
    pub fn new(tick_ms: u32) -> Self {
        Self {
            state: None,
            tick_ms: tick_ms.max(1),
        }
    }

    /// Starts animating from `current` to `target`, replacing any animation in flight.
    pub fn animate_to(&mut self, current: T, target: T, duration_ms: u32) {
        let step = if duration_ms == 0 {
            1.0
        } else {
            f64::from(self.tick_ms) / f64::from(duration_ms)
        };
        self.state = Some(Animation {
            start: current,
            target,
            progress: 0.0,
            step,
        });
    }

    /// Advances one tick. Returns `None` when idle.
    pub fn tick(&mut self) -> Option<Frame<T>> {
        let anim = self.state.as_mut()?;
        anim.progress += anim.step;

        if anim.progress >= 1.0 {
            let value = anim.target;
            self.state = None;
            return Some(Frame { value, done: true });
        }

        let value = T::lerp(anim.start, anim.target, ease_out_sine(anim.progress));
        Some(Frame { value, done: false })
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&Animation<T>> {
        self.state.as_ref()
    }

    pub fn progress(&self) -> Option<f64> {
        self.state.as_ref().map(|a| a.progress)
    }

    pub fn target(&self) -> Option<T> {
        self.state.as_ref().map(|a| a.target)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Horizontal,
            Direction::Up | Direction::Down => Axis::Vertical,
        }
    }
}

/// Screen rectangle in pixels, right/bottom exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Work area and step sizes used to compute move targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveGeometry {
    pub work_area: Rect,
    pub edge_margin: i32,
    pub step_x: i32,
    pub step_y: i32,
}

impl MoveGeometry {
    /// A step is the work-area size divided by `divisor`.
    pub fn new(work_area: Rect, edge_margin: i32, divisor: u32) -> Self {
        let divisor = divisor.max(1) as i32;
        Self {
            work_area,
            edge_margin,
            step_x: work_area.width() / divisor,
            step_y: work_area.height() / divisor,
        }
    }

    /// Position one step from `from` in `direction`, kept `edge_margin` inside the work area.
    pub fn target(&self, direction: Direction, from: Point, size: (i32, i32)) -> Point {
        let (width, height) = size;
        let area = &self.work_area;
        let min_x = area.left + self.edge_margin;
        let min_y = area.top + self.edge_margin;
        let max_x = (area.right - width - self.edge_margin).max(min_x);
        let max_y = (area.bottom - height - self.edge_margin).max(min_y);

        let (dx, dy) = match direction {
            Direction::Left => (-self.step_x, 0),
            Direction::Right => (self.step_x, 0),
            Direction::Up => (0, -self.step_y),
            Direction::Down => (0, self.step_y),
        };

        Point {
            x: (from.x + dx).clamp(min_x, max_x),
            y: (from.y + dy).clamp(min_y, max_y),
        }
    }
}

/// Directional window moves on top of a point animator.
#[derive(Clone, Debug)]
pub struct WindowMover {
    animator: Animator<Point>,
    axis: Option<Axis>,
    duration_ms: u32,
}

impl WindowMover {
    pub fn new(tick_ms: u32, duration_ms: u32) -> Self {
        Self {
            animator: Animator::new(tick_ms),
            axis: None,
            duration_ms,
        }
    }

    /// Requests a move. Returns the new target, or `None` when the request is
    /// ignored because a move along the same axis is not yet half done.
    pub fn request(
        &mut self,
        direction: Direction,
        current: Point,
        size: (i32, i32),
        geometry: &MoveGeometry,
    ) -> Option<Point> {
        let axis = direction.axis();
        if let Some(anim) = self.animator.state()
            && self.axis == Some(axis)
            && anim.progress <= 0.5
        {
            return None;
        }

        // Keep the pending motion on the other axis.
        let base = match (self.animator.target(), axis) {
            (Some(pending), Axis::Horizontal) => Point::new(current.x, pending.y),
            (Some(pending), Axis::Vertical) => Point::new(pending.x, current.y),
            (None, _) => current,
        };
        let target = geometry.target(direction, base, size);

        self.animator.animate_to(current, target, self.duration_ms);
        self.axis = Some(axis);
        Some(target)
    }

    pub fn tick(&mut self) -> Option<Frame<Point>> {
        let frame = self.animator.tick();
        if !self.animator.is_active() {
            self.axis = None;
        }
        frame
    }

    pub fn is_active(&self) -> bool {
        self.animator.is_active()
    }

    pub fn animator(&self) -> &Animator<Point> {
        &self.animator
    }
}

/// Smooth scrolling of a vertical offset clamped to `[0, max]`.
#[derive(Clone, Debug)]
pub struct Scroller {
    animator: Animator<i32>,
    duration_ms: u32,
}

impl Scroller {
    pub fn new(tick_ms: u32, duration_ms: u32) -> Self {
        Self {
            animator: Animator::new(tick_ms),
            duration_ms,
        }
    }

    /// Starts scrolling by `delta` from the in-flight target (or `current`).
    pub fn scroll_by(&mut self, current: i32, delta: i32, max: i32) -> i32 {
        let base = self.animator.target().unwrap_or(current);
        let target = (base + delta).clamp(0, max.max(0));
        self.animator.animate_to(current, target, self.duration_ms);
        target
    }

    pub fn tick(&mut self) -> Option<Frame<i32>> {
        self.animator.tick()
    }

    pub fn is_active(&self) -> bool {
        self.animator.is_active()
    }
}
