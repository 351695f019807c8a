//! Plain 2D value types: sizes, rectangles, quads and lines.

use cgmath::{Deg, Vector2};
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

pub type ISize = Size<i32>;
pub type FSize = Size<f32>;

impl<T> Size<T> {
    pub const fn new(width: T, height: T) -> Size<T> {
        Size { width, height }
    }
}

impl ISize {
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn to_f32(self) -> FSize {
        Size::new(self.width as f32, self.height as f32)
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }
}

/// Axis aligned rectangle, `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect<T> {
    pub left: T,
    pub top: T,
    pub right: T,
    pub bottom: T,
}

pub type IRect = Rect<i32>;
pub type FRect = Rect<f32>;

fn min<T: PartialOrd>(a: T, b: T) -> T {
    if b < a { b } else { a }
}

fn max<T: PartialOrd>(a: T, b: T) -> T {
    if b > a { b } else { a }
}

impl<T> Rect<T>
where
    T: Copy + PartialOrd + Add<Output = T> + Sub<Output = T>,
{
    pub const fn new(left: T, top: T, right: T, bottom: T) -> Rect<T> {
        Rect { left, top, right, bottom }
    }

    pub fn from_pos_size(x: T, y: T, size: Size<T>) -> Rect<T> {
        Rect { left: x, top: y, right: x + size.width, bottom: y + size.height }
    }

    pub fn width(&self) -> T {
        self.right - self.left
    }

    pub fn height(&self) -> T {
        self.bottom - self.top
    }

    pub fn size(&self) -> Size<T> {
        Size::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        !(self.right > self.left && self.bottom > self.top)
    }

    /// The common area of both rects. May be empty (right <= left), but never inverted.
    /// The part of `other` inside `self`. Always lies within `self`, an empty result is
    /// pinned to its nearest edge.
    pub fn intersection(&self, other: &Rect<T>) -> Rect<T> {
        let left = min(max(self.left, other.left), self.right);
        let top = min(max(self.top, other.top), self.bottom);
        Rect {
            left,
            top,
            right: max(left, min(self.right, other.right)),
            bottom: max(top, min(self.bottom, other.bottom)),
        }
    }

    pub fn contains_rect(&self, other: &Rect<T>) -> bool {
        other.left >= self.left && other.top >= self.top
            && other.right <= self.right && other.bottom <= self.bottom
    }

    /// True if both rects share at least one pixel of area.
    pub fn overlaps(&self, other: &Rect<T>) -> bool {
        self.left < other.right && other.left < self.right
            && self.top < other.bottom && other.top < self.bottom
    }
}

impl IRect {
    pub fn to_f32(self) -> FRect {
        Rect::new(self.left as f32, self.top as f32, self.right as f32, self.bottom as f32)
    }
}

/// Four corners, clockwise: top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub p1: Vector2<f32>,
    pub p2: Vector2<f32>,
    pub p3: Vector2<f32>,
    pub p4: Vector2<f32>,
}

impl Quad {
    pub fn new(p1: Vector2<f32>, p2: Vector2<f32>, p3: Vector2<f32>, p4: Vector2<f32>) -> Quad {
        Quad { p1, p2, p3, p4 }
    }

    pub fn from_rect(rect: &FRect) -> Quad {
        Quad {
            p1: Vector2::new(rect.left, rect.top),
            p2: Vector2::new(rect.right, rect.top),
            p3: Vector2::new(rect.right, rect.bottom),
            p4: Vector2::new(rect.left, rect.bottom),
        }
    }

    pub fn center(&self) -> Vector2<f32> {
        (self.p1 + self.p2 + self.p3 + self.p4) / 4.0
    }

    pub fn points(&self) -> [Vector2<f32>; 4] {
        [self.p1, self.p2, self.p3, self.p4]
    }

    /// Rotates every corner around the quad's center, angle in degrees.
    pub fn rotate(&mut self, angle: f32) {
        if angle == 0.0 {
            return;
        }
        let center = self.center();
        let (s, c) = cgmath::Rad::from(Deg(angle)).0.sin_cos();
        let turn = |p: Vector2<f32>| {
            let d = p - center;
            Vector2::new(center.x + d.x * c - d.y * s, center.y + d.x * s + d.y * c)
        };
        self.p1 = turn(self.p1);
        self.p2 = turn(self.p2);
        self.p3 = turn(self.p3);
        self.p4 = turn(self.p4);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub p1: Vector2<f32>,
    pub p2: Vector2<f32>,
}

impl Line {
    pub fn new(p1: Vector2<f32>, p2: Vector2<f32>) -> Line {
        Line { p1, p2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_shrinks_and_never_inverts() {
        let a = IRect::new(0, 0, 100, 100);
        let b = IRect::new(50, -10, 150, 60);
        assert_eq!(a.intersection(&b), IRect::new(50, 0, 100, 60));

        let far = IRect::new(200, 200, 300, 300);
        let none = a.intersection(&far);
        assert!(none.is_empty());
        assert!(none.width() >= 0 && none.height() >= 0);
        assert!(a.contains_rect(&none));

        let before = IRect::new(-50, -50, -10, -10);
        assert!(a.contains_rect(&a.intersection(&before)));
    }

    #[test]
    fn overlap_is_exclusive_on_edges() {
        let a = IRect::new(0, 0, 10, 10);
        assert!(!a.overlaps(&IRect::new(10, 0, 20, 10)));
        assert!(!a.overlaps(&IRect::new(0, 10, 10, 20)));
        assert!(a.overlaps(&IRect::new(9, 9, 20, 20)));
    }

    #[test]
    fn quad_rotation_keeps_center() {
        let mut q = Quad::from_rect(&FRect::new(0.0, 0.0, 20.0, 10.0));
        let center = q.center();
        q.rotate(90.0);
        let after = q.center();
        assert!((center.x - after.x).abs() < 1e-4 && (center.y - after.y).abs() < 1e-4);
        // top-left (0,0) turns around (10,5) by 90 degrees to (15,-5)
        assert!((q.p1.x - 15.0).abs() < 1e-4);
        assert!((q.p1.y + 5.0).abs() < 1e-4);
    }
}
