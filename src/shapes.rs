//! Vertex arrays for the shape primitives, in local coordinates.
//!
//! `GraphicsContext` renders them right away, `DrawingContext` queues them.

use crate::color::Color;
use crate::geom::{FRect, FSize, Quad};
use crate::scenegraph::VertexArrayDrawable;

use cgmath::Vector2;
use std::f32::consts::{FRAC_PI_2, PI};

fn alpha_blended(mode: gl::types::GLenum) -> VertexArrayDrawable {
    let mut va = VertexArrayDrawable::new();
    va.set_blend_func(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
    va.set_mode(mode);
    va
}

fn points(mode: gl::types::GLenum, color: Color<f32>, points: &[Vector2<f32>]) -> VertexArrayDrawable {
    let mut va = alpha_blended(mode);
    for p in points {
        va.color(color);
        va.vertex_at(*p);
    }
    va
}

pub fn line(p1: Vector2<f32>, p2: Vector2<f32>, color: Color<f32>) -> VertexArrayDrawable {
    points(gl::LINES, color, &[p1, p2])
}

pub fn fill_quad(quad: &Quad, color: Color<f32>) -> VertexArrayDrawable {
    points(gl::TRIANGLE_FAN, color, &quad.points())
}

pub fn draw_quad(quad: &Quad, color: Color<f32>) -> VertexArrayDrawable {
    points(gl::LINE_LOOP, color, &quad.points())
}

pub fn fill_rect(rect: &FRect, color: Color<f32>) -> VertexArrayDrawable {
    fill_quad(&Quad::from_rect(rect), color)
}

pub fn draw_rect(rect: &FRect, color: Color<f32>) -> VertexArrayDrawable {
    draw_quad(&Quad::from_rect(rect), color)
}

/// Radius clamped so opposite corners never overlap, and the inner rect.
fn rounded_rect_frame(rect: &FRect, radius: f32) -> (f32, FRect) {
    let radius = radius.max(0.0).min((rect.width() / 2.0).min(rect.height() / 2.0));
    let inner = FRect::new(rect.left + radius, rect.top + radius, rect.right - radius, rect.bottom - radius);
    (radius, inner)
}

/// Quarter arc offsets, `steps + 1` of them, going from (0, r) to (r, 0).
fn quarter_arc(steps: u32, radius: f32) -> impl Iterator<Item = (f32, f32)> {
    let steps = steps.max(1);
    (0..=steps).map(move |i| {
        let a = i as f32 * FRAC_PI_2 / steps as f32;
        (a.sin() * radius, a.cos() * radius)
    })
}

/// A triangle strip: the top cap then the bottom cap, each a pair of mirrored quarter arcs.
pub fn fill_rounded_rect(rect: &FRect, radius: f32, color: Color<f32>, steps: u32) -> VertexArrayDrawable {
    let (radius, irect) = rounded_rect_frame(rect, radius);
    let mut va = alpha_blended(gl::TRIANGLE_STRIP);
    for (x, y) in quarter_arc(steps, radius) {
        va.color(color);
        va.vertex(irect.right + x, irect.top - y);
        va.color(color);
        va.vertex(irect.left - x, irect.top - y);
    }
    for (y, x) in quarter_arc(steps, radius) {
        va.color(color);
        va.vertex(irect.right + x, irect.bottom + y);
        va.color(color);
        va.vertex(irect.left - x, irect.bottom + y);
    }
    va
}

/// A closed line strip: four quarter arcs joined by the straight edges.
pub fn draw_rounded_rect(rect: &FRect, radius: f32, color: Color<f32>, steps: u32) -> VertexArrayDrawable {
    let (radius, irect) = rounded_rect_frame(rect, radius);
    let mut va = alpha_blended(gl::LINE_STRIP);
    for (x, y) in quarter_arc(steps, radius) {
        va.color(color);
        va.vertex(irect.left - x, irect.top - y);
    }
    for (y, x) in quarter_arc(steps, radius) {
        va.color(color);
        va.vertex(irect.left - x, irect.bottom + y);
    }
    for (x, y) in quarter_arc(steps, radius) {
        va.color(color);
        va.vertex(irect.right + x, irect.bottom + y);
    }
    for (y, x) in quarter_arc(steps, radius) {
        va.color(color);
        va.vertex(irect.right + x, irect.top - y);
    }
    // back to the start
    va.color(color);
    va.vertex(irect.left, irect.top - radius);
    va
}

fn circle_rim(va: &mut VertexArrayDrawable, pos: Vector2<f32>, radius: f32, color: Color<f32>, segments: u32) {
    let segments = segments.max(4);
    let quarter = segments as f32 / 4.0;
    va.color(color);
    va.vertex(pos.x + radius, pos.y);
    for i in 1..segments {
        let a = i as f32 * FRAC_PI_2 / quarter;
        va.color(color);
        va.vertex(pos.x + a.cos() * radius, pos.y + a.sin() * radius);
    }
    va.color(color);
    va.vertex(pos.x + radius, pos.y);
}

pub fn draw_circle(pos: Vector2<f32>, radius: f32, color: Color<f32>, segments: u32) -> VertexArrayDrawable {
    let mut va = alpha_blended(gl::LINE_STRIP);
    circle_rim(&mut va, pos, radius, color, segments);
    va
}

pub fn fill_circle(pos: Vector2<f32>, radius: f32, color: Color<f32>, segments: u32) -> VertexArrayDrawable {
    let mut va = alpha_blended(gl::TRIANGLE_FAN);
    va.color(color);
    va.vertex_at(pos);
    circle_rim(&mut va, pos, radius, color, segments);
    va
}

/// Angles of an arc rim, in radians, `end` included. Degrees in, swapped if reversed.
fn arc_angles(start: f32, end: f32, segments: u32) -> Vec<f32> {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    let (start, end) = (start.to_radians(), end.to_radians());
    let step = 2.0 * PI / segments.max(1) as f32;
    let mut angles: Vec<f32> = (0..)
        .map(|i| start + i as f32 * step)
        .take_while(|a| *a < end)
        .collect();
    angles.push(end);
    angles
}

/// Outline of a pie slice, angles in degrees. A sweep of 360 or more is a full circle.
pub fn draw_arc(pos: Vector2<f32>, radius: f32, start: f32, end: f32, color: Color<f32>, segments: u32) -> VertexArrayDrawable {
    if (end - start).abs() >= 360.0 {
        return draw_circle(pos, radius, color, segments);
    }
    let mut va = alpha_blended(gl::LINE_STRIP);
    va.color(color);
    va.vertex_at(pos);
    for a in arc_angles(start, end, segments) {
        va.color(color);
        va.vertex(pos.x + a.cos() * radius, pos.y + a.sin() * radius);
    }
    va.color(color);
    va.vertex_at(pos);
    va
}

pub fn fill_arc(pos: Vector2<f32>, radius: f32, start: f32, end: f32, color: Color<f32>, segments: u32) -> VertexArrayDrawable {
    if (end - start).abs() >= 360.0 {
        return fill_circle(pos, radius, color, segments);
    }
    let mut va = alpha_blended(gl::TRIANGLE_FAN);
    va.color(color);
    va.vertex_at(pos);
    for a in arc_angles(start, end, segments) {
        va.color(color);
        va.vertex(pos.x + a.cos() * radius, pos.y + a.sin() * radius);
    }
    va
}

/// Lines every `cell` pixels over an `area`, shifted by `offset` modulo the cell size.
pub fn grid(offset: Vector2<f32>, cell: FSize, area: FSize, color: Color<f32>) -> VertexArrayDrawable {
    let mut va = alpha_blended(gl::LINES);
    if cell.width <= 0.0 || cell.height <= 0.0 {
        return va;
    }
    let mut x = offset.x % cell.width;
    while x < area.width {
        va.color(color);
        va.vertex(x, 0.0);
        va.color(color);
        va.vertex(x, area.height);
        x += cell.width;
    }
    let mut y = offset.y % cell.height;
    while y < area.height {
        va.color(color);
        va.vertex(0.0, y);
        va.color(color);
        va.vertex(area.width, y);
        y += cell.height;
    }
    va
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white() -> Color<f32> {
        Color::white()
    }

    #[test]
    fn oversized_radius_is_clamped() {
        let rect = FRect::new(10.0, 20.0, 110.0, 60.0);
        let clamped = fill_rounded_rect(&rect, 20.0, white(), 8);
        for radius in &[20.0001, 25.0, 1000.0] {
            let va = fill_rounded_rect(&rect, *radius, white(), 8);
            assert_eq!(va.vertices(), clamped.vertices());
            let outline = draw_rounded_rect(&rect, *radius, white(), 4);
            assert_eq!(outline.vertices(), draw_rounded_rect(&rect, 20.0, white(), 4).vertices());
        }
        // nothing leaves the rect
        for i in 0..clamped.num_vertices() {
            let p = clamped.vertex_xy(i);
            assert!(p.x >= 10.0 - 1e-3 && p.x <= 110.0 + 1e-3);
            assert!(p.y >= 20.0 - 1e-3 && p.y <= 60.0 + 1e-3);
        }
    }

    #[test]
    fn rounded_rect_outline_closes() {
        let va = draw_rounded_rect(&FRect::new(0.0, 0.0, 50.0, 30.0), 5.0, white(), 4);
        assert_eq!(va.mode(), gl::LINE_STRIP);
        assert_eq!(va.num_vertices(), 4 * 5 + 1);
        let first = va.vertex_xy(0);
        let last = va.vertex_xy(va.num_vertices() - 1);
        assert!((first - last).x.abs() < 1e-4 && (first - last).y.abs() < 1e-4);
        assert_eq!(va.colors().len(), 4 * va.num_vertices());
    }

    #[test]
    fn circle_is_closed_fan_around_center() {
        let center = Vector2::new(5.0, 5.0);
        let va = fill_circle(center, 2.0, white(), 16);
        assert_eq!(va.mode(), gl::TRIANGLE_FAN);
        assert_eq!(va.num_vertices(), 1 + 16 + 1);
        assert_eq!(va.vertex_xy(0), center);
        assert_eq!(va.vertex_xy(1), va.vertex_xy(17));
        for i in 1..va.num_vertices() {
            let d = va.vertex_xy(i) - center;
            assert!(((d.x * d.x + d.y * d.y).sqrt() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn arc_swaps_reversed_angles_and_falls_back_to_circle() {
        let pos = Vector2::new(0.0, 0.0);
        let forward = fill_arc(pos, 1.0, 0.0, 80.0, white(), 16);
        let reversed = fill_arc(pos, 1.0, 80.0, 0.0, white(), 16);
        assert_eq!(forward.vertices(), reversed.vertices());
        // center, 4 steps of 22.5 degrees (0, 22.5, 45, 67.5), then the end point
        assert_eq!(forward.num_vertices(), 1 + 4 + 1);
        let end = forward.vertex_xy(5);
        let (sin, cos) = 80.0f32.to_radians().sin_cos();
        assert!((end.x - cos).abs() < 1e-5 && (end.y - sin).abs() < 1e-5);

        let full = fill_arc(pos, 1.0, -10.0, 350.0, white(), 16);
        assert_eq!(full.vertices(), fill_circle(pos, 1.0, white(), 16).vertices());

        let outline = draw_arc(pos, 1.0, 0.0, 80.0, white(), 16);
        assert_eq!(outline.vertex_xy(0), pos);
        assert_eq!(outline.vertex_xy(outline.num_vertices() - 1), pos);
    }

    #[test]
    fn grid_spans_the_area() {
        let va = grid(Vector2::new(25.0, 0.0), FSize::new(10.0, 50.0), FSize::new(40.0, 100.0), white());
        assert_eq!(va.mode(), gl::LINES);
        // x = 5, 15, 25, 35 and y = 0, 50
        assert_eq!(va.num_vertices(), 2 * (4 + 2));
        assert_eq!(va.vertex_xy(0), Vector2::new(5.0, 0.0));
        assert_eq!(va.vertex_xy(1), Vector2::new(5.0, 100.0));
        assert_eq!(va.vertex_xy(8), Vector2::new(0.0, 0.0));
        assert_eq!(va.vertex_xy(9), Vector2::new(40.0, 0.0));
    }
}
