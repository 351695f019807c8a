use crate::color::Color;
use crate::config::DisplayConfig;
use crate::font::TtfFont;
use crate::geom::{FRect, FSize, Line, Quad};
use crate::graphics_context::GraphicsContext;
use crate::matrix_stack::MatrixStack;
use crate::scenegraph::{
    ControlDrawable, Drawable, DrawableProps, FillScreenDrawable, FillScreenPatternDrawable, RenderMask,
    SurfaceDrawable, SurfaceQuadDrawable, TextDrawable, VertexArrayDrawable,
};
use crate::shapes;
use crate::surface::{DrawingParameters, SurfaceDrawingParameters, SurfacePtr};
use crate::texture::TexturePtr;

use cgmath::{Matrix4, Vector2};
use std::rc::Rc;

/// Collects draw requests and renders them later, sorted by depth.
///
/// Every request captures the modelview of this context (not the one of the
/// `GraphicsContext`) at the time it is submitted. Requests are kept after `render`,
/// call `clear` to start the next frame.
pub struct DrawingContext {
    drawables: Vec<Box<dyn Drawable>>,
    modelview: MatrixStack,
    circle_segments: u32,
    rounded_rect_fill_steps: u32,
    rounded_rect_outline_steps: u32,
}

impl Default for DrawingContext {
    fn default() -> DrawingContext {
        DrawingContext::new(&DisplayConfig::default())
    }
}

impl DrawingContext {
    pub fn new(config: &DisplayConfig) -> DrawingContext {
        DrawingContext {
            drawables: Vec::new(),
            modelview: MatrixStack::new(),
            circle_segments: config.circle_segments,
            rounded_rect_fill_steps: config.rounded_rect_fill_steps,
            rounded_rect_outline_steps: config.rounded_rect_outline_steps,
        }
    }

    /// Sorts by ascending depth, keeping submission order among equal depths. A NaN depth
    /// sorts after every number.
    pub fn sort(&mut self) {
        self.drawables.sort_by(|a, b| a.z_pos().total_cmp(&b.z_pos()));
    }

    pub fn render(&mut self, gc: &mut GraphicsContext) {
        self.sort();
        for drawable in &self.drawables {
            drawable.render(gc, RenderMask::ALL);
        }
    }

    pub fn clear(&mut self) {
        self.drawables.clear();
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// In submission order, or depth order once sorted or rendered.
    pub fn drawables(&self) -> &[Box<dyn Drawable>] {
        &self.drawables
    }

    pub fn draw(&mut self, drawable: Box<dyn Drawable>) {
        self.drawables.push(drawable);
    }

    fn draw_shape(&mut self, mut va: VertexArrayDrawable, z_pos: f32) {
        *va.props_mut() = DrawableProps::new(Vector2::new(0.0, 0.0), z_pos, self.modelview());
        self.draw(Box::new(va));
    }

    pub fn fill_screen(&mut self, color: Color<f32>) {
        self.draw(Box::new(FillScreenDrawable::new(color)));
    }

    pub fn fill_pattern(&mut self, pattern: TexturePtr, offset: Vector2<f32>) {
        self.draw(Box::new(FillScreenPatternDrawable::new(pattern, offset)));
    }

    pub fn draw_line(&mut self, line: &Line, color: Color<f32>, z_pos: f32) {
        self.draw_shape(shapes::line(line.p1, line.p2, color), z_pos);
    }

    pub fn draw_rect(&mut self, rect: &FRect, color: Color<f32>, z_pos: f32) {
        self.draw_shape(shapes::draw_rect(rect, color), z_pos);
    }

    pub fn fill_rect(&mut self, rect: &FRect, color: Color<f32>, z_pos: f32) {
        self.draw_shape(shapes::fill_rect(rect, color), z_pos);
    }

    pub fn draw_quad(&mut self, quad: &Quad, color: Color<f32>, z_pos: f32) {
        self.draw_shape(shapes::draw_quad(quad, color), z_pos);
    }

    pub fn fill_quad(&mut self, quad: &Quad, color: Color<f32>, z_pos: f32) {
        self.draw_shape(shapes::fill_quad(quad, color), z_pos);
    }

    pub fn draw_rounded_rect(&mut self, rect: &FRect, radius: f32, color: Color<f32>, z_pos: f32) {
        let va = shapes::draw_rounded_rect(rect, radius, color, self.rounded_rect_outline_steps);
        self.draw_shape(va, z_pos);
    }

    pub fn fill_rounded_rect(&mut self, rect: &FRect, radius: f32, color: Color<f32>, z_pos: f32) {
        let va = shapes::fill_rounded_rect(rect, radius, color, self.rounded_rect_fill_steps);
        self.draw_shape(va, z_pos);
    }

    pub fn draw_circle(&mut self, pos: Vector2<f32>, radius: f32, color: Color<f32>, z_pos: f32) {
        let va = shapes::draw_circle(pos, radius, color, self.circle_segments);
        self.draw_shape(va, z_pos);
    }

    pub fn fill_circle(&mut self, pos: Vector2<f32>, radius: f32, color: Color<f32>, z_pos: f32) {
        let va = shapes::fill_circle(pos, radius, color, self.circle_segments);
        self.draw_shape(va, z_pos);
    }

    /// The surface at `pos`, unscaled.
    pub fn draw_surface(&mut self, surface: SurfacePtr, pos: Vector2<f32>, z_pos: f32) {
        let params = SurfaceDrawingParameters::default().with_pos(pos);
        self.draw_surface_with(surface, params, z_pos);
    }

    pub fn draw_surface_with(&mut self, surface: SurfacePtr, params: SurfaceDrawingParameters, z_pos: f32) {
        let modelview = self.modelview();
        self.draw(Box::new(SurfaceDrawable::new(surface, params, z_pos, modelview)));
    }

    /// The surface stretched over `quad`, whose corners are relative to `pos`.
    pub fn draw_surface_quad(
        &mut self,
        surface: SurfacePtr,
        pos: Vector2<f32>,
        quad: Quad,
        params: DrawingParameters,
        z_pos: f32,
    ) {
        let modelview = self.modelview();
        self.draw(Box::new(SurfaceQuadDrawable::new(surface, pos, quad, params, z_pos, modelview)));
    }

    pub fn draw_control(&mut self, surface: SurfacePtr, pos: Vector2<f32>, angle: f32, z_pos: f32) {
        let modelview = self.modelview();
        self.draw(Box::new(ControlDrawable::new(surface, pos, angle, z_pos, modelview)));
    }

    pub fn draw_text(&mut self, font: Rc<TtfFont>, text: &str, pos: Vector2<f32>, color: Color<f32>, z_pos: f32) {
        let modelview = self.modelview();
        self.draw(Box::new(TextDrawable::new(font, text, pos, color, z_pos, modelview)));
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.modelview.translate(x, y, z);
    }

    /// `degrees` around the (x, y, z) axis.
    pub fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) {
        self.modelview.rotate(degrees, x, y, z);
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.modelview.scale(x, y, z);
    }

    pub fn mult(&mut self, mat: &Matrix4<f32>) {
        self.modelview.mult(mat);
    }

    pub fn push_modelview(&mut self) {
        self.modelview.push();
    }

    /// Panics when nothing was pushed.
    pub fn pop_modelview(&mut self) {
        self.modelview.pop();
    }

    pub fn set_modelview(&mut self, mat: Matrix4<f32>) {
        self.modelview.set(mat);
    }

    pub fn reset_modelview(&mut self) {
        self.modelview.reset();
    }

    pub fn modelview(&self) -> Matrix4<f32> {
        *self.modelview.top()
    }

    /// The area of the world visible through a `size` viewport, translation only.
    pub fn clip_rect(&self, size: FSize) -> FRect {
        let m = self.modelview.top();
        FRect::from_pos_size(m.w.x, m.w.y, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenegraph::tests::{id_of, Probe};
    use cgmath::{SquareMatrix, Vector3};

    fn ids(dc: &DrawingContext) -> Vec<f32> {
        dc.drawables().iter().map(|d| id_of(&**d)).collect()
    }

    #[test]
    fn sort_is_stable_and_ascending() {
        let mut dc = DrawingContext::default();
        dc.draw(Box::new(Probe::new(1.0, 5.0))); // A
        dc.draw(Box::new(Probe::new(2.0, 1.0))); // B
        dc.draw(Box::new(Probe::new(3.0, 5.0))); // C
        dc.sort();
        assert_eq!(ids(&dc), vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn equal_depths_keep_submission_order() {
        let mut dc = DrawingContext::default();
        for id in 0..20 {
            dc.draw(Box::new(Probe::new(id as f32, (id % 3) as f32)));
        }
        dc.sort();
        let order = ids(&dc);
        let expected: Vec<f32> = (0..3)
            .flat_map(|z| (0..20).filter(move |id| id % 3 == z))
            .map(|id| id as f32)
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn nan_depth_goes_last() {
        let mut dc = DrawingContext::default();
        for id in 0..64 {
            let z = if id % 7 == 0 { f32::NAN } else { (64 - id) as f32 };
            dc.draw(Box::new(Probe::new(id as f32, z)));
        }
        dc.sort();
        let z: Vec<f32> = dc.drawables().iter().map(|d| d.z_pos()).collect();
        let numbers = z.iter().take_while(|z| !z.is_nan()).count();
        assert_eq!(numbers, 64 - 10);
        assert!(z[numbers..].iter().all(|z| z.is_nan()));
        assert!(z[..numbers].windows(2).all(|w| w[0] <= w[1]));
        // NaNs keep submission order too
        assert_eq!(ids(&dc)[numbers..], [0.0, 7.0, 14.0, 21.0, 28.0, 35.0, 42.0, 49.0, 56.0, 63.0]);
    }

    #[test]
    fn later_depth_paints_last() {
        let mut dc = DrawingContext::default();
        dc.fill_rect(&FRect::new(50.0, 50.0, 150.0, 150.0), Color::black(), 1.0);
        dc.fill_rect(&FRect::new(0.0, 0.0, 100.0, 100.0), Color::white(), 0.0);
        dc.sort();
        let z: Vec<f32> = dc.drawables().iter().map(|d| d.z_pos()).collect();
        assert_eq!(z, vec![0.0, 1.0]);
    }

    #[test]
    fn modelview_is_captured_at_submission() {
        let mut dc = DrawingContext::default();
        dc.translate(10.0, 20.0, 0.0);
        dc.draw_line(&Line::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)), Color::white(), 0.0);
        dc.translate(5.0, 0.0, 0.0);
        dc.fill_screen(Color::black());

        let captured: Vec<Matrix4<f32>> = dc.drawables().iter().map(|d| d.props().modelview).collect();
        assert_eq!(captured[0], Matrix4::from_translation(Vector3::new(10.0, 20.0, 0.0)));
        // backgrounds ignore the modelview entirely
        assert_eq!(captured[1], Matrix4::identity());
    }

    #[test]
    fn modelview_stack_is_independent_and_resettable() {
        let mut dc = DrawingContext::default();
        dc.push_modelview();
        dc.translate(3.0, 4.0, 0.0);
        assert_eq!(dc.clip_rect(FSize::new(800.0, 600.0)), FRect::new(3.0, 4.0, 803.0, 604.0));
        dc.pop_modelview();
        assert_eq!(dc.modelview(), Matrix4::identity());
        dc.push_modelview();
        dc.scale(2.0, 2.0, 1.0);
        dc.reset_modelview();
        assert_eq!(dc.modelview(), Matrix4::identity());
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn popping_the_base_modelview_panics() {
        DrawingContext::default().pop_modelview();
    }

    #[test]
    fn clear_drops_everything() {
        let mut dc = DrawingContext::default();
        dc.fill_rect(&FRect::new(0.0, 0.0, 1.0, 1.0), Color::white(), 0.0);
        dc.fill_circle(Vector2::new(0.0, 0.0), 4.0, Color::white(), 0.0);
        assert_eq!(dc.len(), 2);
        dc.clear();
        assert!(dc.is_empty());
    }
}
