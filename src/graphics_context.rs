use crate::assert_gl;
use crate::color::Color;
use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::framebuffer::FramebufferPtr;
use crate::geom::{FRect, FSize, IRect, ISize, Line, Quad};
use crate::gl_utils::{gl_framebuffer_binding, gl_get_int4, log_context_info};
use crate::matrix_stack::MatrixStack;
use crate::pixel_buffer::{PixelBuffer, PixelFormat};
use crate::scenegraph::{Drawable, RenderMask, VertexArrayDrawable};
use crate::shader::{ShaderProgram, ShaderProgramPtr};
use crate::shapes;
use crate::texture::{Texture, TexturePtr};
use crate::vertex_arrays::GLVertexArrays;

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector2};
use gl::types::*;
use std::os::raw::c_void;
use std::rc::Rc;

/// Nested clip rects. Every pushed rect is cut down to the one below it, so the active
/// area can only shrink as nesting gets deeper.
#[derive(Debug, Default, Clone)]
pub struct ClipStack {
    rects: Vec<IRect>,
}

impl ClipStack {
    pub fn new() -> ClipStack {
        ClipStack::default()
    }

    /// Returns the rect that is now active.
    pub fn push(&mut self, rect: IRect) -> IRect {
        let rect = match self.rects.last() {
            Some(top) => top.intersection(&rect),
            None => rect,
        };
        self.rects.push(rect);
        rect
    }

    /// Returns the rect active after popping, `None` when clipping is over.
    pub fn pop(&mut self) -> Option<IRect> {
        assert!(!self.rects.is_empty(), "cliprect stack underflow: pop without matching push");
        self.rects.pop();
        self.rects.last().copied()
    }

    pub fn top(&self) -> Option<IRect> {
        self.rects.last().copied()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// `glScissor` arguments for a top-down `rect` on a viewport `viewport_height` pixels high.
pub fn scissor_box(rect: &IRect, viewport_height: i32) -> (GLint, GLint, GLsizei, GLsizei) {
    (rect.left, viewport_height - rect.top - rect.height(), rect.width(), rect.height())
}

/// Anything `push_framebuffer` can bind.
pub trait RenderTarget {
    fn handle(&self) -> GLuint;
}

/// Render targets in binding order, plus whatever was bound before the first push.
#[derive(Debug)]
pub struct FramebufferStack<T: RenderTarget> {
    previous: GLuint,
    targets: Vec<T>,
}

impl<T: RenderTarget> Default for FramebufferStack<T> {
    fn default() -> FramebufferStack<T> {
        FramebufferStack { previous: 0, targets: Vec::new() }
    }
}

impl<T: RenderTarget> FramebufferStack<T> {
    pub fn new() -> FramebufferStack<T> {
        FramebufferStack::default()
    }

    /// Returns the handle to bind. `current_binding` is only asked when the stack is empty.
    pub fn push<F: FnOnce() -> GLuint>(&mut self, target: T, current_binding: F) -> GLuint {
        if self.targets.is_empty() {
            self.previous = current_binding();
        }
        let handle = target.handle();
        self.targets.push(target);
        handle
    }

    /// Returns the handle to bind now.
    pub fn pop(&mut self) -> GLuint {
        assert!(!self.targets.is_empty(), "framebuffer stack underflow: pop without matching push");
        self.targets.pop();
        match self.targets.last() {
            Some(target) => target.handle(),
            None => self.previous,
        }
    }

    pub fn top(&self) -> Option<&T> {
        self.targets.last()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// The state every draw call goes through: matrices, render targets, clipping, shader
/// and stencil nesting, and the shared GL objects used by immediate drawing.
///
/// Needs a current GL context for its whole lifetime.
pub struct GraphicsContext {
    size: ISize,
    modelview: MatrixStack,
    projection: Matrix4<f32>,
    cliprects: ClipStack,
    framebuffers: FramebufferStack<FramebufferPtr>,
    shaders: Vec<ShaderProgramPtr>,
    stencil_depth: u32,
    default_shader: ShaderProgramPtr,
    white_texture: TexturePtr,
    vertex_arrays: GLVertexArrays,
    circle_segments: u32,
    rounded_rect_fill_steps: u32,
    rounded_rect_outline_steps: u32,
}

impl GraphicsContext {
    pub fn new(config: &DisplayConfig) -> Result<GraphicsContext, DisplayError> {
        assert_gl!("entering GraphicsContext::new")?;
        log_context_info();
        let default_shader = Rc::new(ShaderProgram::default_program()?);
        let white = PixelBuffer::filled(PixelFormat::RGBA8, ISize::new(1, 1), Color::<u8>::white());
        let white_texture = Rc::new(Texture::from_pixel_buffer(&white)?);
        default_shader.use_program();

        let mut gc = GraphicsContext {
            size: config.initial_size,
            modelview: MatrixStack::new(),
            projection: Matrix4::identity(),
            cliprects: ClipStack::new(),
            framebuffers: FramebufferStack::new(),
            shaders: Vec::new(),
            stencil_depth: 0,
            default_shader,
            white_texture,
            vertex_arrays: GLVertexArrays::new(),
            circle_segments: config.circle_segments,
            rounded_rect_fill_steps: config.rounded_rect_fill_steps,
            rounded_rect_outline_steps: config.rounded_rect_outline_steps,
        };
        gc.resize(config.initial_size);
        assert_gl!("creating graphics context")?;
        Ok(gc)
    }

    fn render_now(&mut self, va: VertexArrayDrawable) {
        va.render(self, RenderMask::ALL);
    }

    pub fn clear(&mut self, color: Color<f32>) {
        unsafe {
            gl::ClearColor(color.r, color.g, color.b, color.a);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }
    }

    pub fn draw_line(&mut self, p1: Vector2<f32>, p2: Vector2<f32>, color: Color<f32>) {
        self.render_now(shapes::line(p1, p2, color));
    }

    /// The line, plus a 32px cyan tick out of its middle pointing along its normal.
    pub fn draw_line_with_normal(&mut self, line: &Line, color: Color<f32>) {
        self.draw_line(line.p1, line.p2, color);
        let d = line.p2 - line.p1;
        if d.magnitude2() == 0.0 {
            return;
        }
        let normal = Vector2::new(-d.y, d.x).normalize() * -32.0;
        let middle = line.p1 + d * 0.5;
        self.draw_line(middle, middle + normal, Color::from_rgb(0.0, 1.0, 1.0));
    }

    pub fn fill_quad(&mut self, quad: &Quad, color: Color<f32>) {
        self.render_now(shapes::fill_quad(quad, color));
    }

    pub fn draw_quad(&mut self, quad: &Quad, color: Color<f32>) {
        self.render_now(shapes::draw_quad(quad, color));
    }

    pub fn fill_rect(&mut self, rect: &FRect, color: Color<f32>) {
        self.render_now(shapes::fill_rect(rect, color));
    }

    pub fn draw_rect(&mut self, rect: &FRect, color: Color<f32>) {
        self.render_now(shapes::draw_rect(rect, color));
    }

    pub fn fill_rounded_rect(&mut self, rect: &FRect, radius: f32, color: Color<f32>) {
        let steps = self.rounded_rect_fill_steps;
        self.render_now(shapes::fill_rounded_rect(rect, radius, color, steps));
    }

    pub fn draw_rounded_rect(&mut self, rect: &FRect, radius: f32, color: Color<f32>) {
        let steps = self.rounded_rect_outline_steps;
        self.render_now(shapes::draw_rounded_rect(rect, radius, color, steps));
    }

    pub fn fill_circle(&mut self, pos: Vector2<f32>, radius: f32, color: Color<f32>) {
        let segments = self.circle_segments;
        self.render_now(shapes::fill_circle(pos, radius, color, segments));
    }

    pub fn draw_circle(&mut self, pos: Vector2<f32>, radius: f32, color: Color<f32>) {
        let segments = self.circle_segments;
        self.render_now(shapes::draw_circle(pos, radius, color, segments));
    }

    /// Angles in degrees.
    pub fn fill_arc(&mut self, pos: Vector2<f32>, radius: f32, start: f32, end: f32, color: Color<f32>) {
        let segments = self.circle_segments;
        self.render_now(shapes::fill_arc(pos, radius, start, end, color, segments));
    }

    pub fn draw_arc(&mut self, pos: Vector2<f32>, radius: f32, start: f32, end: f32, color: Color<f32>) {
        let segments = self.circle_segments;
        self.render_now(shapes::draw_arc(pos, radius, start, end, color, segments));
    }

    /// Lines every `cell` pixels over the whole context, shifted by `offset`.
    pub fn draw_grid(&mut self, offset: Vector2<f32>, cell: FSize, color: Color<f32>) {
        let area = self.size.to_f32();
        self.render_now(shapes::grid(offset, cell, area, color));
    }

    fn apply_scissor(&self, rect: &IRect) {
        let (x, y, w, h) = scissor_box(rect, self.size.height);
        unsafe {
            gl::Scissor(x, y, w, h);
            gl::Enable(gl::SCISSOR_TEST);
        }
    }

    pub fn push_cliprect(&mut self, rect: IRect) {
        let rect = self.cliprects.push(rect);
        self.apply_scissor(&rect);
        crate::debug_assert_gl!("pushing cliprect");
    }

    /// Panics without a matching `push_cliprect`.
    pub fn pop_cliprect(&mut self) {
        match self.cliprects.pop() {
            Some(rect) => self.apply_scissor(&rect),
            None => unsafe { gl::Disable(gl::SCISSOR_TEST) },
        }
        crate::debug_assert_gl!("popping cliprect");
    }

    pub fn cliprect(&self) -> Option<IRect> {
        self.cliprects.top()
    }

    pub fn push_framebuffer(&mut self, framebuffer: FramebufferPtr) {
        let handle = self.framebuffers.push(framebuffer, gl_framebuffer_binding);
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, handle); }
        log::debug!("pushed framebuffer {}, depth {}", handle, self.framebuffers.len());
        crate::debug_assert_gl!("pushing framebuffer");
    }

    /// Panics without a matching `push_framebuffer`.
    pub fn pop_framebuffer(&mut self) {
        let handle = self.framebuffers.pop();
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, handle); }
        log::debug!("popped framebuffer, depth {}, {} bound", self.framebuffers.len(), handle);
        crate::debug_assert_gl!("popping framebuffer");
    }

    /// The framebuffer being rendered to, `None` for the one bound before any push.
    pub fn framebuffer(&self) -> Option<FramebufferPtr> {
        self.framebuffers.top().cloned()
    }

    /// Makes `size` the logical size, with (0, 0) top left.
    pub fn set_ortho(&mut self, size: ISize) {
        self.size = size;
        self.projection = cgmath::ortho(0.0, size.width as f32, size.height as f32, 0.0, 1000.0, -1000.0);
    }

    pub fn set_projection(&mut self, projection: Matrix4<f32>) {
        self.projection = projection;
    }

    /// Window resize: the viewport follows the window, the logical size too.
    pub fn resize(&mut self, size: ISize) {
        unsafe { gl::Viewport(0, 0, size.width, size.height); }
        self.set_ortho(size);
    }

    pub fn size(&self) -> ISize {
        self.size
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn modelview(&self) -> Matrix4<f32> {
        *self.modelview.top()
    }

    pub fn push_matrix(&mut self) {
        self.modelview.push();
    }

    pub fn pop_matrix(&mut self) {
        self.modelview.pop();
    }

    pub fn set_modelview(&mut self, mat: Matrix4<f32>) {
        self.modelview.set(mat);
    }

    pub fn mult_matrix(&mut self, mat: &Matrix4<f32>) {
        self.modelview.mult(mat);
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.modelview.translate(x, y, z);
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.modelview.scale(x, y, z);
    }

    /// `degrees` around the (x, y, z) axis.
    pub fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) {
        self.modelview.rotate(degrees, x, y, z);
    }

    /// Vertex arrays without a program of their own use this one until the matching pop.
    pub fn push_shader(&mut self, program: ShaderProgramPtr) {
        self.shaders.push(program);
    }

    pub fn pop_shader(&mut self) {
        assert!(!self.shaders.is_empty(), "shader stack underflow: pop without matching push");
        self.shaders.pop();
    }

    pub fn current_shader(&self) -> ShaderProgramPtr {
        self.shaders.last().unwrap_or(&self.default_shader).clone()
    }

    pub fn default_shader(&self) -> &ShaderProgramPtr {
        &self.default_shader
    }

    /// 1x1 opaque white, bound for untextured geometry.
    pub fn white_texture(&self) -> &TexturePtr {
        &self.white_texture
    }

    pub fn vertex_arrays(&self) -> &GLVertexArrays {
        &self.vertex_arrays
    }

    /// Runs `f` one stencil level deeper, handing it the new level (1 for the outermost).
    ///
    /// The stencil test is enabled and the stencil buffer cleared when entering the
    /// outermost level, and disabled again when leaving it.
    pub fn stencil_scope<R, F: FnOnce(&mut GraphicsContext, u32) -> R>(&mut self, f: F) -> R {
        if self.stencil_depth == 0 {
            unsafe {
                gl::Enable(gl::STENCIL_TEST);
                gl::ClearStencil(0);
                gl::Clear(gl::STENCIL_BUFFER_BIT);
            }
        }
        self.stencil_depth += 1;
        let level = self.stencil_depth;
        let result = f(self, level);
        self.stencil_depth -= 1;
        if self.stencil_depth == 0 {
            unsafe {
                gl::StencilFunc(gl::ALWAYS, 0, 1);
                gl::StencilOp(gl::KEEP, gl::KEEP, gl::KEEP);
                gl::Disable(gl::STENCIL_TEST);
            }
        }
        result
    }

    pub fn stencil_depth(&self) -> u32 {
        self.stencil_depth
    }

    /// Reads the color buffer back as RGB8, top row first. The width is rounded down
    /// to a multiple of 4.
    pub fn screenshot(&self) -> Result<PixelBuffer, DisplayError> {
        let viewport = gl_get_int4(gl::VIEWPORT);
        let size = ISize::new(viewport[2] / 4 * 4, viewport[3]);
        let mut buffer = PixelBuffer::new(PixelFormat::RGB8, size);
        unsafe {
            gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
            gl::ReadPixels(
                0,
                0,
                size.width,
                size.height,
                gl::RGB,
                gl::UNSIGNED_BYTE,
                buffer.data_mut().as_mut_ptr() as *mut c_void
            );
            gl::PixelStorei(gl::PACK_ALIGNMENT, 4);
        }
        assert_gl!("reading back the color buffer")?;
        buffer.flip_vertical();
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTarget(GLuint);

    impl RenderTarget for FakeTarget {
        fn handle(&self) -> GLuint {
            self.0
        }
    }

    #[test]
    fn cliprects_only_shrink() {
        let mut clips = ClipStack::new();
        let outer = clips.push(IRect::new(0, 0, 100, 100));
        let inner = clips.push(IRect::new(50, -20, 300, 60));
        assert_eq!(inner, IRect::new(50, 0, 100, 60));
        assert!(outer.contains_rect(&inner));
        let disjoint = clips.push(IRect::new(200, 200, 250, 250));
        assert!(disjoint.is_empty());
        assert!(inner.contains_rect(&disjoint));

        assert_eq!(clips.pop(), Some(inner));
        assert_eq!(clips.pop(), Some(outer));
        assert_eq!(clips.pop(), None);
        assert!(clips.is_empty());
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn cliprect_pop_on_empty_panics() {
        ClipStack::new().pop();
    }

    #[test]
    fn scissor_is_bottom_up() {
        // 480 high viewport, rect 20px from the top and 100px high
        assert_eq!(scissor_box(&IRect::new(10, 20, 60, 120), 480), (10, 360, 50, 100));
    }

    #[test]
    fn framebuffer_unwind_restores_the_prior_binding() {
        let mut stack = FramebufferStack::new();
        let mut queries = 0;
        let mut bound = 7;
        bound = stack.push(FakeTarget(1), || { queries += 1; bound });
        assert_eq!(bound, 1);
        bound = stack.push(FakeTarget(2), || { queries += 1; bound });
        assert_eq!(bound, 2);
        bound = stack.pop();
        assert_eq!(bound, 1);
        bound = stack.pop();
        assert_eq!(bound, 7);
        assert_eq!(queries, 1);

        // a new outermost push remembers the binding at that point
        bound = 3;
        stack.push(FakeTarget(4), || bound);
        assert_eq!(stack.top().map(|t| t.0), Some(4));
        assert_eq!(stack.pop(), 3);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn framebuffer_pop_on_empty_panics() {
        FramebufferStack::<FakeTarget>::new().pop();
    }
}
