use crate::color::Color;
use crate::error::DisplayError;
use crate::geom::{FRect, FSize, ISize, Quad};
use crate::graphics_context::GraphicsContext;
use crate::scenegraph::{Drawable, RenderMask, VertexArrayDrawable};
use crate::texture::{Texture, TexturePtr};

use cgmath::Vector2;
use gl::types::GLenum;
use std::rc::Rc;

pub type SurfacePtr = Rc<Surface>;

/// Blend function and color, for drawing a surface stretched over an arbitrary quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingParameters {
    pub blend_src: GLenum,
    pub blend_dst: GLenum,
    pub color: Color<f32>,
}

impl Default for DrawingParameters {
    fn default() -> DrawingParameters {
        DrawingParameters {
            blend_src: gl::SRC_ALPHA,
            blend_dst: gl::ONE_MINUS_SRC_ALPHA,
            color: Color::white(),
        }
    }
}

impl DrawingParameters {
    pub fn with_color(mut self, color: Color<f32>) -> Self {
        self.color = color;
        self
    }

    pub fn with_blend_func(mut self, src: GLenum, dst: GLenum) -> Self {
        self.blend_src = src;
        self.blend_dst = dst;
        self
    }
}

/// Everything `Surface::draw_with` can do to a sprite.
///
/// `angle` is in degrees, the quad rotates around its own center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDrawingParameters {
    pub pos: Vector2<f32>,
    pub scale: Vector2<f32>,
    pub angle: f32,
    pub hflip: bool,
    pub vflip: bool,
    pub color: Color<f32>,
    pub blend_src: GLenum,
    pub blend_dst: GLenum,
    pub z_pos: f32,
    pub depth_test: bool,
}

impl Default for SurfaceDrawingParameters {
    fn default() -> SurfaceDrawingParameters {
        SurfaceDrawingParameters {
            pos: Vector2::new(0.0, 0.0),
            scale: Vector2::new(1.0, 1.0),
            angle: 0.0,
            hflip: false,
            vflip: false,
            color: Color::white(),
            blend_src: gl::SRC_ALPHA,
            blend_dst: gl::ONE_MINUS_SRC_ALPHA,
            z_pos: 0.0,
            depth_test: false,
        }
    }
}

impl SurfaceDrawingParameters {
    pub fn at(x: f32, y: f32) -> SurfaceDrawingParameters {
        SurfaceDrawingParameters::default().with_pos(Vector2::new(x, y))
    }

    pub fn with_pos(mut self, pos: Vector2<f32>) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = Vector2::new(x, y);
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_hflip(mut self, hflip: bool) -> Self {
        self.hflip = hflip;
        self
    }

    pub fn with_vflip(mut self, vflip: bool) -> Self {
        self.vflip = vflip;
        self
    }

    pub fn with_color(mut self, color: Color<f32>) -> Self {
        self.color = color;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.color.a = alpha;
        self
    }

    pub fn with_blend_func(mut self, src: GLenum, dst: GLenum) -> Self {
        self.blend_src = src;
        self.blend_dst = dst;
        self
    }

    pub fn with_z_pos(mut self, z_pos: f32) -> Self {
        self.z_pos = z_pos;
        self
    }

    pub fn with_depth_test(mut self, depth_test: bool) -> Self {
        self.depth_test = depth_test;
        self
    }
}

/// A rectangle of a texture, with the size it has on screen.
///
/// Several surfaces may share a single texture, each with its own uv rect.
#[derive(Debug, Clone)]
pub struct Surface {
    texture: TexturePtr,
    uv: FRect,
    size: FSize,
}

impl Surface {
    /// `uv` is in [0, 1] texture space, `size` in pixels.
    pub fn new(texture: TexturePtr, uv: FRect, size: FSize) -> Surface {
        Surface { texture, uv, size }
    }

    /// A surface on a fresh, empty texture, meant as a render target.
    pub fn blank(size: ISize) -> Result<Surface, DisplayError> {
        let texture = Rc::new(Texture::create(gl::TEXTURE_2D, size)?);
        let uv = FRect::new(
            0.0,
            0.0,
            size.width as f32 / texture.width() as f32,
            size.height as f32 / texture.height() as f32,
        );
        Ok(Surface { texture, uv, size: size.to_f32() })
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn size(&self) -> FSize {
        self.size
    }

    pub fn texture(&self) -> &TexturePtr {
        &self.texture
    }

    pub fn uv(&self) -> FRect {
        self.uv
    }

    /// The plain blit: the surface at `pos`, unscaled, alpha blended.
    pub fn vertex_array(&self, pos: Vector2<f32>) -> VertexArrayDrawable {
        let mut va = VertexArrayDrawable::new();
        va.set_blend_func(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        va.set_texture(self.texture.clone());
        va.set_mode(gl::TRIANGLE_FAN);
        va.add_texcoords_from_rect(&self.uv);
        let rect = FRect::new(pos.x, pos.y, pos.x + self.size.width, pos.y + self.size.height);
        for p in Quad::from_rect(&rect).points().iter() {
            va.vertex_at(*p);
        }
        va
    }

    /// Flips swap the uv corners, rotation only moves the vertices.
    pub fn vertex_array_with(&self, params: &SurfaceDrawingParameters) -> VertexArrayDrawable {
        let mut va = VertexArrayDrawable::new();
        va.set_blend_func(params.blend_src, params.blend_dst);
        va.set_texture(self.texture.clone());
        va.set_mode(gl::TRIANGLE_FAN);
        va.set_depth_test(params.depth_test);

        let mut uv = self.uv;
        if params.hflip {
            std::mem::swap(&mut uv.left, &mut uv.right);
        }
        if params.vflip {
            std::mem::swap(&mut uv.top, &mut uv.bottom);
        }

        let mut quad = Quad::from_rect(&FRect::new(
            params.pos.x,
            params.pos.y,
            params.pos.x + self.size.width * params.scale.x,
            params.pos.y + self.size.height * params.scale.y,
        ));
        quad.rotate(params.angle);

        let corners = [(uv.left, uv.top), (uv.right, uv.top), (uv.right, uv.bottom), (uv.left, uv.bottom)];
        for (p, (u, v)) in quad.points().iter().zip(corners.iter()) {
            va.color(params.color);
            va.texcoord(*u, *v);
            va.vertex3(p.x, p.y, params.z_pos);
        }
        va
    }

    pub fn draw(&self, gc: &mut GraphicsContext, pos: Vector2<f32>) {
        self.vertex_array(pos).render(gc, RenderMask::ALL);
    }

    pub fn draw_with(&self, gc: &mut GraphicsContext, params: &SurfaceDrawingParameters) {
        self.vertex_array_with(params).render(gc, RenderMask::ALL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        let texture = Rc::new(Texture::detached(ISize::new(64, 64)));
        Surface::new(texture, FRect::new(0.25, 0.5, 0.75, 1.0), FSize::new(32.0, 16.0))
    }

    fn close(a: Vector2<f32>, x: f32, y: f32) -> bool {
        (a.x - x).abs() < 1e-4 && (a.y - y).abs() < 1e-4
    }

    #[test]
    fn plain_blit_covers_the_logical_size() {
        let va = surface().vertex_array(Vector2::new(10.0, 20.0));
        assert_eq!(va.mode(), gl::TRIANGLE_FAN);
        assert_eq!(va.num_vertices(), 4);
        assert!(close(va.vertex_xy(0), 10.0, 20.0));
        assert!(close(va.vertex_xy(2), 42.0, 36.0));
        assert_eq!(va.texcoords(), &[0.25, 0.5, 0.75, 0.5, 0.75, 1.0, 0.25, 1.0]);
        assert_eq!(va.blend_func(), (gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA));
    }

    #[test]
    fn flips_swap_uv_bounds() {
        let params = SurfaceDrawingParameters::default().with_hflip(true).with_vflip(true);
        let va = surface().vertex_array_with(&params);
        // top left vertex now samples the bottom right uv corner
        assert_eq!(&va.texcoords()[0..2], &[0.75, 1.0]);
        assert_eq!(&va.texcoords()[4..6], &[0.25, 0.5]);
    }

    #[test]
    fn rotation_moves_geometry_not_uv() {
        let params = SurfaceDrawingParameters::at(0.0, 0.0)
            .with_scale(2.0, 4.0)
            .with_angle(180.0)
            .with_z_pos(3.0)
            .with_alpha(0.5);
        let va = surface().vertex_array_with(&params);
        // 64x64 quad turned half way around its center, first vertex lands bottom right
        assert!(close(va.vertex_xy(0), 64.0, 64.0));
        assert!(close(va.vertex_xy(2), 0.0, 0.0));
        assert_eq!(&va.texcoords()[0..2], &[0.25, 0.5]);
        assert_eq!(va.vertices()[2], 3.0);
        assert_eq!(va.colors()[3], 0.5);
    }
}
