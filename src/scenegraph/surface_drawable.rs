use super::{Drawable, DrawableProps, RenderMask, VertexArrayDrawable};
use crate::geom::Quad;
use crate::graphics_context::GraphicsContext;
use crate::surface::{DrawingParameters, SurfacePtr, SurfaceDrawingParameters};

use cgmath::{Matrix4, Vector2, Vector4};

/// A surface drawn with `Surface::draw_with`, under the captured modelview.
#[derive(Debug, Clone)]
pub struct SurfaceDrawable {
    props: DrawableProps,
    surface: SurfacePtr,
    params: SurfaceDrawingParameters,
}

impl SurfaceDrawable {
    pub fn new(surface: SurfacePtr, params: SurfaceDrawingParameters, z_pos: f32, modelview: Matrix4<f32>) -> SurfaceDrawable {
        SurfaceDrawable {
            props: DrawableProps::new(params.pos, z_pos, modelview),
            surface,
            params,
        }
    }

    pub fn surface(&self) -> &SurfacePtr {
        &self.surface
    }

    pub fn params(&self) -> &SurfaceDrawingParameters {
        &self.params
    }

    /// The parameters at the current position, which `set_pos` may have moved.
    fn draw_params(&self) -> SurfaceDrawingParameters {
        self.params.with_pos(self.props.pos)
    }
}

impl Drawable for SurfaceDrawable {
    fn render(&self, gc: &mut GraphicsContext, _mask: RenderMask) {
        gc.push_matrix();
        gc.mult_matrix(&self.props.modelview);
        self.surface.draw_with(gc, &self.draw_params());
        gc.pop_matrix();
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}

/// A surface stretched over an arbitrary quad, relative to `pos`.
#[derive(Debug, Clone)]
pub struct SurfaceQuadDrawable {
    props: DrawableProps,
    surface: SurfacePtr,
    quad: Quad,
    params: DrawingParameters,
}

impl SurfaceQuadDrawable {
    pub fn new(
        surface: SurfacePtr,
        pos: Vector2<f32>,
        quad: Quad,
        params: DrawingParameters,
        z_pos: f32,
        modelview: Matrix4<f32>,
    ) -> SurfaceQuadDrawable {
        SurfaceQuadDrawable { props: DrawableProps::new(pos, z_pos, modelview), surface, quad, params }
    }

    pub fn vertex_array(&self) -> VertexArrayDrawable {
        let mut va = VertexArrayDrawable::new();
        va.set_mode(gl::TRIANGLE_FAN);
        va.set_texture(self.surface.texture().clone());
        va.set_blend_func(self.params.blend_src, self.params.blend_dst);
        let pos = self.props.pos;
        let uv = self.surface.uv();
        let corners = [(uv.left, uv.top), (uv.right, uv.top), (uv.right, uv.bottom), (uv.left, uv.bottom)];
        for (p, (u, v)) in self.quad.points().iter().zip(corners.iter()) {
            va.color(self.params.color);
            va.texcoord(*u, *v);
            va.vertex_at(pos + *p);
        }
        va
    }
}

impl Drawable for SurfaceQuadDrawable {
    fn render(&self, gc: &mut GraphicsContext, mask: RenderMask) {
        let va = self.vertex_array();
        gc.push_matrix();
        gc.mult_matrix(&self.props.modelview);
        va.render(gc, mask);
        gc.pop_matrix();
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}

/// A sprite centered on its transformed position and rotated by `angle` degrees.
///
/// Only the position goes through the captured modelview, the sprite itself is drawn
/// unscaled, like a HUD marker following something in the scene.
#[derive(Debug, Clone)]
pub struct ControlDrawable {
    props: DrawableProps,
    surface: SurfacePtr,
    angle: f32,
}

impl ControlDrawable {
    pub fn new(surface: SurfacePtr, pos: Vector2<f32>, angle: f32, z_pos: f32, modelview: Matrix4<f32>) -> ControlDrawable {
        ControlDrawable { props: DrawableProps::new(pos, z_pos, modelview), surface, angle }
    }

    /// Top left corner of the sprite in screen space.
    pub fn screen_pos(&self) -> Vector2<f32> {
        let pos = self.props.pos;
        let p = self.props.modelview * Vector4::new(pos.x, pos.y, 0.0, 1.0);
        Vector2::new(p.x - self.surface.width() / 2.0, p.y - self.surface.height() / 2.0)
    }
}

impl Drawable for ControlDrawable {
    fn render(&self, gc: &mut GraphicsContext, _mask: RenderMask) {
        let params = SurfaceDrawingParameters::default()
            .with_pos(self.screen_pos())
            .with_angle(self.angle);
        self.surface.draw_with(gc, &params);
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{FRect, FSize, ISize};
    use crate::surface::Surface;
    use crate::texture::Texture;
    use std::rc::Rc;

    fn surface() -> SurfacePtr {
        let texture = Rc::new(Texture::detached(ISize::new(32, 32)));
        Rc::new(Surface::new(texture, FRect::new(0.0, 0.0, 0.5, 0.5), FSize::new(16.0, 8.0)))
    }

    #[test]
    fn control_is_centered_on_the_transformed_position() {
        let modelview = Matrix4::from_translation(cgmath::Vector3::new(100.0, 50.0, 0.0));
        let control = ControlDrawable::new(surface(), Vector2::new(10.0, 10.0), 45.0, 2.0, modelview);
        assert_eq!(control.screen_pos(), Vector2::new(102.0, 56.0));
        assert_eq!(control.z_pos(), 2.0);
    }

    #[test]
    fn moved_surface_draws_at_its_new_pos() {
        let params = SurfaceDrawingParameters::default().with_pos(Vector2::new(1.0, 2.0));
        let mut drawable = SurfaceDrawable::new(surface(), params, 0.0, Matrix4::from_scale(1.0));
        assert_eq!(drawable.draw_params().pos, Vector2::new(1.0, 2.0));
        drawable.set_pos(Vector2::new(7.0, 8.0));
        assert_eq!(drawable.draw_params().pos, Vector2::new(7.0, 8.0));
        assert_eq!(drawable.params().pos, Vector2::new(1.0, 2.0));
    }

    #[test]
    fn quad_corners_are_relative_to_pos() {
        let quad = Quad::from_rect(&FRect::new(0.0, 0.0, 10.0, 20.0));
        let params = DrawingParameters::default().with_blend_func(gl::ONE, gl::ONE);
        let drawable = SurfaceQuadDrawable::new(surface(), Vector2::new(5.0, 5.0), quad, params, 0.0, Matrix4::from_scale(1.0));
        let va = drawable.vertex_array();
        assert_eq!(va.vertex_xy(2), Vector2::new(15.0, 25.0));
        assert_eq!(&va.texcoords()[4..6], &[0.5, 0.5]);
        assert_eq!(va.blend_func(), (gl::ONE, gl::ONE));
    }
}
