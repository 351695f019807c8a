use super::{Drawable, DrawableProps, RenderMask, VertexArrayDrawable};
use crate::color::Color;
use crate::graphics_context::GraphicsContext;
use crate::texture::TexturePtr;

use cgmath::{Matrix4, SquareMatrix, Vector2};

/// Depth of the background drawables, behind anything sensible.
pub const BACKGROUND_Z: f32 = -1000.0;

/// Clears the whole color buffer.
#[derive(Debug, Clone)]
pub struct FillScreenDrawable {
    props: DrawableProps,
    color: Color<f32>,
}

impl FillScreenDrawable {
    pub fn new(color: Color<f32>) -> FillScreenDrawable {
        FillScreenDrawable { props: DrawableProps::at_depth(BACKGROUND_Z), color }
    }

    pub fn color(&self) -> Color<f32> {
        self.color
    }
}

impl Drawable for FillScreenDrawable {
    fn render(&self, _gc: &mut GraphicsContext, _mask: RenderMask) {
        let c = self.color;
        unsafe {
            gl::ClearColor(c.r, c.g, c.b, c.a);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}

/// Tiles a texture over the whole viewport, ignoring any modelview.
///
/// The texture needs a repeating wrap mode, see `TextureManager::get_pattern`.
#[derive(Debug, Clone)]
pub struct FillScreenPatternDrawable {
    props: DrawableProps,
    texture: TexturePtr,
    offset: Vector2<f32>,
}

impl FillScreenPatternDrawable {
    pub fn new(texture: TexturePtr, offset: Vector2<f32>) -> FillScreenPatternDrawable {
        FillScreenPatternDrawable { props: DrawableProps::at_depth(BACKGROUND_Z), texture, offset }
    }

    pub fn set_offset(&mut self, offset: Vector2<f32>) {
        self.offset = offset;
    }

    /// A fan over (0, 0)-(width, height) whose uvs count texture repetitions.
    pub fn vertex_array(&self, width: f32, height: f32) -> VertexArrayDrawable {
        let tw = self.texture.width() as f32;
        let th = self.texture.height() as f32;
        let u_start = -self.offset.x / tw;
        let v_start = -self.offset.y / th;
        let u = width / tw + u_start;
        let v = height / th + v_start;

        let mut va = VertexArrayDrawable::new();
        va.set_blend_func(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        va.set_texture(self.texture.clone());
        va.set_mode(gl::TRIANGLE_FAN);
        va.texcoord(u_start, v_start);
        va.vertex(0.0, 0.0);
        va.texcoord(u, v_start);
        va.vertex(width, 0.0);
        va.texcoord(u, v);
        va.vertex(width, height);
        va.texcoord(u_start, v);
        va.vertex(0.0, height);
        va
    }
}

impl Drawable for FillScreenPatternDrawable {
    fn render(&self, gc: &mut GraphicsContext, mask: RenderMask) {
        let size = gc.size().to_f32();
        let va = self.vertex_array(size.width, size.height);
        gc.push_matrix();
        gc.set_modelview(Matrix4::identity());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::ISize;
    use crate::texture::Texture;
    use std::rc::Rc;

    #[test]
    fn backgrounds_sit_at_the_back() {
        assert_eq!(FillScreenDrawable::new(Color::black()).z_pos(), -1000.0);
        let texture = Rc::new(Texture::detached(ISize::new(8, 8)));
        assert_eq!(FillScreenPatternDrawable::new(texture, Vector2::new(0.0, 0.0)).z_pos(), -1000.0);
    }

    #[test]
    fn pattern_uvs_count_repetitions_shifted_by_the_offset() {
        let texture = Rc::new(Texture::detached(ISize::new(64, 32)));
        let pattern = FillScreenPatternDrawable::new(texture, Vector2::new(16.0, 8.0));
        let va = pattern.vertex_array(640.0, 480.0);
        assert_eq!(va.num_vertices(), 4);
        assert_eq!(&va.texcoords()[0..2], &[-0.25, -0.25]);
        assert_eq!(&va.texcoords()[4..6], &[9.75, 14.75]);
    }
}
