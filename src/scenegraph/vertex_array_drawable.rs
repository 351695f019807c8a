use super::{Drawable, DrawableProps, RenderMask};
use crate::color::Color;
use crate::debug_assert_gl;
use crate::geom::FRect;
use crate::graphics_context::GraphicsContext;
use crate::shader::{ShaderProgramPtr, UNIFORM_DIFFUSE_TEXTURE, UNIFORM_MVP};
use crate::texture::TexturePtr;

use cgmath::{Matrix4, Vector2, Vector3};
use gl::types::*;
use smallvec::SmallVec;
use std::ptr;

/// Vertex, color, texcoord and index streams drawn with a single GL call.
///
/// Colors and texcoords are optional: an empty stream becomes a constant (opaque white,
/// uv (0, 0)). Otherwise every stream needs one entry per vertex.
#[derive(Debug, Clone)]
pub struct VertexArrayDrawable {
    props: DrawableProps,
    program: Option<ShaderProgramPtr>,
    mode: GLenum,
    blend_sfactor: GLenum,
    blend_dfactor: GLenum,
    depth_test: bool,
    textures: SmallVec<[(u32, TexturePtr); 2]>,
    colors: Vec<f32>,
    texcoords: Vec<f32>,
    vertices: Vec<f32>,
    indices: Vec<u16>,
}

impl Default for VertexArrayDrawable {
    fn default() -> VertexArrayDrawable {
        VertexArrayDrawable::new()
    }
}

impl VertexArrayDrawable {
    pub fn new() -> VertexArrayDrawable {
        VertexArrayDrawable::with_props(DrawableProps::default())
    }

    pub fn with_props(props: DrawableProps) -> VertexArrayDrawable {
        VertexArrayDrawable {
            props,
            program: None,
            mode: gl::TRIANGLES,
            blend_sfactor: gl::ONE,
            blend_dfactor: gl::ZERO,
            depth_test: false,
            textures: SmallVec::new(),
            colors: Vec::new(),
            texcoords: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn vertex(&mut self, x: f32, y: f32) {
        self.vertex3(x, y, 0.0);
    }

    pub fn vertex3(&mut self, x: f32, y: f32, z: f32) {
        self.vertices.extend_from_slice(&[x, y, z]);
    }

    pub fn vertex_at(&mut self, p: Vector2<f32>) {
        self.vertex3(p.x, p.y, 0.0);
    }

    pub fn texcoord(&mut self, u: f32, v: f32) {
        self.texcoords.extend_from_slice(&[u, v]);
    }

    pub fn color(&mut self, color: Color<f32>) {
        self.colors.extend_from_slice(&color.to_array());
    }

    /// xyz triples.
    pub fn add_vertices(&mut self, data: &[f32]) {
        debug_assert!(data.len() % 3 == 0);
        self.vertices.extend_from_slice(data);
    }

    pub fn add_texcoords(&mut self, data: &[f32]) {
        self.texcoords.extend_from_slice(data);
    }

    pub fn add_indices(&mut self, data: &[u16]) {
        self.indices.extend_from_slice(data);
    }

    /// Four texcoords, clockwise around `uv` starting at its top left corner.
    pub fn add_texcoords_from_rect(&mut self, uv: &FRect) {
        self.texcoords.extend_from_slice(&[
            uv.left, uv.top,
            uv.right, uv.top,
            uv.right, uv.bottom,
            uv.left, uv.bottom,
        ]);
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn texcoords(&self) -> &[f32] {
        &self.texcoords
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Position of vertex `i`, z dropped.
    pub fn vertex_xy(&self, i: usize) -> Vector2<f32> {
        Vector2::new(self.vertices[3 * i], self.vertices[3 * i + 1])
    }

    pub fn clear(&mut self) {
        self.colors.clear();
        self.texcoords.clear();
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn set_program(&mut self, program: ShaderProgramPtr) {
        self.program = Some(program);
    }

    pub fn mode(&self) -> GLenum {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GLenum) {
        self.mode = mode;
    }

    pub fn set_texture(&mut self, texture: TexturePtr) {
        self.set_texture_unit(0, texture);
    }

    pub fn set_texture_unit(&mut self, unit: u32, texture: TexturePtr) {
        self.textures.retain(|(u, _)| *u != unit);
        self.textures.push((unit, texture));
    }

    pub fn texture(&self, unit: u32) -> Option<&TexturePtr> {
        self.textures.iter().find(|(u, _)| *u == unit).map(|(_, t)| t)
    }

    pub fn blend_func(&self) -> (GLenum, GLenum) {
        (self.blend_sfactor, self.blend_dfactor)
    }

    pub fn set_blend_func(&mut self, sfactor: GLenum, dfactor: GLenum) {
        self.blend_sfactor = sfactor;
        self.blend_dfactor = dfactor;
    }

    pub fn set_depth_test(&mut self, depth_test: bool) {
        self.depth_test = depth_test;
    }
}

impl Drawable for VertexArrayDrawable {
    fn render(&self, gc: &mut GraphicsContext, _mask: RenderMask) {
        if self.vertices.is_empty() {
            return;
        }
        debug_assert!(self.colors.is_empty() || self.colors.len() / 4 == self.num_vertices());
        debug_assert!(self.texcoords.is_empty() || self.texcoords.len() / 2 == self.num_vertices());

        let program = match self.program {
            Some(ref program) => program.clone(),
            None => gc.current_shader(),
        };
        let pos = self.props.pos;
        let mvp = gc.projection()
            * gc.modelview()
            * self.props.modelview
            * Matrix4::from_translation(Vector3::new(pos.x, pos.y, 0.0));

        program.use_program();
        program.set_uniform_matrix4(UNIFORM_MVP, &mvp);
        program.set_uniform_1i(UNIFORM_DIFFUSE_TEXTURE, 0);

        if self.texture(0).is_none() {
            gc.white_texture().bind(0);
        }
        for (unit, texture) in &self.textures {
            texture.bind(*unit);
        }

        unsafe {
            gl::Enable(gl::BLEND);
            gl::BlendFunc(self.blend_sfactor, self.blend_dfactor);
            if self.depth_test {
                gl::Enable(gl::DEPTH_TEST);
            } else {
                gl::Disable(gl::DEPTH_TEST);
            }
        }

        let va = gc.vertex_arrays();
        va.bind();
        va.set_positions(&self.vertices);
        va.set_texcoords(&self.texcoords);
        va.set_colors(&self.colors);

        unsafe {
            if self.indices.is_empty() {
                gl::DrawArrays(self.mode, 0, self.num_vertices() as GLsizei);
            } else {
                va.set_indices(&self.indices);
                gl::DrawElements(self.mode, self.indices.len() as GLsizei, gl::UNSIGNED_SHORT, ptr::null());
            }
            gl::Disable(gl::DEPTH_TEST);
            gl::ActiveTexture(gl::TEXTURE0);
        }
        va.unbind();
        debug_assert_gl!("rendering vertex array");
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

    #[test]
    fn indexed_quad_from_raw_streams() {
        let mut va = VertexArrayDrawable::new();
        va.add_vertices(&[
            0.0, 0.0, 0.0,
            10.0, 0.0, 0.0,
            10.0, 20.0, 0.0,
            0.0, 20.0, 0.0,
        ]);
        va.add_texcoords_from_rect(&FRect::new(0.0, 0.0, 1.0, 1.0));
        va.add_indices(&[0, 1, 2, 2, 3, 0]);
        assert_eq!(va.num_vertices(), 4);
        assert_eq!(va.vertex_xy(2), Vector2::new(10.0, 20.0));
        assert_eq!(va.indices(), &[0, 1, 2, 2, 3, 0]);
        assert_eq!(va.mode(), gl::TRIANGLES);

        va.clear();
        assert_eq!(va.num_vertices(), 0);
        assert!(va.indices().is_empty());
        assert!(va.texcoords().is_empty());
    }
}
