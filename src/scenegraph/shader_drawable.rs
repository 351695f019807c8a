use super::{Drawable, DrawableGroup, DrawableProps, RenderMask};
use crate::graphics_context::GraphicsContext;
use crate::shader::ShaderProgramPtr;

/// Renders its children with `program` instead of the current shader, unless a child
/// brings its own.
pub struct ShaderDrawable {
    props: DrawableProps,
    program: ShaderProgramPtr,
    drawables: DrawableGroup,
}

impl ShaderDrawable {
    pub fn new(program: ShaderProgramPtr) -> ShaderDrawable {
        ShaderDrawable { props: DrawableProps::default(), program, drawables: DrawableGroup::new() }
    }

    pub fn program(&self) -> &ShaderProgramPtr {
        &self.program
    }

    pub fn set_program(&mut self, program: ShaderProgramPtr) {
        self.program = program;
    }

    pub fn group(&self) -> &DrawableGroup {
        &self.drawables
    }

    pub fn group_mut(&mut self) -> &mut DrawableGroup {
        &mut self.drawables
    }
}

impl Drawable for ShaderDrawable {
    fn render(&self, gc: &mut GraphicsContext, mask: RenderMask) {
        gc.push_shader(self.program.clone());
        self.drawables.render(gc, mask);
        gc.pop_shader();
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}
