use super::{Drawable, DrawableGroup, DrawableProps, RenderMask};
use crate::graphics_context::GraphicsContext;
use crate::shader::ALPHA_THRESHOLD_OFF;

/// Alpha a stencil mask fragment needs to mark its pixel.
pub const STENCIL_ALPHA_THRESHOLD: f32 = 0.5;

/// Two pass masked rendering: the stencil group marks pixels without touching the color
/// buffer, the drawable group is then only drawn where the mark is as deep as this
/// drawable is nested. Only the opaque parts of textured masks mark pixels.
///
/// Needs a context with a stencil buffer.
#[derive(Default)]
pub struct StencilDrawable {
    props: DrawableProps,
    stencil_group: DrawableGroup,
    drawable_group: DrawableGroup,
}

impl StencilDrawable {
    pub fn new() -> StencilDrawable {
        StencilDrawable::default()
    }

    pub fn stencil_group_mut(&mut self) -> &mut DrawableGroup {
        &mut self.stencil_group
    }

    pub fn drawable_group_mut(&mut self) -> &mut DrawableGroup {
        &mut self.drawable_group
    }

    pub fn stencil_group(&self) -> &DrawableGroup {
        &self.stencil_group
    }

    pub fn drawable_group(&self) -> &DrawableGroup {
        &self.drawable_group
    }
}

impl Drawable for StencilDrawable {
    fn render(&self, gc: &mut GraphicsContext, _mask: RenderMask) {
        gc.stencil_scope(|gc, level| {
            unsafe {
                gl::ColorMask(gl::FALSE, gl::FALSE, gl::FALSE, gl::FALSE);
                gl::StencilFunc(gl::ALWAYS, 1, 1);
                gl::StencilOp(gl::KEEP, gl::KEEP, gl::INCR);
            }
            let shader = gc.current_shader();
            shader.set_alpha_threshold(STENCIL_ALPHA_THRESHOLD);
            self.stencil_group.render(gc, RenderMask::ALL);
            shader.set_alpha_threshold(ALPHA_THRESHOLD_OFF);

            unsafe {
                gl::ColorMask(gl::TRUE, gl::TRUE, gl::TRUE, gl::TRUE);
                gl::StencilFunc(gl::EQUAL, level as i32, level);
                gl::StencilOp(gl::KEEP, gl::KEEP, gl::KEEP);
            }
            self.drawable_group.render(gc, RenderMask::ALL);
        });
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}
