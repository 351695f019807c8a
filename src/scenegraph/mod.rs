//! Retained drawing: drawables carry their own position, depth and modelview snapshot,
//! and are rendered later, possibly many times, against a `GraphicsContext`.

mod drawable_group;
mod fill_screen;
mod scissor_drawable;
mod shader_drawable;
mod stencil_drawable;
mod surface_drawable;
mod text_drawable;
mod vertex_array_drawable;

pub use self::drawable_group::{DrawableGroup, SceneGraph};
pub use self::fill_screen::{FillScreenDrawable, FillScreenPatternDrawable};
pub use self::scissor_drawable::ScissorDrawable;
pub use self::shader_drawable::ShaderDrawable;
pub use self::stencil_drawable::StencilDrawable;
pub use self::surface_drawable::{ControlDrawable, SurfaceDrawable, SurfaceQuadDrawable};
pub use self::text_drawable::TextDrawable;
pub use self::vertex_array_drawable::VertexArrayDrawable;

use crate::graphics_context::GraphicsContext;

use cgmath::{Matrix4, SquareMatrix, Vector2};
use std::ops::{BitAnd, BitOr};

/// Selects which drawables take part in a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderMask(pub u32);

impl RenderMask {
    pub const ALL: RenderMask = RenderMask(!0);
    pub const DEFAULT: RenderMask = RenderMask(1);
    pub const NONE: RenderMask = RenderMask(0);

    pub fn intersects(self, other: RenderMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for RenderMask {
    fn default() -> RenderMask {
        RenderMask::DEFAULT
    }
}

impl BitAnd for RenderMask {
    type Output = RenderMask;

    fn bitand(self, rhs: RenderMask) -> RenderMask {
        RenderMask(self.0 & rhs.0)
    }
}

impl BitOr for RenderMask {
    type Output = RenderMask;

    fn bitor(self, rhs: RenderMask) -> RenderMask {
        RenderMask(self.0 | rhs.0)
    }
}

/// What every drawable has in common.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableProps {
    pub pos: Vector2<f32>,
    pub z_pos: f32,
    /// Captured when the drawable was submitted, never recomputed.
    pub modelview: Matrix4<f32>,
    pub render_mask: RenderMask,
}

impl Default for DrawableProps {
    fn default() -> DrawableProps {
        DrawableProps {
            pos: Vector2::new(0.0, 0.0),
            z_pos: 0.0,
            modelview: Matrix4::identity(),
            render_mask: RenderMask::DEFAULT,
        }
    }
}

impl DrawableProps {
    pub fn new(pos: Vector2<f32>, z_pos: f32, modelview: Matrix4<f32>) -> DrawableProps {
        DrawableProps { pos, z_pos, modelview, render_mask: RenderMask::DEFAULT }
    }

    pub fn at_depth(z_pos: f32) -> DrawableProps {
        DrawableProps { z_pos, ..DrawableProps::default() }
    }

    pub fn with_render_mask(mut self, mask: RenderMask) -> DrawableProps {
        self.render_mask = mask;
        self
    }
}

/// Anything that can put itself on screen through a `GraphicsContext`.
///
/// `mask` is the pass being rendered, groups only descend into children whose own mask
/// intersects it.
pub trait Drawable {
    fn render(&self, gc: &mut GraphicsContext, mask: RenderMask);

    fn props(&self) -> &DrawableProps;

    fn props_mut(&mut self) -> &mut DrawableProps;

    fn z_pos(&self) -> f32 {
        self.props().z_pos
    }

    fn render_mask(&self) -> RenderMask {
        self.props().render_mask
    }

    fn set_render_mask(&mut self, mask: RenderMask) {
        self.props_mut().render_mask = mask;
    }

    fn set_pos(&mut self, pos: Vector2<f32>) {
        self.props_mut().pos = pos;
    }
}

#[cfg(test)]
pub (crate) mod tests {
    use super::*;

    /// Does nothing when rendered, `pos.x` serves as its name.
    pub struct Probe {
        props: DrawableProps,
    }

    impl Probe {
        pub fn new(id: f32, z_pos: f32) -> Probe {
            Probe { props: DrawableProps { pos: Vector2::new(id, 0.0), ..DrawableProps::at_depth(z_pos) } }
        }

        pub fn masked(id: f32, mask: RenderMask) -> Probe {
            let mut probe = Probe::new(id, 0.0);
            probe.set_render_mask(mask);
            probe
        }
    }

    impl Drawable for Probe {
        fn render(&self, _gc: &mut GraphicsContext, _mask: RenderMask) {}

        fn props(&self) -> &DrawableProps {
            &self.props
        }

        fn props_mut(&mut self) -> &mut DrawableProps {
            &mut self.props
        }
    }

    pub fn id_of(drawable: &dyn Drawable) -> f32 {
        drawable.props().pos.x
    }

    #[test]
    fn masks_intersect() {
        assert!(RenderMask::ALL.intersects(RenderMask::DEFAULT));
        assert!(!RenderMask(0b10).intersects(RenderMask(0b01)));
        assert_eq!(RenderMask(0b110) & RenderMask(0b011), RenderMask(0b010));
        assert_eq!(DrawableProps::default().render_mask, RenderMask(1));
    }
}
