use super::{Drawable, DrawableGroup, DrawableProps, RenderMask};
use crate::geom::IRect;
use crate::graphics_context::GraphicsContext;

/// Renders its children clipped to `cliprect` (itself cut down to any enclosing one).
pub struct ScissorDrawable {
    props: DrawableProps,
    cliprect: IRect,
    drawables: DrawableGroup,
}

impl ScissorDrawable {
    pub fn new(cliprect: IRect) -> ScissorDrawable {
        ScissorDrawable { props: DrawableProps::default(), cliprect, drawables: DrawableGroup::new() }
    }

    pub fn cliprect(&self) -> IRect {
        self.cliprect
    }

    pub fn set_cliprect(&mut self, cliprect: IRect) {
        self.cliprect = cliprect;
    }

    pub fn group(&self) -> &DrawableGroup {
        &self.drawables
    }

    pub fn group_mut(&mut self) -> &mut DrawableGroup {
        &mut self.drawables
    }
}

impl Drawable for ScissorDrawable {
    fn render(&self, gc: &mut GraphicsContext, mask: RenderMask) {
        gc.push_cliprect(self.cliprect);
        self.drawables.render(gc, mask);
        gc.pop_cliprect();
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}
