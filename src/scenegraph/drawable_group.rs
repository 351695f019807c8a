use super::{Drawable, DrawableProps, RenderMask};
use crate::graphics_context::GraphicsContext;

use std::rc::Rc;

/// An ordered list of shared drawables, itself a drawable.
#[derive(Default)]
pub struct DrawableGroup {
    props: DrawableProps,
    drawables: Vec<Rc<dyn Drawable>>,
}

impl DrawableGroup {
    pub fn new() -> DrawableGroup {
        DrawableGroup::default()
    }

    pub fn add_drawable(&mut self, drawable: Rc<dyn Drawable>) {
        self.drawables.push(drawable);
    }

    /// Removes every occurence of this very drawable (compared by identity).
    pub fn remove_drawable(&mut self, drawable: &Rc<dyn Drawable>) {
        self.drawables.retain(|d| !Rc::ptr_eq(d, drawable));
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

    /// Children taking part in a `mask` pass, in insertion order.
    pub fn visible(&self, mask: RenderMask) -> impl Iterator<Item = &Rc<dyn Drawable>> {
        self.drawables.iter().filter(move |d| d.render_mask().intersects(mask))
    }
}

impl Drawable for DrawableGroup {
    fn render(&self, gc: &mut GraphicsContext, mask: RenderMask) {
        for drawable in self.visible(mask) {
            drawable.render(gc, mask);
        }
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}

/// The root of a retained scene.
#[derive(Default)]
pub struct SceneGraph {
    drawables: DrawableGroup,
}

impl SceneGraph {
    pub fn new() -> SceneGraph {
        SceneGraph::default()
    }

    pub fn add_drawable(&mut self, drawable: Rc<dyn Drawable>) {
        self.drawables.add_drawable(drawable);
    }

    pub fn remove_drawable(&mut self, drawable: &Rc<dyn Drawable>) {
        self.drawables.remove_drawable(drawable);
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

    pub fn root(&self) -> &DrawableGroup {
        &self.drawables
    }

    pub fn render(&self, gc: &mut GraphicsContext, mask: RenderMask) {
        self.drawables.render(gc, mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenegraph::tests::{id_of, Probe};

    #[test]
    fn visible_children_follow_the_mask() {
        let mut group = DrawableGroup::new();
        group.add_drawable(Rc::new(Probe::masked(1.0, RenderMask(0b01))));
        group.add_drawable(Rc::new(Probe::masked(2.0, RenderMask(0b10))));
        group.add_drawable(Rc::new(Probe::masked(3.0, RenderMask(0b11))));

        let ids = |mask| group.visible(mask).map(|d| id_of(&**d)).collect::<Vec<_>>();
        assert_eq!(ids(RenderMask(0b01)), vec![1.0, 3.0]);
        assert_eq!(ids(RenderMask(0b10)), vec![2.0, 3.0]);
        assert_eq!(ids(RenderMask::ALL), vec![1.0, 2.0, 3.0]);
        assert!(ids(RenderMask::NONE).is_empty());
    }

    #[test]
    fn remove_by_identity() {
        let a: Rc<dyn Drawable> = Rc::new(Probe::new(1.0, 0.0));
        let twin: Rc<dyn Drawable> = Rc::new(Probe::new(1.0, 0.0));
        let mut scene = SceneGraph::new();
        scene.add_drawable(a.clone());
        scene.add_drawable(twin.clone());
        scene.add_drawable(a.clone());
        assert_eq!(scene.len(), 3);

        scene.remove_drawable(&a);
        assert_eq!(scene.len(), 1);
        assert!(Rc::ptr_eq(scene.root().visible(RenderMask::ALL).next().unwrap(), &twin));
        scene.clear();
        assert!(scene.is_empty());
    }
}
