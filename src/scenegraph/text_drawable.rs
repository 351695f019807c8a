use super::{Drawable, DrawableProps, RenderMask};
use crate::color::Color;
use crate::font::TtfFont;
use crate::graphics_context::GraphicsContext;

use cgmath::{Matrix4, Vector2};
use std::rc::Rc;

/// A string drawn with a `TtfFont`, `pos` being the left end of the first baseline.
pub struct TextDrawable {
    props: DrawableProps,
    font: Rc<TtfFont>,
    text: String,
    color: Color<f32>,
}

impl TextDrawable {
    pub fn new<S: Into<String>>(
        font: Rc<TtfFont>,
        text: S,
        pos: Vector2<f32>,
        color: Color<f32>,
        z_pos: f32,
        modelview: Matrix4<f32>,
    ) -> TextDrawable {
        TextDrawable { props: DrawableProps::new(pos, z_pos, modelview), font, text: text.into(), color }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }
}

impl Drawable for TextDrawable {
    fn render(&self, gc: &mut GraphicsContext, _mask: RenderMask) {
        gc.push_matrix();
        gc.mult_matrix(&self.props.modelview);
        self.font.draw(gc, self.props.pos, &self.text, self.color);
        gc.pop_matrix();
    }

    fn props(&self) -> &DrawableProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DrawableProps {
        &mut self.props
    }
}
