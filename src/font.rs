use crate::color::Color;
use crate::error::DisplayError;
use crate::geom::ISize;
use crate::graphics_context::GraphicsContext;
use crate::pixel_buffer::{PixelBuffer, PixelFormat};
use crate::surface::{Surface, SurfaceDrawingParameters};
use crate::texture_packer::TexturePacker;

use cgmath::Vector2;
use hashbrown::HashMap;
use rusttype::{point, Font, Scale};
use std::cell::RefCell;
use std::path::Path;

#[derive(Debug, Clone)]
struct Glyph {
    /// `None` for glyphs without pixels, like space.
    surface: Option<Surface>,
    /// Top left of the bitmap relative to the pen on the baseline.
    offset: Vector2<f32>,
    advance: f32,
}

/// A TrueType font rendered at one pixel size.
///
/// Glyphs are rasterized on first use into atlas pages owned by the font, printable
/// ASCII right away.
pub struct TtfFont {
    font: Font<'static>,
    scale: Scale,
    pixel_size: f32,
    packer: RefCell<TexturePacker>,
    glyphs: RefCell<HashMap<char, Glyph>>,
}

impl TtfFont {
    pub fn from_file<P: AsRef<Path>>(path: P, pixel_size: f32, atlas_size: ISize) -> Result<TtfFont, DisplayError> {
        let data = std::fs::read(path.as_ref())?;
        log::debug!("loading font {} at {}px", path.as_ref().display(), pixel_size);
        TtfFont::from_bytes(data, pixel_size, atlas_size)
    }

    pub fn from_bytes(data: Vec<u8>, pixel_size: f32, atlas_size: ISize) -> Result<TtfFont, DisplayError> {
        let font = Font::try_from_vec(data)
            .ok_or_else(|| DisplayError::Font(String::from("not a TrueType or OpenType font")))?;
        let ttf = TtfFont {
            font,
            scale: Scale::uniform(pixel_size),
            pixel_size,
            packer: RefCell::new(TexturePacker::new(atlas_size)),
            glyphs: RefCell::new(HashMap::new()),
        };
        for c in (32u8..127).map(char::from) {
            ttf.glyph(c)?;
        }
        log::info!("font ready at {}px, {} atlas page(s)", pixel_size, ttf.packer.borrow().page_count());
        Ok(ttf)
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    /// Distance between two baselines.
    pub fn line_height(&self) -> f32 {
        let v = self.font.v_metrics(self.scale);
        v.ascent - v.descent + v.line_gap
    }

    pub fn kerning(&self, first: char, second: char) -> f32 {
        self.font.pair_kerning(self.scale, first, second)
    }

    fn rasterize(&self, c: char) -> Result<Glyph, DisplayError> {
        let scaled = self.font.glyph(c).scaled(self.scale);
        let advance = scaled.h_metrics().advance_width;
        let positioned = scaled.positioned(point(0.0, 0.0));
        let bb = match positioned.pixel_bounding_box() {
            Some(bb) => bb,
            None => return Ok(Glyph { surface: None, offset: Vector2::new(0.0, 0.0), advance }),
        };

        let mut image = PixelBuffer::filled(
            PixelFormat::RGBA8,
            ISize::new(bb.width(), bb.height()),
            Color::from_rgba(255, 255, 255, 0),
        );
        positioned.draw(|x, y, coverage| {
            let alpha = (coverage * 255.0).round().min(255.0) as u8;
            image.put_pixel(x as i32, y as i32, Color::from_rgba(255, 255, 255, alpha));
        });
        let surface = self.packer.borrow_mut().upload(&image)?;
        Ok(Glyph {
            surface: Some(surface),
            offset: Vector2::new(bb.min.x as f32, bb.min.y as f32),
            advance,
        })
    }

    fn glyph(&self, c: char) -> Result<Glyph, DisplayError> {
        if let Some(glyph) = self.glyphs.borrow().get(&c) {
            return Ok(glyph.clone());
        }
        let glyph = self.rasterize(c)?;
        self.glyphs.borrow_mut().insert(c, glyph.clone());
        Ok(glyph)
    }

    fn advance(&self, c: char) -> f32 {
        match self.glyph(c) {
            Ok(glyph) => glyph.advance,
            Err(e) => {
                log::warn!("no glyph for {:?}: {}", c, e);
                0.0
            },
        }
    }

    /// Width of the widest line of `text`.
    pub fn text_width(&self, text: &str) -> f32 {
        let (_, width) = layout(text, self.line_height(), |c| self.advance(c), |a, b| self.kerning(a, b));
        width
    }

    /// Draws `text` with the first baseline starting at `pos`, one line per `\n`.
    pub fn draw(&self, gc: &mut GraphicsContext, pos: Vector2<f32>, text: &str, color: Color<f32>) {
        let (pens, _) = layout(text, self.line_height(), |c| self.advance(c), |a, b| self.kerning(a, b));
        for (c, pen) in pens {
            // every char went through `advance` during layout, so it is cached
            let glyph = match self.glyphs.borrow().get(&c) {
                Some(glyph) => glyph.clone(),
                None => continue,
            };
            if let Some(surface) = glyph.surface {
                let params = SurfaceDrawingParameters::default()
                    .with_pos(pos + pen + glyph.offset)
                    .with_color(color);
                surface.draw_with(gc, &params);
            }
        }
    }
}

/// Pen position of every char of `text` relative to the first baseline, and the width
/// of the widest line.
fn layout<A, K>(text: &str, line_height: f32, mut advance: A, mut kerning: K) -> (Vec<(char, Vector2<f32>)>, f32)
where
    A: FnMut(char) -> f32,
    K: FnMut(char, char) -> f32,
{
    let mut pens = Vec::with_capacity(text.len());
    let mut pen = Vector2::new(0.0, 0.0);
    let mut width: f32 = 0.0;
    let mut previous = None;
    for c in text.chars() {
        if c == '\n' {
            pen = Vector2::new(0.0, pen.y + line_height);
            previous = None;
            continue;
        }
        if let Some(p) = previous {
            pen.x += kerning(p, c);
        }
        pens.push((c, pen));
        pen.x += advance(c);
        width = width.max(pen.x);
        previous = Some(c);
    }
    (pens, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(text: &str) -> (Vec<(char, Vector2<f32>)>, f32) {
        // 10px per char, "AV" pulled together by 2px
        layout(text, 20.0, |_| 10.0, |a, b| if (a, b) == ('A', 'V') { -2.0 } else { 0.0 })
    }

    #[test]
    fn layout_applies_kerning_between_pairs() {
        let (pens, width) = fixed("AVA");
        assert_eq!(pens[1], ('V', Vector2::new(8.0, 0.0)));
        assert_eq!(pens[2], ('A', Vector2::new(18.0, 0.0)));
        assert_eq!(width, 28.0);
    }

    #[test]
    fn newlines_start_a_new_line() {
        let (pens, width) = fixed("abc\nA\nV");
        assert_eq!(pens.len(), 5);
        assert_eq!(pens[3], ('A', Vector2::new(0.0, 20.0)));
        // no kerning across lines
        assert_eq!(pens[4], ('V', Vector2::new(0.0, 40.0)));
        assert_eq!(width, 30.0);
    }

    #[test]
    fn garbage_is_not_a_font() {
        match TtfFont::from_bytes(vec![0, 1, 2, 3], 12.0, ISize::new(256, 256)) {
            Err(DisplayError::Font(_)) => {},
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("garbage accepted as a font"),
        }
    }
}
