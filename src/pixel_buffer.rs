//! CPU side images, the shape every GPU upload consumes.

use crate::color::Color;
use crate::error::DisplayError;
use crate::geom::{IRect, ISize};
use gl::types::GLenum;
use image::{DynamicImage, GenericImageView};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    RGB8,
    RGBA8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::RGB8 => 3,
            PixelFormat::RGBA8 => 4,
        }
    }

    pub(crate) fn to_gl_format(self) -> GLenum {
        match self {
            PixelFormat::RGB8 => gl::RGB,
            PixelFormat::RGBA8 => gl::RGBA,
        }
    }

    fn to_image_color_type(self) -> image::ColorType {
        match self {
            PixelFormat::RGB8 => image::ColorType::Rgb8,
            PixelFormat::RGBA8 => image::ColorType::Rgba8,
        }
    }
}

/// Rows of pixels, top row first. `pitch` is the byte length of a row and may exceed
/// `width * bytes_per_pixel`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    format: PixelFormat,
    width: i32,
    height: i32,
    pitch: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A fully transparent (or black) buffer with tightly packed rows.
    pub fn new(format: PixelFormat, size: ISize) -> PixelBuffer {
        let width = size.width.max(0);
        let height = size.height.max(0);
        let pitch = width as usize * format.bytes_per_pixel();
        PixelBuffer { format, width, height, pitch, data: vec![0; pitch * height as usize] }
    }

    pub fn filled(format: PixelFormat, size: ISize, color: Color<u8>) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(format, size);
        let bpp = format.bytes_per_pixel();
        let color = color.to_array();
        for px in buffer.data.chunks_exact_mut(bpp) {
            px.copy_from_slice(&color[..bpp]);
        }
        buffer
    }

    /// Wraps raw bytes, checking that `data` really holds `height` rows of `pitch` bytes.
    pub fn from_raw(format: PixelFormat, size: ISize, pitch: usize, data: Vec<u8>) -> Result<PixelBuffer, DisplayError> {
        if size.is_empty() {
            return Err(DisplayError::EmptyImage);
        }
        let row = size.width as usize * format.bytes_per_pixel();
        if pitch < row {
            return Err(DisplayError::InvalidPixelData { expected: row, received: pitch });
        }
        let expected = pitch * (size.height as usize - 1) + row;
        if data.len() < expected {
            return Err(DisplayError::InvalidPixelData { expected, received: data.len() });
        }
        Ok(PixelBuffer { format, width: size.width, height: size.height, pitch, data })
    }

    /// Images with an alpha channel become RGBA8, everything else RGB8.
    pub fn from_image(image: &DynamicImage) -> Result<PixelBuffer, DisplayError> {
        let (width, height) = image.dimensions();
        let size = ISize::new(width as i32, height as i32);
        if image.color().has_alpha() {
            let pitch = width as usize * 4;
            PixelBuffer::from_raw(PixelFormat::RGBA8, size, pitch, image.to_rgba8().into_raw())
        } else {
            let pitch = width as usize * 3;
            PixelBuffer::from_raw(PixelFormat::RGB8, size, pitch, image.to_rgb8().into_raw())
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<PixelBuffer, DisplayError> {
        let image = image::open(path.as_ref())?;
        log::debug!("decoded {} ({}x{})", path.as_ref().display(), image.width(), image.height());
        PixelBuffer::from_image(&image)
    }

    /// Writes the buffer to disk, the format is guessed from the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DisplayError> {
        let packed = self.packed_rows();
        image::save_buffer(
            path.as_ref(),
            &packed,
            self.width as u32,
            self.height as u32,
            self.format.to_image_color_type(),
        )?;
        log::info!("wrote {}", path.as_ref().display());
        Ok(())
    }

    fn packed_rows(&self) -> Vec<u8> {
        let row = self.row_len();
        if row == self.pitch {
            return self.data[..row * self.height as usize].to_vec();
        }
        let mut packed = Vec::with_capacity(row * self.height as usize);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y));
        }
        packed
    }

    #[inline]
    fn row_len(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.pitch + x as usize * self.format.bytes_per_pixel()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> ISize {
        ISize::new(self.width, self.height)
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn row(&self, y: i32) -> &[u8] {
        let start = self.offset(0, y);
        &self.data[start..start + self.row_len()]
    }

    /// Panics when out of bounds. RGB8 pixels read back as opaque.
    pub fn pixel(&self, x: i32, y: i32) -> Color<u8> {
        assert!(x >= 0 && y >= 0 && x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        let o = self.offset(x, y);
        let d = &self.data;
        match self.format {
            PixelFormat::RGB8 => Color::from_rgb(d[o], d[o + 1], d[o + 2]),
            PixelFormat::RGBA8 => Color::from_rgba(d[o], d[o + 1], d[o + 2], d[o + 3]),
        }
    }

    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color<u8>) {
        assert!(x >= 0 && y >= 0 && x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        let o = self.offset(x, y);
        let bpp = self.format.bytes_per_pixel();
        self.data[o..o + bpp].copy_from_slice(&color.to_array()[..bpp]);
    }

    /// Copies the whole buffer into `target` at (x, y), converting the pixel format
    /// if needed. Whatever falls outside of `target` is skipped.
    pub fn blit_to(&self, target: &mut PixelBuffer, x: i32, y: i32) {
        let dst = IRect::from_pos_size(0, 0, target.size()).intersection(&IRect::from_pos_size(x, y, self.size()));
        if dst.is_empty() {
            return;
        }
        if self.format == target.format {
            let bpp = self.format.bytes_per_pixel();
            let len = dst.width() as usize * bpp;
            for ty in dst.top..dst.bottom {
                let src = self.offset(dst.left - x, ty - y);
                let to = target.offset(dst.left, ty);
                target.data[to..to + len].copy_from_slice(&self.data[src..src + len]);
            }
        } else {
            for ty in dst.top..dst.bottom {
                for tx in dst.left..dst.right {
                    target.put_pixel(tx, ty, self.pixel(tx - x, ty - y));
                }
            }
        }
    }

    /// Copy of the area covered by `rect`, clipped to the buffer.
    pub fn sub_image(&self, rect: &IRect) -> PixelBuffer {
        let rect = IRect::from_pos_size(0, 0, self.size()).intersection(rect);
        let mut out = PixelBuffer::new(self.format, rect.size());
        let len = out.row_len();
        for y in 0..out.height {
            let src = self.offset(rect.left, rect.top + y);
            let dst = out.offset(0, y);
            out.data[dst..dst + len].copy_from_slice(&self.data[src..src + len]);
        }
        out
    }

    /// Duplicates the edge pixels of the `width`x`height` area at (x, y) into the one pixel
    /// frame surrounding it, corners included, so bilinear filtering never samples a neighbour.
    ///
    /// The frame has to lie inside the buffer.
    pub fn generate_border(&mut self, x: i32, y: i32, width: i32, height: i32) {
        assert!(
            x >= 1 && y >= 1 && x + width < self.width && y + height < self.height,
            "border around {}x{} at ({}, {}) does not fit in {}x{}",
            width, height, x, y, self.width, self.height
        );
        let bpp = self.format.bytes_per_pixel();
        let len = width as usize * bpp;

        let top = self.offset(x, y);
        let above = self.offset(x, y - 1);
        self.data.copy_within(top..top + len, above);

        let bottom = self.offset(x, y + height - 1);
        let below = self.offset(x, y + height);
        self.data.copy_within(bottom..bottom + len, below);

        for row in (y - 1)..(y + height + 1) {
            let left = self.offset(x - 1, row);
            self.data.copy_within(left + bpp..left + 2 * bpp, left);
            let right = self.offset(x + width, row);
            self.data.copy_within(right - bpp..right, right);
        }
    }

    pub fn flip_vertical(&mut self) {
        let row = self.row_len();
        for y in 0..(self.height / 2) {
            let a = self.offset(0, y);
            let b = self.offset(0, self.height - 1 - y);
            let (head, tail) = self.data.split_at_mut(b);
            head[a..a + row].swap_with_slice(&mut tail[..row]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(size: ISize) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(PixelFormat::RGBA8, size);
        for y in 0..size.height {
            for x in 0..size.width {
                buffer.put_pixel(x, y, Color::from_rgba(x as u8, y as u8, (x * y) as u8, 255));
            }
        }
        buffer
    }

    #[test]
    fn from_raw_checks_length_and_pitch() {
        let size = ISize::new(4, 2);
        assert!(PixelBuffer::from_raw(PixelFormat::RGB8, size, 12, vec![0; 24]).is_ok());
        // the last row doesn't need its padding
        assert!(PixelBuffer::from_raw(PixelFormat::RGB8, size, 16, vec![0; 28]).is_ok());
        match PixelBuffer::from_raw(PixelFormat::RGB8, size, 16, vec![0; 27]) {
            Err(DisplayError::InvalidPixelData { expected: 28, received: 27 }) => {},
            other => panic!("unexpected {:?}", other),
        }
        assert!(PixelBuffer::from_raw(PixelFormat::RGBA8, size, 8, vec![0; 64]).is_err());
        assert!(matches!(
            PixelBuffer::from_raw(PixelFormat::RGBA8, ISize::new(0, 3), 0, vec![]),
            Err(DisplayError::EmptyImage)
        ));
    }

    #[test]
    fn pitch_is_honoured() {
        // 2x2 RGB with 2 bytes of padding per row
        let data = vec![1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        let buffer = PixelBuffer::from_raw(PixelFormat::RGB8, ISize::new(2, 2), 8, data).unwrap();
        assert_eq!(buffer.pixel(1, 1), Color::from_rgb(10, 11, 12));
        assert_eq!(buffer.row(1), &[7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn generate_border_copies_edges_and_corners() {
        let mut buffer = PixelBuffer::new(PixelFormat::RGBA8, ISize::new(6, 5));
        let inner = checker(ISize::new(3, 2));
        inner.blit_to(&mut buffer, 1, 1);
        buffer.generate_border(1, 1, 3, 2);

        for x in 0..3 {
            assert_eq!(buffer.pixel(x + 1, 0), inner.pixel(x, 0));
            assert_eq!(buffer.pixel(x + 1, 3), inner.pixel(x, 1));
        }
        for y in 0..2 {
            assert_eq!(buffer.pixel(0, y + 1), inner.pixel(0, y));
            assert_eq!(buffer.pixel(4, y + 1), inner.pixel(2, y));
        }
        assert_eq!(buffer.pixel(0, 0), inner.pixel(0, 0));
        assert_eq!(buffer.pixel(4, 0), inner.pixel(2, 0));
        assert_eq!(buffer.pixel(0, 3), inner.pixel(0, 1));
        assert_eq!(buffer.pixel(4, 3), inner.pixel(2, 1));
        // untouched outside of the frame
        assert_eq!(buffer.pixel(5, 4), Color::transparent());
    }

    #[test]
    fn blit_converts_and_clips() {
        let red = PixelBuffer::filled(PixelFormat::RGB8, ISize::new(4, 4), Color::from_rgb(255, 0, 0));
        let mut target = PixelBuffer::new(PixelFormat::RGBA8, ISize::new(3, 3));
        red.blit_to(&mut target, 1, -2);
        assert_eq!(target.pixel(0, 0), Color::transparent());
        assert_eq!(target.pixel(1, 0), Color::from_rgba(255, 0, 0, 255));
        assert_eq!(target.pixel(2, 1), Color::from_rgba(255, 0, 0, 255));
        assert_eq!(target.pixel(2, 2), Color::transparent());
    }

    #[test]
    fn sub_image_and_flip() {
        let buffer = checker(ISize::new(5, 4));
        let mut sub = buffer.sub_image(&IRect::new(1, 1, 4, 4));
        assert_eq!(sub.size(), ISize::new(3, 3));
        assert_eq!(sub.pixel(0, 0), buffer.pixel(1, 1));
        sub.flip_vertical();
        assert_eq!(sub.pixel(2, 0), buffer.pixel(3, 3));
        assert_eq!(sub.pixel(2, 1), buffer.pixel(3, 2));
    }

    #[test]
    fn save_and_reload_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let buffer = checker(ISize::new(7, 3));
        buffer.save(&path).unwrap();
        let reloaded = PixelBuffer::from_file(&path).unwrap();
        assert_eq!(reloaded.format(), PixelFormat::RGBA8);
        assert_eq!(reloaded, buffer);
    }
}
