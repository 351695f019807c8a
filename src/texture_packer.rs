//! Packs many small images into a few big atlas textures.
//!
//! Every atlas page carries a binary tree of free rectangles (`TextureSpace`). Space is
//! handed out greedily and never given back: a packer only grows.

use crate::error::DisplayError;
use crate::geom::{FRect, IRect, ISize};
use crate::pixel_buffer::PixelBuffer;
use crate::surface::Surface;
use crate::texture::{Texture, TexturePtr};

use std::path::Path;
use std::rc::Rc;

/// Something the packer can place pixels on. The GPU implementation is `TexturePtr`.
pub trait AtlasPage: Clone + Sized {
    fn create(size: ISize) -> Result<Self, DisplayError>;

    fn size(&self) -> ISize;

    /// Copies the `src` area of `image` to (x, y) on this page.
    fn put(&self, image: &PixelBuffer, src: &IRect, x: i32, y: i32) -> Result<(), DisplayError>;
}

impl AtlasPage for TexturePtr {
    fn create(size: ISize) -> Result<TexturePtr, DisplayError> {
        log::info!("creating {}x{} atlas page", size.width, size.height);
        Ok(Rc::new(Texture::create(gl::TEXTURE_2D, size)?))
    }

    fn size(&self) -> ISize {
        Texture::size(self)
    }

    fn put(&self, image: &PixelBuffer, src: &IRect, x: i32, y: i32) -> Result<(), DisplayError> {
        Texture::put(self, image, src, x, y)
    }
}

/// A node of the free space tree. A node without children is unused.
#[derive(Debug)]
struct TextureSpace {
    rect: IRect,
    /// (bottom, right), only present once this node is used
    children: Option<Box<(TextureSpace, TextureSpace)>>,
}

impl TextureSpace {
    fn new(rect: IRect) -> TextureSpace {
        TextureSpace { rect, children: None }
    }

    fn allocate(&mut self, size: ISize) -> Option<IRect> {
        if size.width > self.rect.width() || size.height > self.rect.height() {
            return None;
        }
        match self.children {
            Some(ref mut children) => {
                let (bottom, right) = &mut **children;
                bottom.allocate(size).or_else(|| right.allocate(size))
            },
            None => {
                let rect = self.rect;
                let out = IRect::from_pos_size(rect.left, rect.top, size);
                let bottom = TextureSpace::new(IRect::new(rect.left, out.bottom, rect.right, rect.bottom));
                let right = TextureSpace::new(IRect::new(out.right, out.top, rect.right, out.bottom));
                self.children = Some(Box::new((bottom, right)));
                Some(out)
            },
        }
    }
}

#[derive(Debug)]
struct TexturePackerTexture<P: AtlasPage> {
    page: P,
    space: TextureSpace,
}

impl<P: AtlasPage> TexturePackerTexture<P> {
    fn new(size: ISize) -> Result<TexturePackerTexture<P>, DisplayError> {
        let page = P::create(size)?;
        // the page may be bigger than asked for (power of two rounding), use all of it
        let space = TextureSpace::new(IRect::from_pos_size(0, 0, page.size()));
        Ok(TexturePackerTexture { page, space })
    }
}

/// Where an image ended up: `rect` is the image itself (border excluded), `uv` the same
/// area in [0, 1] page coordinates.
#[derive(Debug, Clone)]
pub struct Placement<P> {
    pub page: P,
    pub rect: IRect,
    pub uv: FRect,
}

#[derive(Debug)]
pub struct TexturePacker<P: AtlasPage = TexturePtr> {
    page_size: ISize,
    pages: Vec<TexturePackerTexture<P>>,
}

impl<P: AtlasPage> TexturePacker<P> {
    pub fn new(page_size: ISize) -> TexturePacker<P> {
        TexturePacker { page_size, pages: Vec::new() }
    }

    pub fn page_size(&self) -> ISize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> impl Iterator<Item = &P> {
        self.pages.iter().map(|p| &p.page)
    }

    /// Reserves `size` pixels on the first page that has room for them, creating a
    /// new page when none has.
    pub fn allocate(&mut self, size: ISize) -> Result<(IRect, P), DisplayError> {
        let failure = DisplayError::AtlasAllocation { requested: size, atlas: self.page_size };
        if size.width > self.page_size.width || size.height > self.page_size.height {
            return Err(failure);
        }
        for p in &mut self.pages {
            if let Some(rect) = p.space.allocate(size) {
                return Ok((rect, p.page.clone()));
            }
        }
        let mut fresh = TexturePackerTexture::<P>::new(self.page_size)?;
        let rect = fresh.space.allocate(size).ok_or(failure)?;
        let page = fresh.page.clone();
        self.pages.push(fresh);
        log::debug!("texture packer now has {} page(s)", self.pages.len());
        Ok((rect, page))
    }

    /// Places `image` with a 1px frame of duplicated edge pixels around it.
    pub fn place(&mut self, image: &PixelBuffer) -> Result<Placement<P>, DisplayError> {
        let (w, h) = (image.width(), image.height());
        if w <= 0 || h <= 0 {
            return Err(DisplayError::EmptyImage);
        }
        let (rect, page) = self.allocate(ISize::new(w + 2, h + 2))?;

        // edges
        page.put(image, &IRect::new(0, 0, w, 1), rect.left + 1, rect.top)?;
        page.put(image, &IRect::new(0, h - 1, w, h), rect.left + 1, rect.bottom - 1)?;
        page.put(image, &IRect::new(0, 0, 1, h), rect.left, rect.top + 1)?;
        page.put(image, &IRect::new(w - 1, 0, w, h), rect.right - 1, rect.top + 1)?;

        // corners
        page.put(image, &IRect::new(0, 0, 1, 1), rect.left, rect.top)?;
        page.put(image, &IRect::new(w - 1, 0, w, 1), rect.right - 1, rect.top)?;
        page.put(image, &IRect::new(w - 1, h - 1, w, h), rect.right - 1, rect.bottom - 1)?;
        page.put(image, &IRect::new(0, h - 1, 1, h), rect.left, rect.bottom - 1)?;

        page.put(image, &IRect::new(0, 0, w, h), rect.left + 1, rect.top + 1)?;

        let interior = IRect::new(rect.left + 1, rect.top + 1, rect.right - 1, rect.bottom - 1);
        let page_size = page.size();
        let uv = FRect::new(
            interior.left as f32 / page_size.width as f32,
            interior.top as f32 / page_size.height as f32,
            interior.right as f32 / page_size.width as f32,
            interior.bottom as f32 / page_size.height as f32,
        );
        log::debug!("packed {}x{} image at {:?}", w, h, interior);
        Ok(Placement { page, rect: interior, uv })
    }
}

impl TexturePacker<TexturePtr> {
    /// Packs `image` and returns a surface showing exactly the image, border excluded.
    pub fn upload(&mut self, image: &PixelBuffer) -> Result<Surface, DisplayError> {
        let placement = self.place(image)?;
        Ok(Surface::new(placement.page, placement.uv, image.size().to_f32()))
    }

    /// Dumps every page to `dir/texture_packerNNNN.png`, for debugging.
    pub fn save_all_as_png<D: AsRef<Path>>(&self, dir: D) -> Result<(), DisplayError> {
        for (i, texture) in self.pages().enumerate() {
            let filename = dir.as_ref().join(format!("texture_packer{:04}.png", i));
            texture.to_pixel_buffer()?.save(&filename)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::pixel_buffer::PixelFormat;
    use std::cell::RefCell;

    type MemoryPage = Rc<RefCell<PixelBuffer>>;

    impl AtlasPage for MemoryPage {
        fn create(size: ISize) -> Result<MemoryPage, DisplayError> {
            Ok(Rc::new(RefCell::new(PixelBuffer::new(PixelFormat::RGBA8, size))))
        }

        fn size(&self) -> ISize {
            self.borrow().size()
        }

        fn put(&self, image: &PixelBuffer, src: &IRect, x: i32, y: i32) -> Result<(), DisplayError> {
            image.sub_image(src).blit_to(&mut self.borrow_mut(), x, y);
            Ok(())
        }
    }

    /// tiny deterministic generator, enough to shuffle sizes around
    struct Lcg(u32);

    impl Lcg {
        fn next(&mut self, max: i32) -> i32 {
            self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12345);
            1 + ((self.0 >> 16) as i32 % max)
        }
    }

    #[test]
    fn space_splits_bottom_first() {
        let mut space = TextureSpace::new(IRect::new(0, 0, 100, 100));
        assert_eq!(space.allocate(ISize::new(30, 20)), Some(IRect::new(0, 0, 30, 20)));
        // the bottom region spans the whole width, so a wide request lands there
        assert_eq!(space.allocate(ISize::new(100, 10)), Some(IRect::new(0, 20, 100, 30)));
        assert_eq!(space.allocate(ISize::new(10, 25)), Some(IRect::new(0, 30, 10, 55)));
        assert_eq!(space.allocate(ISize::new(101, 1)), None);

        let mut space = TextureSpace::new(IRect::new(0, 0, 100, 100));
        space.allocate(ISize::new(30, 90)).unwrap();
        // 10px left below, so this one goes right, limited to the 90px row
        assert_eq!(space.allocate(ISize::new(20, 20)), Some(IRect::new(30, 0, 50, 20)));
        assert_eq!(space.allocate(ISize::new(70, 91)), None);
    }

    #[test]
    fn allocations_never_overlap() {
        let mut packer = TexturePacker::<MemoryPage>::new(ISize::new(256, 256));
        let mut rng = Lcg(7);
        let mut placed: Vec<(IRect, MemoryPage)> = Vec::new();
        for _ in 0..400 {
            let size = ISize::new(rng.next(60), rng.next(60));
            let (rect, page) = packer.allocate(size).unwrap();
            assert_eq!(rect.size(), size);
            assert!(IRect::new(0, 0, 256, 256).contains_rect(&rect));
            for (other, other_page) in &placed {
                if Rc::ptr_eq(other_page, &page) {
                    assert!(!rect.overlaps(other), "{:?} overlaps {:?}", rect, other);
                }
            }
            placed.push((rect, page));
        }
        assert!(packer.page_count() > 1);
    }

    #[test]
    fn oversized_request_fails_without_creating_a_page() {
        let mut packer = TexturePacker::<MemoryPage>::new(ISize::new(64, 64));
        match packer.allocate(ISize::new(65, 10)) {
            Err(DisplayError::AtlasAllocation { requested, atlas }) => {
                assert_eq!(requested, ISize::new(65, 10));
                assert_eq!(atlas, ISize::new(64, 64));
            },
            other => panic!("unexpected {:?}", other.map(|(r, _)| r)),
        }
        assert_eq!(packer.page_count(), 0);
        // 62 + 2 px of border still fits exactly
        let image = PixelBuffer::new(PixelFormat::RGBA8, ISize::new(62, 62));
        assert!(packer.place(&image).is_ok());
        let image = PixelBuffer::new(PixelFormat::RGBA8, ISize::new(63, 1));
        assert!(packer.place(&image).is_err());
    }

    #[test]
    fn border_duplicates_edge_pixels() {
        let mut image = PixelBuffer::new(PixelFormat::RGBA8, ISize::new(4, 3));
        for y in 0..3 {
            for x in 0..4 {
                image.put_pixel(x, y, Color::from_rgba(10 * x as u8, 10 * y as u8, 7, 255));
            }
        }
        let mut packer = TexturePacker::<MemoryPage>::new(ISize::new(32, 32));
        // push the image away from the page origin
        packer.allocate(ISize::new(5, 5)).unwrap();
        let Placement { page, rect, .. } = packer.place(&image).unwrap();
        let page = page.borrow();
        let (l, t, r, b) = (rect.left, rect.top, rect.right, rect.bottom);

        for x in 0..4 {
            assert_eq!(page.pixel(l + x, t - 1), image.pixel(x, 0));
            assert_eq!(page.pixel(l + x, b), image.pixel(x, 2));
        }
        for y in 0..3 {
            assert_eq!(page.pixel(l - 1, t + y), image.pixel(0, y));
            assert_eq!(page.pixel(r, t + y), image.pixel(3, y));
        }
        assert_eq!(page.pixel(l - 1, t - 1), image.pixel(0, 0));
        assert_eq!(page.pixel(r, t - 1), image.pixel(3, 0));
        assert_eq!(page.pixel(r, b), image.pixel(3, 2));
        assert_eq!(page.pixel(l - 1, b), image.pixel(0, 2));
    }

    #[test]
    fn uv_covers_only_the_image() {
        let mut packer = TexturePacker::<MemoryPage>::new(ISize::new(128, 64));
        for &(w, h) in &[(1, 1), (3, 17), (40, 2)] {
            let image = PixelBuffer::new(PixelFormat::RGB8, ISize::new(w, h));
            let placement = packer.place(&image).unwrap();
            let uv = placement.uv;
            assert_eq!(placement.rect.size(), ISize::new(w, h));
            assert!((uv.width() * 128.0 - w as f32).abs() < 1e-3);
            assert!((uv.height() * 64.0 - h as f32).abs() < 1e-3);
            assert!((uv.left * 128.0 - placement.rect.left as f32).abs() < 1e-3);
            assert!((uv.top * 64.0 - placement.rect.top as f32).abs() < 1e-3);
            assert!(placement.rect.left >= 1 && placement.rect.top >= 1);
        }
    }

    #[test]
    fn red_square_in_fresh_atlas() {
        let red = Color::from_rgba(255, 0, 0, 255);
        let image = PixelBuffer::filled(PixelFormat::RGBA8, ISize::new(10, 10), red);
        let mut packer = TexturePacker::<MemoryPage>::new(ISize::new(256, 256));
        let placement = packer.place(&image).unwrap();

        assert_eq!(packer.page_count(), 1);
        assert_eq!(placement.rect.size(), ISize::new(10, 10));
        assert!(IRect::new(0, 0, 256, 256).contains_rect(&placement.rect));
        let area = placement.uv.width() * placement.uv.height();
        assert!((area - (10.0f32 / 256.0).powi(2)).abs() < 1e-7);
        let page = placement.page.borrow();
        assert_eq!(page.pixel(placement.rect.left, placement.rect.top), red);
    }
}
