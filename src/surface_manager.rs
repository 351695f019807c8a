use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::geom::{FRect, ISize};
use crate::gl_utils::{capabilities, ceil_power_of_two};
use crate::pixel_buffer::{PixelBuffer, PixelFormat};
use crate::surface::{Surface, SurfacePtr};
use crate::texture::{Texture, TexturePtr};
use crate::texture_packer::TexturePacker;

use hashbrown::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Loads images from disk as surfaces, once per path.
///
/// Images go into the texture packer when one is in use, otherwise each gets a texture
/// of its own (padded to a power of two if the GPU needs it).
pub struct SurfaceManager {
    packer: Option<TexturePacker>,
    surfaces: HashMap<PathBuf, SurfacePtr>,
    fallback_image: Option<PathBuf>,
}

impl SurfaceManager {
    /// Needs a current GL context, to find out whether the packer is needed.
    pub fn new(config: &DisplayConfig) -> SurfaceManager {
        let packer = if config.packer_mode.use_packer(&capabilities()) {
            log::info!("packing surfaces into {}x{} atlas textures", config.atlas_size.width, config.atlas_size.height);
            Some(TexturePacker::new(config.atlas_size))
        } else {
            None
        };
        SurfaceManager { packer, surfaces: HashMap::new(), fallback_image: config.fallback_image.clone() }
    }

    /// The cached surface for `path`, loading it on first use.
    ///
    /// When decoding fails and a fallback image is configured, the fallback is returned
    /// instead.
    pub fn get<P: AsRef<Path>>(&mut self, path: P) -> Result<SurfacePtr, DisplayError> {
        let path = path.as_ref();
        if let Some(surface) = self.surfaces.get(path) {
            log::debug!("surface cache hit: {}", path.display());
            return Ok(surface.clone());
        }
        log::debug!("surface cache miss: {}", path.display());
        let image = match PixelBuffer::from_file(path) {
            Ok(image) => image,
            Err(e) => return self.fallback(path, e),
        };
        let surface = Rc::new(self.upload(&image)?);
        self.surfaces.insert(path.to_owned(), surface.clone());
        Ok(surface)
    }

    fn fallback(&mut self, path: &Path, e: DisplayError) -> Result<SurfacePtr, DisplayError> {
        match self.fallback_image.clone() {
            Some(ref fallback) if fallback.as_path() != path => {
                log::warn!("couldn't load {}: {}, using {}", path.display(), e, fallback.display());
                self.get(fallback)
            },
            _ => Err(e),
        }
    }

    /// Turns an already decoded image into a surface, without caching it.
    pub fn upload(&mut self, image: &PixelBuffer) -> Result<Surface, DisplayError> {
        match self.packer {
            Some(ref mut packer) => packer.upload(image),
            None => {
                let (texture, max_u, max_v) = SurfaceManager::create_texture(image)?;
                Ok(Surface::new(texture, FRect::new(0.0, 0.0, max_u, max_v), image.size().to_f32()))
            },
        }
    }

    /// Cuts the image at `path` into `cell_size` surfaces sharing one texture, row by row.
    /// Cells that would stick out of the image are left out.
    pub fn load_grid<P: AsRef<Path>>(&mut self, path: P, cell_size: ISize) -> Result<Vec<SurfacePtr>, DisplayError> {
        let image = PixelBuffer::from_file(path.as_ref())?;
        let (texture, max_u, max_v) = SurfaceManager::create_texture(&image)?;
        let cells = grid_cells(image.size(), cell_size, max_u, max_v);
        log::debug!("{} cut into {} cells", path.as_ref().display(), cells.len());
        Ok(cells
            .into_iter()
            .map(|uv| Rc::new(Surface::new(texture.clone(), uv, cell_size.to_f32())))
            .collect())
    }

    /// A texture holding `image` at its top left, and the uv extent the image covers.
    pub fn create_texture(image: &PixelBuffer) -> Result<(TexturePtr, f32, f32), DisplayError> {
        if capabilities().npot_textures {
            return Ok((Rc::new(Texture::from_pixel_buffer(image)?), 1.0, 1.0));
        }
        let (texture_size, max_u, max_v) = padded_size(image.size());
        let mut padded = PixelBuffer::new(PixelFormat::RGBA8, texture_size);
        image.blit_to(&mut padded, 0, 0);
        Ok((Rc::new(Texture::from_pixel_buffer(&padded)?), max_u, max_v))
    }

    /// Forgets every surface nobody outside the cache holds anymore.
    pub fn cleanup(&mut self) {
        let before = self.surfaces.len();
        self.surfaces.retain(|_, surface| Rc::strong_count(surface) > 1);
        log::debug!("surface cleanup released {} of {}", before - self.surfaces.len(), before);
    }

    /// Dumps the atlas pages, does nothing without a packer.
    pub fn save_all_as_png<D: AsRef<Path>>(&self, dir: D) -> Result<(), DisplayError> {
        match self.packer {
            Some(ref packer) => packer.save_all_as_png(dir),
            None => Ok(()),
        }
    }

    pub fn uses_packer(&self) -> bool {
        self.packer.is_some()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// Power of two size able to hold `size`, with the uv extent `size` covers in it.
pub fn padded_size(size: ISize) -> (ISize, f32, f32) {
    let padded = ISize::new(ceil_power_of_two(size.width), ceil_power_of_two(size.height));
    (
        padded,
        size.width as f32 / padded.width as f32,
        size.height as f32 / padded.height as f32,
    )
}

/// Row major uv rects of the full `cell` sized cells of an `image` sized picture that
/// spans (0, 0)-(max_u, max_v) of its texture.
pub fn grid_cells(image: ISize, cell: ISize, max_u: f32, max_v: f32) -> Vec<FRect> {
    if cell.is_empty() {
        return Vec::new();
    }
    let columns = image.width / cell.width;
    let rows = image.height / cell.height;
    let u = |x: i32| max_u * x as f32 / image.width as f32;
    let v = |y: i32| max_v * y as f32 / image.height as f32;
    let mut cells = Vec::with_capacity((columns.max(0) * rows.max(0)) as usize);
    for row in 0..rows {
        for column in 0..columns {
            let (x, y) = (column * cell.width, row * cell.height);
            cells.push(FRect::new(u(x), v(y), u(x + cell.width), v(y + cell.height)));
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::FSize;

    fn detached_manager() -> SurfaceManager {
        SurfaceManager { packer: None, surfaces: HashMap::new(), fallback_image: None }
    }

    #[test]
    fn grid_keeps_only_full_cells_row_by_row() {
        let cells = grid_cells(ISize::new(100, 64), ISize::new(32, 32), 1.0, 1.0);
        // 3 full columns, 2 rows; the last 4 pixels of every row are dropped
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], FRect::new(0.0, 0.0, 0.32, 0.5));
        assert_eq!(cells[1].left, 0.32);
        assert_eq!(cells[3], FRect::new(0.0, 0.5, 0.32, 1.0));
        assert!(grid_cells(ISize::new(10, 10), ISize::new(0, 4), 1.0, 1.0).is_empty());
    }

    #[test]
    fn grid_scales_with_padding() {
        let (size, max_u, max_v) = padded_size(ISize::new(96, 40));
        assert_eq!(size, ISize::new(128, 64));
        assert_eq!((max_u, max_v), (0.75, 0.625));
        let cells = grid_cells(ISize::new(96, 40), ISize::new(48, 40), max_u, max_v);
        assert_eq!(cells, vec![FRect::new(0.0, 0.0, 0.375, 0.625), FRect::new(0.375, 0.0, 0.75, 0.625)]);
    }

    #[test]
    fn cleanup_keeps_what_is_still_in_use() {
        let mut manager = detached_manager();
        let texture = Rc::new(Texture::detached(ISize::new(4, 4)));
        let surface = |t: &TexturePtr| Rc::new(Surface::new(t.clone(), FRect::new(0.0, 0.0, 1.0, 1.0), FSize::new(4.0, 4.0)));
        let held = surface(&texture);
        manager.surfaces.insert(PathBuf::from("held.png"), held.clone());
        manager.surfaces.insert(PathBuf::from("dropped.png"), surface(&texture));
        manager.cleanup();
        assert_eq!(manager.len(), 1);
        assert!(Rc::ptr_eq(&manager.get("held.png").unwrap(), &held));
    }

    #[test]
    fn decode_failure_without_fallback_is_an_error() {
        let mut manager = detached_manager();
        assert!(manager.get("does/not/exist.png").is_err());
        // a fallback that fails itself does not recurse
        manager.fallback_image = Some(PathBuf::from("does/not/exist.png"));
        assert!(manager.get("does/not/exist.png").is_err());
        assert!(manager.is_empty());
    }
}
