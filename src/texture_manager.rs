use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::pixel_buffer::PixelBuffer;
use crate::texture::{Texture, TexturePtr};

use hashbrown::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Whole image files as textures, once per path.
#[derive(Debug, Default)]
pub struct TextureManager {
    textures: HashMap<PathBuf, TexturePtr>,
    fallback_image: Option<PathBuf>,
}

impl TextureManager {
    pub fn new(config: &DisplayConfig) -> TextureManager {
        TextureManager { textures: HashMap::new(), fallback_image: config.fallback_image.clone() }
    }

    pub fn get<P: AsRef<Path>>(&mut self, path: P) -> Result<TexturePtr, DisplayError> {
        let path = path.as_ref();
        if let Some(texture) = self.textures.get(path) {
            log::debug!("texture cache hit: {}", path.display());
            return Ok(texture.clone());
        }
        log::debug!("texture cache miss: {}", path.display());
        let image = match PixelBuffer::from_file(path) {
            Ok(image) => image,
            Err(e) => {
                return match self.fallback_image.clone() {
                    Some(ref fallback) if fallback.as_path() != path => {
                        log::warn!("couldn't load {}: {}, using {}", path.display(), e, fallback.display());
                        self.get(fallback)
                    },
                    _ => Err(e),
                };
            },
        };
        let texture = Rc::new(Texture::from_pixel_buffer(&image)?);
        self.textures.insert(path.to_owned(), texture.clone());
        Ok(texture)
    }

    /// Same as `get`, with the texture set to repeat, for `fill_pattern`.
    pub fn get_pattern<P: AsRef<Path>>(&mut self, path: P) -> Result<TexturePtr, DisplayError> {
        let texture = self.get(path)?;
        texture.set_wrap(gl::REPEAT)?;
        Ok(texture)
    }

    /// Forgets every texture nobody outside the cache holds anymore.
    pub fn cleanup(&mut self) {
        let before = self.textures.len();
        self.textures.retain(|_, texture| Rc::strong_count(texture) > 1);
        log::debug!("texture cleanup released {} of {}", before - self.textures.len(), before);
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::ISize;

    #[test]
    fn cleanup_drops_unreferenced_textures() {
        let mut manager = TextureManager::default();
        let kept = Rc::new(Texture::detached(ISize::new(2, 2)));
        manager.textures.insert(PathBuf::from("a.png"), kept.clone());
        manager.textures.insert(PathBuf::from("b.png"), Rc::new(Texture::detached(ISize::new(2, 2))));
        manager.cleanup();
        assert_eq!(manager.len(), 1);
        assert!(Rc::ptr_eq(&manager.get("a.png").unwrap(), &kept));
    }

    #[test]
    fn missing_file_is_an_error() {
        let config = DisplayConfig::default().with_fallback_image("missing/too.png");
        let mut manager = TextureManager::new(&config);
        match manager.get("missing/pattern.png") {
            Err(DisplayError::Image(_)) => {},
            other => panic!("expected an image error, got {:?}", other),
        }
    }
}
