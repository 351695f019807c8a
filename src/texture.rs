use crate::assert_gl;
use crate::error::DisplayError;
use crate::geom::{IRect, ISize};
use crate::gl_utils::{capabilities, ceil_power_of_two, is_power_of_two};
use crate::pixel_buffer::{PixelBuffer, PixelFormat};

use gl::types::*;
use std::os::raw::c_void;
use std::rc::Rc;

pub type TexturePtr = Rc<Texture>;

/// Represents an OpenGL texture.
///
/// Its dimensions never change after creation, its content can be updated with `put`.
/// Usually shared behind a `TexturePtr`, since many surfaces may point to the same texture.
#[derive(Debug)]
pub struct Texture {
    pub (crate) handle: GLuint,
    pub (crate) target: GLenum,
    size: ISize,
}

impl Texture {
    fn gen_texture() -> GLuint {
        let mut id = std::mem::MaybeUninit::uninit();
        unsafe {
            gl::GenTextures(1, id.as_mut_ptr());
            id.assume_init()
        }
    }

    /// Creates an empty texture. The size is rounded up to the next power of two when
    /// the GPU can't handle anything else.
    pub fn create(target: GLenum, size: ISize) -> Result<Texture, DisplayError> {
        if size.is_empty() {
            return Err(DisplayError::EmptyImage);
        }
        let caps = capabilities();
        let mut size = size;
        if !caps.npot_textures && !(is_power_of_two(size.width) && is_power_of_two(size.height)) {
            log::warn!("texture dimensions have non power of two size: {}x{}, rounding up", size.width, size.height);
            size = ISize::new(ceil_power_of_two(size.width), ceil_power_of_two(size.height));
        }
        if size.width > caps.max_texture_size || size.height > caps.max_texture_size {
            return Err(DisplayError::TextureTooLarge { size, max: caps.max_texture_size });
        }

        let handle = Self::gen_texture();
        unsafe {
            gl::BindTexture(target, handle);
            gl::TexImage2D(
                target,
                0,
                gl::RGBA8 as GLint,
                size.width,
                size.height,
                // border must always be 0
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                // fill with void
                std::ptr::null()
            );
            gl::TexParameteri(target, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(target, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(target, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(target, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
        }
        let texture = Texture { handle, target, size };
        assert_gl!("creating empty texture")?;
        Ok(texture)
    }

    /// Uploads a whole pixel buffer into a new mipmapped 2D texture.
    pub fn from_pixel_buffer(image: &PixelBuffer) -> Result<Texture, DisplayError> {
        let size = image.size();
        if size.is_empty() {
            return Err(DisplayError::EmptyImage);
        }
        let caps = capabilities();
        if !caps.npot_textures && !(is_power_of_two(size.width) && is_power_of_two(size.height)) {
            return Err(DisplayError::NonPowerOfTwo(size));
        }
        if size.width > caps.max_texture_size || size.height > caps.max_texture_size {
            return Err(DisplayError::TextureTooLarge { size, max: caps.max_texture_size });
        }

        let format = image.format();
        let internal_format = match format {
            PixelFormat::RGB8 => gl::RGB8,
            PixelFormat::RGBA8 => gl::RGBA8,
        };
        let handle = Self::gen_texture();
        // from here on, dropping `texture` releases the handle on error
        let texture = Texture { handle, target: gl::TEXTURE_2D, size };
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, handle);
            set_unpack_layout(image);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                internal_format as GLint,
                size.width,
                size.height,
                0,
                format.to_gl_format(),
                gl::UNSIGNED_BYTE,
                image.data().as_ptr() as *const c_void
            );
            reset_unpack_layout();
            gl::GenerateMipmap(gl::TEXTURE_2D);

            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR_MIPMAP_LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
        }
        assert_gl!("uploading texture")?;
        Ok(texture)
    }

    /// A texture that owns no GL object, for tests that never touch the GPU.
    #[cfg(test)]
    pub (crate) fn detached(size: ISize) -> Texture {
        Texture { handle: 0, target: gl::TEXTURE_2D, size }
    }

    /// Copies the `src` area of `image` to (x, y) in the texture.
    pub fn put(&self, image: &PixelBuffer, src: &IRect, x: i32, y: i32) -> Result<(), DisplayError> {
        let offset = region_offset(image, src)?;
        if src.is_empty() {
            return Ok(());
        }
        unsafe {
            gl::BindTexture(self.target, self.handle);
            set_unpack_layout(image);
            gl::TexSubImage2D(
                self.target,
                0, // mipmap 0
                x,
                y,
                src.width(),
                src.height(),
                image.format().to_gl_format(),
                gl::UNSIGNED_BYTE,
                image.data()[offset..].as_ptr() as *const c_void
            );
            reset_unpack_layout();
        }
        assert_gl!("updating texture region")
    }

    pub fn set_wrap(&self, mode: GLenum) -> Result<(), DisplayError> {
        unsafe {
            gl::BindTexture(self.target, self.handle);
            gl::TexParameteri(self.target, gl::TEXTURE_WRAP_S, mode as GLint);
            gl::TexParameteri(self.target, gl::TEXTURE_WRAP_T, mode as GLint);
        }
        assert_gl!("setting texture wrap mode")
    }

    pub fn set_filter(&self, mode: GLenum) -> Result<(), DisplayError> {
        unsafe {
            gl::BindTexture(self.target, self.handle);
            gl::TexParameteri(self.target, gl::TEXTURE_MIN_FILTER, mode as GLint);
            gl::TexParameteri(self.target, gl::TEXTURE_MAG_FILTER, mode as GLint);
        }
        assert_gl!("setting texture filter")
    }

    /// Reads the texture back from the GPU, as RGBA8.
    pub fn to_pixel_buffer(&self) -> Result<PixelBuffer, DisplayError> {
        let mut buffer = PixelBuffer::new(PixelFormat::RGBA8, self.size);
        unsafe {
            gl::BindTexture(self.target, self.handle);
            gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
            gl::GetTexImage(self.target, 0, gl::RGBA, gl::UNSIGNED_BYTE, buffer.data_mut().as_mut_ptr() as *mut c_void);
            gl::PixelStorei(gl::PACK_ALIGNMENT, 4);
        }
        assert_gl!("reading texture back")?;
        Ok(buffer)
    }

    pub fn size(&self) -> ISize {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.size.width
    }

    pub fn height(&self) -> i32 {
        self.size.height
    }

    pub fn handle(&self) -> GLuint {
        self.handle
    }

    pub fn target(&self) -> GLenum {
        self.target
    }

    pub fn bind(&self, unit: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(self.target, self.handle);
        }
    }
}

unsafe fn set_unpack_layout(image: &PixelBuffer) {
    gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
    gl::PixelStorei(gl::UNPACK_ROW_LENGTH, (image.pitch() / image.format().bytes_per_pixel()) as GLint);
}

unsafe fn reset_unpack_layout() {
    gl::PixelStorei(gl::UNPACK_ROW_LENGTH, 0);
    gl::PixelStorei(gl::UNPACK_ALIGNMENT, 4);
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.handle != 0 {
            unsafe {
                gl::DeleteTextures(1, &self.handle)
            }
        }
    }
}

/// Byte offset of the top left pixel of `src` in `image`. Fails unless `src` lies
/// entirely inside the image.
fn region_offset(image: &PixelBuffer, src: &IRect) -> Result<usize, DisplayError> {
    if src.width() < 0 || src.height() < 0 || !IRect::from_pos_size(0, 0, image.size()).contains_rect(src) {
        return Err(DisplayError::RegionOutOfBounds { region: *src, size: image.size() });
    }
    Ok(src.top as usize * image.pitch() + src.left as usize * image.format().bytes_per_pixel())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_offset_follows_pitch() {
        let image = PixelBuffer::new(PixelFormat::RGBA8, ISize::new(10, 4));
        let offset = region_offset(&image, &IRect::new(2, 3, 5, 4)).unwrap();
        assert_eq!(offset, 3 * image.pitch() + 2 * 4);
    }

    #[test]
    fn region_outside_of_the_image_is_rejected() {
        let image = PixelBuffer::new(PixelFormat::RGBA8, ISize::new(1, 1));
        match region_offset(&image, &IRect::new(0, 0, 1000, 1000)) {
            Err(DisplayError::RegionOutOfBounds { size, .. }) => assert_eq!(size, ISize::new(1, 1)),
            other => panic!("expected an out of bounds error, got {:?}", other),
        }
        assert!(region_offset(&image, &IRect::new(-1, 0, 1, 1)).is_err());
        assert!(region_offset(&image, &IRect::new(0, 0, 1, 1)).is_ok());
    }
}
