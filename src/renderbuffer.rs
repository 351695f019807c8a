use crate::assert_gl;
use crate::error::DisplayError;
use crate::geom::ISize;

use gl::types::*;

/// Off-screen storage for one framebuffer attachment.
#[derive(Debug)]
pub struct Renderbuffer {
    pub (crate) handle: GLuint,
    size: ISize,
}

impl Renderbuffer {
    /// `multisample` is the sample count, 0 for a plain buffer.
    pub fn create(format: GLenum, size: ISize, multisample: i32) -> Result<Renderbuffer, DisplayError> {
        if size.is_empty() {
            return Err(DisplayError::EmptyImage);
        }
        let mut handle = std::mem::MaybeUninit::uninit();
        let handle = unsafe {
            gl::GenRenderbuffers(1, handle.as_mut_ptr());
            handle.assume_init()
        };
        let renderbuffer = Renderbuffer { handle, size };
        unsafe {
            gl::BindRenderbuffer(gl::RENDERBUFFER, handle);
            if multisample > 0 {
                log::debug!("antialiased renderbuffer with {} samples", multisample);
                gl::RenderbufferStorageMultisample(gl::RENDERBUFFER, multisample, format, size.width, size.height);
            } else {
                gl::RenderbufferStorage(gl::RENDERBUFFER, format, size.width, size.height);
            }
            gl::BindRenderbuffer(gl::RENDERBUFFER, 0);
        }
        assert_gl!("creating renderbuffer")?;
        Ok(renderbuffer)
    }

    pub fn handle(&self) -> GLuint {
        self.handle
    }

    pub fn size(&self) -> ISize {
        self.size
    }
}

impl Drop for Renderbuffer {
    fn drop(&mut self) {
        unsafe { gl::DeleteRenderbuffers(1, &self.handle); }
    }
}
