use crate::assert_gl;
use crate::error::DisplayError;
use crate::geom::{IRect, ISize};
use crate::gl_utils::gl_get_int;
use crate::graphics_context::RenderTarget;
use crate::renderbuffer::Renderbuffer;
use crate::texture::{Texture, TexturePtr};

use gl::types::*;
use std::rc::Rc;

pub type FramebufferPtr = Rc<Framebuffer>;

/// An off-screen render target: a color attachment (renderbuffer or texture) plus a
/// depth/stencil renderbuffer.
#[derive(Debug)]
pub struct Framebuffer {
    pub (crate) handle: GLuint,
    size: ISize,
    texture: Option<TexturePtr>,
    color_buffer: Option<Renderbuffer>,
    depth_stencil_buffer: Renderbuffer,
}

impl Framebuffer {
    /// RGB8 color renderbuffer.
    pub fn create(size: ISize, multisample: i32) -> Result<Framebuffer, DisplayError> {
        Framebuffer::with_color_buffer(gl::RGB8, size, multisample)
    }

    /// RGBA16F color renderbuffer.
    pub fn create_hdr(size: ISize, multisample: i32) -> Result<Framebuffer, DisplayError> {
        Framebuffer::with_color_buffer(gl::RGBA16F, size, multisample)
    }

    /// Renders into a texture, available through `color_texture` afterwards.
    pub fn create_with_texture(target: GLenum, size: ISize, multisample: i32) -> Result<Framebuffer, DisplayError> {
        let texture = Rc::new(Texture::create(target, size)?);
        let depth_stencil_buffer = Renderbuffer::create(gl::DEPTH24_STENCIL8, size, multisample)?;
        let framebuffer = Framebuffer {
            handle: Self::gen_framebuffer(),
            size,
            texture: Some(texture),
            color_buffer: None,
            depth_stencil_buffer,
        };
        framebuffer.attach()?;
        Ok(framebuffer)
    }

    fn with_color_buffer(format: GLenum, size: ISize, multisample: i32) -> Result<Framebuffer, DisplayError> {
        let color_buffer = Renderbuffer::create(format, size, multisample)?;
        let depth_stencil_buffer = Renderbuffer::create(gl::DEPTH24_STENCIL8, size, multisample)?;
        let framebuffer = Framebuffer {
            handle: Self::gen_framebuffer(),
            size,
            texture: None,
            color_buffer: Some(color_buffer),
            depth_stencil_buffer,
        };
        framebuffer.attach()?;
        Ok(framebuffer)
    }

    fn gen_framebuffer() -> GLuint {
        let mut id = std::mem::MaybeUninit::uninit();
        unsafe {
            gl::GenFramebuffers(1, id.as_mut_ptr());
            id.assume_init()
        }
    }

    /// Wires the attachments up, leaving whatever framebuffer was bound before bound.
    fn attach(&self) -> Result<(), DisplayError> {
        let previous = gl_get_int(gl::FRAMEBUFFER_BINDING) as GLuint;
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, self.handle);
            match (&self.texture, &self.color_buffer) {
                (Some(texture), _) => {
                    gl::FramebufferTexture2D(gl::FRAMEBUFFER, gl::COLOR_ATTACHMENT0, texture.target, texture.handle, 0);
                },
                (None, Some(color)) => {
                    gl::FramebufferRenderbuffer(gl::FRAMEBUFFER, gl::COLOR_ATTACHMENT0, gl::RENDERBUFFER, color.handle);
                },
                (None, None) => {},
            }
            let depth_stencil = self.depth_stencil_buffer.handle;
            gl::FramebufferRenderbuffer(gl::FRAMEBUFFER, gl::DEPTH_ATTACHMENT, gl::RENDERBUFFER, depth_stencil);
            gl::FramebufferRenderbuffer(gl::FRAMEBUFFER, gl::STENCIL_ATTACHMENT, gl::RENDERBUFFER, depth_stencil);
        }
        let attached = assert_gl!("attaching framebuffer buffers");
        log_completeness(unsafe { gl::CheckFramebufferStatus(gl::FRAMEBUFFER) });
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, previous); }
        attached
    }

    /// Copies `src` of this framebuffer to `dst` of the bound draw framebuffer.
    pub fn blit(&self, src: &IRect, dst: &IRect, mask: GLbitfield, filter: GLenum) -> Result<(), DisplayError> {
        let previous = gl_get_int(gl::READ_FRAMEBUFFER_BINDING) as GLuint;
        unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, self.handle);
            gl::BlitFramebuffer(
                src.left, src.top, src.right, src.bottom,
                dst.left, dst.top, dst.right, dst.bottom,
                mask, filter,
            );
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, previous);
        }
        assert_gl!("blitting framebuffer")
    }

    pub fn handle(&self) -> GLuint {
        self.handle
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

    /// Only framebuffers made with `create_with_texture` have one.
    pub fn color_texture(&self) -> Option<&TexturePtr> {
        self.texture.as_ref()
    }
}

fn log_completeness(status: GLenum) {
    let problem = match status {
        gl::FRAMEBUFFER_COMPLETE => {
            log::info!("framebuffer ok");
            return;
        },
        gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT",
        gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT",
        gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => "GL_FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER",
        gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => "GL_FRAMEBUFFER_INCOMPLETE_READ_BUFFER",
        gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "GL_FRAMEBUFFER_INCOMPLETE_MULTISAMPLE",
        gl::FRAMEBUFFER_UNSUPPORTED => "GL_FRAMEBUFFER_UNSUPPORTED",
        _ => {
            log::error!("framebuffer status failure: 0x{:04x}", status);
            return;
        },
    };
    log::error!("framebuffer incomplete: {}", problem);
}

impl RenderTarget for FramebufferPtr {
    fn handle(&self) -> GLuint {
        self.handle
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe { gl::DeleteFramebuffers(1, &self.handle); }
    }
}
