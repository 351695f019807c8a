//! A small list of helper functions related to OpenGL.
//!
//! Those functions are mostly used internally, but are still publicly available for convenience.

use gl::types::{GLenum, GLint, GLuint};
use std::{
    cell::Cell,
    ffi::CStr,
    mem::MaybeUninit,
};

pub fn gl_get_int(name: GLenum) -> GLint {
    let mut result = MaybeUninit::<GLint>::uninit();
    unsafe {
        gl::GetIntegerv(name, result.as_mut_ptr());
        result.assume_init()
    }
}

pub fn gl_get_int4(name: GLenum) -> [GLint; 4] {
    let mut result = [0 as GLint; 4];
    unsafe {
        gl::GetIntegerv(name, result.as_mut_ptr());
    }
    result
}

/// Returns "(null)" when the driver has nothing to say.
pub fn gl_get_string(name: GLenum) -> String {
    unsafe {
        let ptr = gl::GetString(name);
        if ptr.is_null() {
            "(null)".to_owned()
        } else {
            CStr::from_ptr(ptr as *const _).to_string_lossy().into_owned()
        }
    }
}

pub fn gl_get_error() -> Option<GLenum> {
    let r = unsafe { gl::GetError() };
    if r == gl::NO_ERROR {
        None
    } else {
        Some(r)
    }
}

pub fn gl_error_name(code: GLenum) -> &'static str {
    match code {
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

/// The framebuffer currently bound to `GL_FRAMEBUFFER`.
pub fn gl_framebuffer_binding() -> GLuint {
    gl_get_int(gl::FRAMEBUFFER_BINDING) as GLuint
}

pub fn gl_has_extension(name: &str) -> bool {
    let count = gl_get_int(gl::NUM_EXTENSIONS);
    (0..count).any(|i| unsafe {
        let ptr = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
        !ptr.is_null() && CStr::from_ptr(ptr as *const _).to_bytes() == name.as_bytes()
    })
}

/// What the running GPU can do, as far as textures are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub max_texture_size: i32,
    pub npot_textures: bool,
}

thread_local! {
    static CAPABILITIES: Cell<Option<Capabilities>> = Cell::new(None);
}

/// Queries the capabilities of the context current on this thread, once.
pub fn capabilities() -> Capabilities {
    CAPABILITIES.with(|c| {
        if let Some(caps) = c.get() {
            return caps;
        }
        let major = gl_get_int(gl::MAJOR_VERSION);
        let caps = Capabilities {
            max_texture_size: gl_get_int(gl::MAX_TEXTURE_SIZE),
            // core since 2.0, but some 2.x hardware lies about it
            npot_textures: major >= 3 || gl_has_extension("GL_ARB_texture_non_power_of_two"),
        };
        log::debug!("GPU capabilities: {:?}", caps);
        c.set(Some(caps));
        caps
    })
}

/// Logs vendor, renderer and versions of the current context.
pub fn log_context_info() {
    log::info!("GL_VENDOR: {}", gl_get_string(gl::VENDOR));
    log::info!("GL_RENDERER: {}", gl_get_string(gl::RENDERER));
    log::info!("GL_VERSION: {}", gl_get_string(gl::VERSION));
    log::info!("GL_SHADING_LANGUAGE_VERSION: {}", gl_get_string(gl::SHADING_LANGUAGE_VERSION));
}

pub fn is_power_of_two(v: i32) -> bool {
    v > 0 && (v & (v - 1)) == 0
}

/// Smallest power of two greater or equal to `v`. 0 and 1 both give 1.
pub fn ceil_power_of_two(v: i32) -> i32 {
    if v <= 1 {
        1
    } else {
        (v as u32).next_power_of_two() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_rounding() {
        assert_eq!(ceil_power_of_two(0), 1);
        assert_eq!(ceil_power_of_two(1), 1);
        assert_eq!(ceil_power_of_two(3), 4);
        assert_eq!(ceil_power_of_two(64), 64);
        assert_eq!(ceil_power_of_two(1025), 2048);
        assert!(is_power_of_two(256));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(96));
    }
}
