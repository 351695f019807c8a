use crate::geom::{IRect, ISize};
use crate::shader::ShaderLoadError;
use gl::types::GLenum;

/// Describes an error that might happen when creating or filling a GPU resource.
#[derive(Debug)]
pub enum DisplayError {
    /// No atlas page can hold a rectangle of this size.
    AtlasAllocation { requested: ISize, atlas: ISize },
    EmptyImage,
    UnsupportedFormat(String),
    TextureTooLarge { size: ISize, max: i32 },
    NonPowerOfTwo(ISize),
    InvalidPixelData { expected: usize, received: usize },
    /// A source region reaching outside of the image it is read from.
    RegionOutOfBounds { region: IRect, size: ISize },
    /// `glGetError` reported something after `operation`, at `location` (file:line).
    Gl { location: &'static str, operation: String, code: GLenum },
    Image(image::ImageError),
    Shader(ShaderLoadError),
    Font(String),
    Io(std::io::Error),
}

impl std::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayError::AtlasAllocation { requested, atlas } => write!(
                f,
                "texture space allocation failed: {}x{} does not fit in a {}x{} atlas",
                requested.width, requested.height, atlas.width, atlas.height
            ),
            DisplayError::EmptyImage => write!(f, "image has no pixels"),
            DisplayError::UnsupportedFormat(what) => write!(f, "unsupported format: {}", what),
            DisplayError::TextureTooLarge { size, max } => write!(
                f,
                "texture size {}x{} not supported (GL_MAX_TEXTURE_SIZE is {})",
                size.width, size.height, max
            ),
            DisplayError::NonPowerOfTwo(size) => write!(
                f,
                "image dimensions have non power of two size: {}x{}",
                size.width, size.height
            ),
            DisplayError::InvalidPixelData { expected, received } => write!(
                f,
                "pixel data too short: expected at least {} bytes, received {}",
                expected, received
            ),
            DisplayError::RegionOutOfBounds { region, size } => write!(
                f,
                "region ({}, {})-({}, {}) is outside of a {}x{} image",
                region.left, region.top, region.right, region.bottom, size.width, size.height
            ),
            DisplayError::Gl { location, operation, code } => write!(
                f,
                "{}: OpenGL error while '{}': {} (0x{:04x})",
                location,
                operation,
                crate::gl_utils::gl_error_name(*code),
                code
            ),
            DisplayError::Image(e) => write!(f, "image error: {}", e),
            DisplayError::Shader(e) => write!(f, "{}", e),
            DisplayError::Font(what) => write!(f, "font error: {}", what),
            DisplayError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for DisplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DisplayError::Image(e) => Some(e),
            DisplayError::Shader(e) => Some(e),
            DisplayError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for DisplayError {
    fn from(e: image::ImageError) -> DisplayError {
        DisplayError::Image(e)
    }
}

impl From<ShaderLoadError> for DisplayError {
    fn from(e: ShaderLoadError) -> DisplayError {
        DisplayError::Shader(e)
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(e: std::io::Error) -> DisplayError {
        DisplayError::Io(e)
    }
}

/// Checks `glGetError` and turns a pending error into a `DisplayError::Gl`.
///
/// Only queries the driver when debug assertions are enabled.
pub fn check_gl(location: &'static str, operation: &str) -> Result<(), DisplayError> {
    if !cfg!(debug_assertions) {
        return Ok(());
    }
    match crate::gl_utils::gl_get_error() {
        None => Ok(()),
        Some(code) => Err(DisplayError::Gl { location, operation: operation.to_owned(), code }),
    }
}

/// Evaluates to `Result<(), DisplayError>`, tagged with the call site.
#[macro_export]
macro_rules! assert_gl {
    ($operation:expr) => {
        $crate::error::check_gl(concat!(file!(), ":", line!()), $operation)
    };
}

/// Same as `assert_gl!`, but panics. Used on render paths, where a GL error is a bug.
#[macro_export]
macro_rules! debug_assert_gl {
    ($operation:expr) => {
        if let Err(e) = $crate::error::check_gl(concat!(file!(), ":", line!()), $operation) {
            panic!("{}", e);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gl_error_message_carries_location_and_operation() {
        let e = DisplayError::Gl { location: "src/texture.rs:42", operation: "uploading".into(), code: gl::INVALID_VALUE };
        let msg = e.to_string();
        assert!(msg.starts_with("src/texture.rs:42"));
        assert!(msg.contains("uploading"));
        assert!(msg.contains("GL_INVALID_VALUE"));
    }

    #[test]
    fn atlas_allocation_message() {
        let e = DisplayError::AtlasAllocation { requested: ISize::new(4000, 2), atlas: ISize::new(2048, 2048) };
        assert_eq!(e.to_string(), "texture space allocation failed: 4000x2 does not fit in a 2048x2048 atlas");
    }
}
