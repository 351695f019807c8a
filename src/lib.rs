//! 2D drawing on top of OpenGL 3.3 core: immediate drawing through a `GraphicsContext`,
//! depth sorted deferred drawing through a `DrawingContext`, and images packed into
//! shared atlas textures.
//!
//! Window and context creation is left to the caller, load the GL functions with
//! `gl::load_with` before creating anything here.

pub mod error;
pub mod gl_utils;
pub mod color;
pub mod geom;
pub mod config;
pub mod pixel_buffer;
pub mod texture;
pub mod texture_packer;
pub mod surface;
pub mod shader;
pub mod vertex_arrays;
pub mod matrix_stack;
pub mod shapes;
pub mod graphics_context;
pub mod renderbuffer;
pub mod framebuffer;
pub mod scenegraph;
pub mod drawing_context;
pub mod surface_manager;
pub mod texture_manager;
pub mod font;

pub use cgmath;

pub use self::color::Color;
pub use self::config::{DisplayConfig, PackerMode};
pub use self::drawing_context::DrawingContext;
pub use self::error::DisplayError;
pub use self::font::TtfFont;
pub use self::framebuffer::{Framebuffer, FramebufferPtr};
pub use self::geom::{FRect, FSize, IRect, ISize, Line, Quad};
pub use self::graphics_context::GraphicsContext;
pub use self::pixel_buffer::{PixelBuffer, PixelFormat};
pub use self::renderbuffer::Renderbuffer;
pub use self::shader::{ShaderProgram, ShaderProgramPtr};
pub use self::surface::{DrawingParameters, Surface, SurfaceDrawingParameters, SurfacePtr};
pub use self::surface_manager::SurfaceManager;
pub use self::texture::{Texture, TexturePtr};
pub use self::texture_manager::TextureManager;
pub use self::texture_packer::TexturePacker;
