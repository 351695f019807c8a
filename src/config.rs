use crate::geom::ISize;
use crate::gl_utils::Capabilities;
use std::path::PathBuf;

/// When should images be routed through the texture packer instead of getting their own texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackerMode {
    /// Only when the GPU can't do non power of two textures.
    Auto,
    Always,
    Never,
}

impl PackerMode {
    pub fn use_packer(self, caps: &Capabilities) -> bool {
        match self {
            PackerMode::Auto => !caps.npot_textures,
            PackerMode::Always => true,
            PackerMode::Never => false,
        }
    }
}

/// Knobs shared by the graphics context and the resource managers.
///
/// ```
/// # use glaze::{DisplayConfig, PackerMode};
/// let config = DisplayConfig::default()
///     .with_atlas_size(1024, 1024)
///     .with_packer_mode(PackerMode::Always)
///     .with_circle_segments(32);
/// assert_eq!(config.circle_segments, 32);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub atlas_size: ISize,
    pub packer_mode: PackerMode,
    /// Loaded by the managers in place of an image that fails to decode.
    pub fallback_image: Option<PathBuf>,
    pub circle_segments: u32,
    pub rounded_rect_fill_steps: u32,
    pub rounded_rect_outline_steps: u32,
    pub initial_size: ISize,
}

impl Default for DisplayConfig {
    fn default() -> DisplayConfig {
        DisplayConfig {
            atlas_size: ISize::new(2048, 2048),
            packer_mode: PackerMode::Auto,
            fallback_image: None,
            circle_segments: 16,
            rounded_rect_fill_steps: 8,
            rounded_rect_outline_steps: 4,
            initial_size: ISize::new(640, 480),
        }
    }
}

impl DisplayConfig {
    pub fn with_atlas_size(mut self, width: i32, height: i32) -> Self {
        self.atlas_size = ISize::new(width, height);
        self
    }

    pub fn with_packer_mode(mut self, mode: PackerMode) -> Self {
        self.packer_mode = mode;
        self
    }

    pub fn with_fallback_image<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.fallback_image = Some(path.into());
        self
    }

    /// Rounded up to a multiple of 4, circles are built out of quarter arcs.
    pub fn with_circle_segments(mut self, segments: u32) -> Self {
        self.circle_segments = ((segments.max(4) + 3) / 4) * 4;
        self
    }

    pub fn with_rounded_rect_steps(mut self, fill_steps: u32, outline_steps: u32) -> Self {
        self.rounded_rect_fill_steps = fill_steps.max(1);
        self.rounded_rect_outline_steps = outline_steps.max(1);
        self
    }

    pub fn with_initial_size(mut self, width: i32, height: i32) -> Self {
        self.initial_size = ISize::new(width, height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packer_mode_follows_capabilities() {
        let npot = Capabilities { max_texture_size: 4096, npot_textures: true };
        let pot_only = Capabilities { max_texture_size: 4096, npot_textures: false };
        assert!(!PackerMode::Auto.use_packer(&npot));
        assert!(PackerMode::Auto.use_packer(&pot_only));
        assert!(PackerMode::Always.use_packer(&npot));
        assert!(!PackerMode::Never.use_packer(&pot_only));
    }

    #[test]
    fn circle_segments_are_quartered() {
        assert_eq!(DisplayConfig::default().with_circle_segments(10).circle_segments, 12);
        assert_eq!(DisplayConfig::default().with_circle_segments(0).circle_segments, 4);
    }
}
